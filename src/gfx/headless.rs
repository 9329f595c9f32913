use slotmap::SlotMap;

use super::{
    attachment_status, ActiveTarget, AttachmentInfo, ColorFormat, DepthStencilFormat, DrawState,
    DrawUniforms, FramebufferHandle, FramebufferStatus, GraphicsDevice, MeshHandle,
    RenderbufferHandle, TextureHandle, TextureOrigin,
};
use crate::error::DeviceError;
use crate::mesh::Mesh;

const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Every state-changing call a [`HeadlessDevice`] has seen, in order
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateFramebuffer(FramebufferHandle),
    CreateTexture(TextureHandle),
    CreateRenderbuffer(RenderbufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    DeleteTexture(TextureHandle),
    DeleteRenderbuffer(RenderbufferHandle),
    TextureStorage { texture: TextureHandle, width: u32, height: u32 },
    RenderbufferStorage { renderbuffer: RenderbufferHandle, width: u32, height: u32 },
    AttachColor { framebuffer: FramebufferHandle, texture: TextureHandle },
    AttachDepthStencil { framebuffer: FramebufferHandle, renderbuffer: RenderbufferHandle },
    BindTarget(ActiveTarget),
    SetDrawState(DrawState),
    Clear { target: ActiveTarget, color: [f32; 4] },
    Draw(RecordedDraw),
    UploadMesh { mesh: MeshHandle, index_count: u32 },
    DeleteMesh(MeshHandle),
}

/// Snapshot of one draw call and the state it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub target: ActiveTarget,
    pub mesh: MeshHandle,
    pub index_count: u32,
    pub uniforms: DrawUniforms,
    pub state: DrawState,
}

#[derive(Debug, Default)]
struct Framebuffer {
    color: Option<TextureHandle>,
    depth_stencil: Option<RenderbufferHandle>,
}

/// In-memory device that tracks state and records commands.
///
/// Used for running the frame orchestration without a window and for
/// asserting ordering and active-target invariants in tests.
#[derive(Debug)]
pub struct HeadlessDevice {
    framebuffers: SlotMap<FramebufferHandle, Framebuffer>,
    textures: SlotMap<TextureHandle, Option<(u32, u32)>>,
    renderbuffers: SlotMap<RenderbufferHandle, Option<(u32, u32)>>,
    meshes: SlotMap<MeshHandle, u32>,
    active: ActiveTarget,
    state: DrawState,
    commands: Vec<DeviceCommand>,
    max_dimension: u32,
    reject_attachments: bool,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            framebuffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            active: ActiveTarget::Default,
            state: DrawState::default(),
            commands: Vec::new(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            reject_attachments: false,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Makes every subsequent attach call fail
    pub fn rejecting_attachments(mut self) -> Self {
        self.reject_attachments = true;
        self
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            DeviceCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).copied().flatten()
    }

    pub fn renderbuffer_size(&self, renderbuffer: RenderbufferHandle) -> Option<(u32, u32)> {
        self.renderbuffers.get(renderbuffer).copied().flatten()
    }

    pub fn contains_framebuffer(&self, framebuffer: FramebufferHandle) -> bool {
        self.framebuffers.contains_key(framebuffer)
    }

    pub fn contains_texture(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(texture)
    }

    pub fn contains_renderbuffer(&self, renderbuffer: RenderbufferHandle) -> bool {
        self.renderbuffers.contains_key(renderbuffer)
    }

    /// Number of live framebuffers, textures and renderbuffers
    pub fn live_resources(&self) -> usize {
        self.framebuffers.len() + self.textures.len() + self.renderbuffers.len()
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DeviceError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(DeviceError::StorageTooLarge {
                width,
                height,
                limit: self.max_dimension,
            });
        }
        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_framebuffer(&mut self) -> FramebufferHandle {
        let handle = self.framebuffers.insert(Framebuffer::default());
        self.commands.push(DeviceCommand::CreateFramebuffer(handle));
        handle
    }

    fn create_texture(&mut self) -> TextureHandle {
        let handle = self.textures.insert(None);
        self.commands.push(DeviceCommand::CreateTexture(handle));
        handle
    }

    fn create_renderbuffer(&mut self) -> RenderbufferHandle {
        let handle = self.renderbuffers.insert(None);
        self.commands.push(DeviceCommand::CreateRenderbuffer(handle));
        handle
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.framebuffers.remove(framebuffer).is_some() {
            if self.active == ActiveTarget::Offscreen(framebuffer) {
                self.active = ActiveTarget::Default;
            }
            self.commands.push(DeviceCommand::DeleteFramebuffer(framebuffer));
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(texture).is_some() {
            self.commands.push(DeviceCommand::DeleteTexture(texture));
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if self.renderbuffers.remove(renderbuffer).is_some() {
            self.commands.push(DeviceCommand::DeleteRenderbuffer(renderbuffer));
        }
    }

    fn allocate_texture_storage(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
        _format: ColorFormat,
    ) -> Result<(), DeviceError> {
        self.check_dimensions(width, height)?;
        let slot = self
            .textures
            .get_mut(texture)
            .ok_or(DeviceError::UnknownHandle("texture"))?;
        *slot = Some((width, height));
        self.commands.push(DeviceCommand::TextureStorage { texture, width, height });
        Ok(())
    }

    fn allocate_renderbuffer_storage(
        &mut self,
        renderbuffer: RenderbufferHandle,
        width: u32,
        height: u32,
        _format: DepthStencilFormat,
    ) -> Result<(), DeviceError> {
        self.check_dimensions(width, height)?;
        let slot = self
            .renderbuffers
            .get_mut(renderbuffer)
            .ok_or(DeviceError::UnknownHandle("renderbuffer"))?;
        *slot = Some((width, height));
        self.commands.push(DeviceCommand::RenderbufferStorage { renderbuffer, width, height });
        Ok(())
    }

    fn attach_color(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<(), DeviceError> {
        if self.reject_attachments {
            return Err(DeviceError::AttachmentRejected("color"));
        }
        if !self.textures.contains_key(texture) {
            return Err(DeviceError::UnknownHandle("texture"));
        }
        let fb = self
            .framebuffers
            .get_mut(framebuffer)
            .ok_or(DeviceError::UnknownHandle("framebuffer"))?;
        fb.color = Some(texture);
        self.commands.push(DeviceCommand::AttachColor { framebuffer, texture });
        Ok(())
    }

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferHandle,
        renderbuffer: RenderbufferHandle,
    ) -> Result<(), DeviceError> {
        if self.reject_attachments {
            return Err(DeviceError::AttachmentRejected("depth/stencil"));
        }
        if !self.renderbuffers.contains_key(renderbuffer) {
            return Err(DeviceError::UnknownHandle("renderbuffer"));
        }
        let fb = self
            .framebuffers
            .get_mut(framebuffer)
            .ok_or(DeviceError::UnknownHandle("framebuffer"))?;
        fb.depth_stencil = Some(renderbuffer);
        self.commands.push(DeviceCommand::AttachDepthStencil { framebuffer, renderbuffer });
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(framebuffer) else {
            return FramebufferStatus::Unknown;
        };
        // An attachment whose handle was deleted behind the container's back counts as missing
        let color = fb
            .color
            .and_then(|t| self.textures.get(t))
            .map(|size| AttachmentInfo { size: *size });
        let depth_stencil = fb
            .depth_stencil
            .and_then(|r| self.renderbuffers.get(r))
            .map(|size| AttachmentInfo { size: *size });
        attachment_status(color, depth_stencil)
    }

    fn bind_target(&mut self, target: ActiveTarget) {
        self.active = target;
        self.commands.push(DeviceCommand::BindTarget(target));
    }

    fn active_target(&self) -> ActiveTarget {
        self.active
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn texture_origin(&self) -> TextureOrigin {
        TextureOrigin::BottomLeft
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> MeshHandle {
        let index_count = mesh.index_count();
        let handle = self.meshes.insert(index_count);
        self.commands.push(DeviceCommand::UploadMesh { mesh: handle, index_count });
        handle
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) {
        if self.meshes.remove(mesh).is_some() {
            self.commands.push(DeviceCommand::DeleteMesh(mesh));
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(DeviceCommand::Clear {
            target: self.active,
            color,
        });
    }

    fn draw_state(&self) -> DrawState {
        self.state
    }

    fn set_draw_state(&mut self, state: DrawState) {
        self.state = state;
        self.commands.push(DeviceCommand::SetDrawState(state));
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32, uniforms: &DrawUniforms) {
        if !self.meshes.contains_key(mesh) {
            log::warn!("draw with unknown mesh handle {mesh:?} ignored");
            return;
        }
        self.commands.push(DeviceCommand::Draw(RecordedDraw {
            target: self.active,
            mesh,
            index_count,
            uniforms: *uniforms,
            state: self.state,
        }));
    }
}
