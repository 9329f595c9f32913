//! Graphics device seam.
//!
//! Every piece of rendering state the core touches (the active render
//! destination, stencil/depth configuration, resource identities) lives
//! behind [`GraphicsDevice`] instead of ambient context state. Two backends
//! implement it: [`WgpuDevice`] for the window and [`HeadlessDevice`] which
//! records commands in memory.

mod headless;
mod wgpu_device;

pub use headless::{DeviceCommand, HeadlessDevice, RecordedDraw};
pub use wgpu_device::WgpuDevice;

use glam::Mat4;
use slotmap::new_key_type;

use crate::error::DeviceError;
use crate::mesh::Mesh;

new_key_type! {
    /// Container that binds a color image and a depth/stencil buffer
    pub struct FramebufferHandle;
    /// Sampleable color image
    pub struct TextureHandle;
    /// Combined depth + stencil buffer
    pub struct RenderbufferHandle;
    /// Uploaded vertex + index buffers
    pub struct MeshHandle;
}

/// Where draw and clear commands currently land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActiveTarget {
    /// The window surface
    #[default]
    Default,
    Offscreen(FramebufferHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// 8 bits per channel RGBA
    Rgba8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthStencilFormat {
    /// 24-bit depth + 8-bit stencil
    Depth24Stencil8,
}

/// Row order a backend stores images in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOrigin {
    TopLeft,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    /// Color image or depth/stencil buffer not attached
    MissingAttachment,
    /// An attachment has no backing storage
    IncompleteAttachment,
    /// Attachments disagree on dimensions
    SizeMismatch,
    /// The container handle is not known to the device
    Unknown,
}

impl FramebufferStatus {
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

/// Storage description of one attachment as seen by the status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentInfo {
    /// `None` when the attachment exists but has no storage yet
    pub size: Option<(u32, u32)>,
}

/// Completeness rule shared by every backend
pub fn attachment_status(
    color: Option<AttachmentInfo>,
    depth_stencil: Option<AttachmentInfo>,
) -> FramebufferStatus {
    let (Some(color), Some(depth_stencil)) = (color, depth_stencil) else {
        return FramebufferStatus::MissingAttachment;
    };

    match (color.size, depth_stencil.size) {
        (Some(c), Some(d)) if c == d => FramebufferStatus::Complete,
        (Some(_), Some(_)) => FramebufferStatus::SizeMismatch,
        _ => FramebufferStatus::IncompleteAttachment,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilConfig {
    pub enabled: bool,
    pub compare: CompareFunc,
    pub reference: u32,
    pub read_mask: u32,
    pub write_mask: u32,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            compare: CompareFunc::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

/// Fixed-function state applied to subsequent draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawState {
    pub depth_test: bool,
    pub stencil: StencilConfig,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            depth_test: true,
            stencil: StencilConfig::default(),
        }
    }
}

impl DrawState {
    /// Same state with the dynamic stencil reference cleared.
    ///
    /// Backends that bake state into pipelines key them on this.
    pub fn without_reference(mut self) -> Self {
        self.stencil.reference = 0;
        self
    }
}

/// Per-draw shader inputs: `modelViewProj` and `isOutline`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    pub model_view_proj: Mat4,
    pub is_outline: f32,
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            model_view_proj: Mat4::IDENTITY,
            is_outline: 0.0,
        }
    }
}

/// GPU layout of [`DrawUniforms`]
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBlock {
    pub model_view_proj: [[f32; 4]; 4],
    pub is_outline: f32,
    pub _pad: [f32; 3],
}

impl From<&DrawUniforms> for UniformBlock {
    fn from(uniforms: &DrawUniforms) -> Self {
        Self {
            model_view_proj: uniforms.model_view_proj.to_cols_array_2d(),
            is_outline: uniforms.is_outline,
            _pad: [0.0; 3],
        }
    }
}

/// Explicit-state graphics context.
///
/// Methods mirror the small set of operations the render target and outline
/// pass need. Implementations are single-threaded and owned by the frame loop.
pub trait GraphicsDevice {
    fn create_framebuffer(&mut self) -> FramebufferHandle;
    fn create_texture(&mut self) -> TextureHandle;
    fn create_renderbuffer(&mut self) -> RenderbufferHandle;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);
    fn delete_texture(&mut self, texture: TextureHandle);
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    /// (Re)allocates the backing storage of `texture`; the handle is unchanged
    fn allocate_texture_storage(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Result<(), DeviceError>;

    /// (Re)allocates the backing storage of `renderbuffer`; the handle is unchanged
    fn allocate_renderbuffer_storage(
        &mut self,
        renderbuffer: RenderbufferHandle,
        width: u32,
        height: u32,
        format: DepthStencilFormat,
    ) -> Result<(), DeviceError>;

    fn attach_color(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<(), DeviceError>;

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferHandle,
        renderbuffer: RenderbufferHandle,
    ) -> Result<(), DeviceError>;

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    fn bind_target(&mut self, target: ActiveTarget);
    fn active_target(&self) -> ActiveTarget;

    /// Largest width or height accepted for storage allocation
    fn max_texture_dimension(&self) -> u32;
    fn texture_origin(&self) -> TextureOrigin;

    fn upload_mesh(&mut self, mesh: &Mesh) -> MeshHandle;
    fn delete_mesh(&mut self, mesh: MeshHandle);

    /// Clears color, depth (to 1.0) and stencil (to 0) of the active target
    fn clear(&mut self, color: [f32; 4]);

    fn draw_state(&self) -> DrawState;
    fn set_draw_state(&mut self, state: DrawState);

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32, uniforms: &DrawUniforms);
}
