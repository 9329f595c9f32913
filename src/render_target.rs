//! Offscreen color + depth/stencil render target.
//!
//! The container, color image and depth/stencil buffer handles are created
//! once and kept for the lifetime of the target; resizing only reallocates
//! their backing storage, so attachment bindings declared at creation stay
//! valid.

use crate::error::{DeviceError, RenderTargetError};
use crate::gfx::{
    ActiveTarget, ColorFormat, DepthStencilFormat, FramebufferHandle, FramebufferStatus,
    GraphicsDevice, RenderbufferHandle, TextureHandle,
};

pub const COLOR_FORMAT: ColorFormat = ColorFormat::Rgba8;
pub const DEPTH_STENCIL_FORMAT: DepthStencilFormat = DepthStencilFormat::Depth24Stencil8;

/// The three device identities owned by a created target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHandles {
    pub framebuffer: FramebufferHandle,
    pub color: TextureHandle,
    pub depth_stencil: RenderbufferHandle,
}

/// What [`RenderTarget::ensure_sized`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeChange {
    /// Handles were allocated and storage created
    Created,
    /// Existing handles received new storage
    Resized,
    /// Requested size already allocated
    Unchanged,
}

#[derive(Debug, Default)]
pub struct RenderTarget {
    handles: Option<TargetHandles>,
    width: u32,
    height: u32,
    status: Option<FramebufferStatus>,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the target exists and its storage is exactly `width`x`height`.
    ///
    /// The caller's active target is restored before returning. An incomplete
    /// container is reported as [`RenderTargetError::Incomplete`]; the target
    /// keeps its handles and the new size in that case. A device error during
    /// a resize keeps the previous size and refreshes the status from the
    /// device, so a half-resized target never reads as complete.
    pub fn ensure_sized<D>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<SizeChange, RenderTargetError>
    where
        D: GraphicsDevice + ?Sized,
    {
        if width == 0 || height == 0 {
            return Err(RenderTargetError::InvalidSize { width, height });
        }
        let limit = device.max_texture_dimension();
        if width > limit || height > limit {
            return Err(RenderTargetError::TooLarge { width, height, limit });
        }

        if let Some(handles) = self.handles {
            if (width, height) == (self.width, self.height) {
                let status = device.framebuffer_status(handles.framebuffer);
                self.status = Some(status);
                if !status.is_complete() {
                    return Err(RenderTargetError::Incomplete(status));
                }
                return Ok(SizeChange::Unchanged);
            }
        }

        let previous = device.active_target();
        let result = self.allocate(device, width, height);
        device.bind_target(previous);
        result
    }

    fn allocate<D>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<SizeChange, RenderTargetError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let (handles, change) = match self.handles {
            Some(handles) => (handles, SizeChange::Resized),
            None => (create_handles(device, width, height)?, SizeChange::Created),
        };
        self.handles = Some(handles);

        device.bind_target(ActiveTarget::Offscreen(handles.framebuffer));

        if change == SizeChange::Resized {
            let resized = device
                .allocate_texture_storage(handles.color, width, height, COLOR_FORMAT)
                .and_then(|()| {
                    device.allocate_renderbuffer_storage(
                        handles.depth_stencil,
                        width,
                        height,
                        DEPTH_STENCIL_FORMAT,
                    )
                });
            if let Err(err) = resized {
                // Storage may be half resized; the size stays at the last good allocation
                let status = device.framebuffer_status(handles.framebuffer);
                self.status = Some(status);
                log::warn!("render target resize to {width}x{height} failed: {err} ({status:?})");
                return Err(err.into());
            }
        }
        self.width = width;
        self.height = height;

        let status = device.framebuffer_status(handles.framebuffer);
        self.status = Some(status);
        if !status.is_complete() {
            log::warn!("render target {width}x{height} is incomplete: {status:?}");
            return Err(RenderTargetError::Incomplete(status));
        }

        log::debug!("render target {change:?} at {width}x{height}");
        Ok(change)
    }

    /// Makes this target the active render destination
    pub fn bind<D>(&self, device: &mut D) -> Result<(), RenderTargetError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let handles = self.handles.ok_or(RenderTargetError::NotCreated)?;
        device.bind_target(ActiveTarget::Offscreen(handles.framebuffer));
        Ok(())
    }

    /// Restores the default render destination
    pub fn unbind<D>(&self, device: &mut D)
    where
        D: GraphicsDevice + ?Sized,
    {
        device.bind_target(ActiveTarget::Default);
    }

    /// Releases all three handles; a no-op on a target that was never created.
    ///
    /// The target may be created again afterwards by `ensure_sized`.
    pub fn release<D>(&mut self, device: &mut D)
    where
        D: GraphicsDevice + ?Sized,
    {
        let Some(handles) = self.handles.take() else {
            return;
        };
        if device.active_target() == ActiveTarget::Offscreen(handles.framebuffer) {
            device.bind_target(ActiveTarget::Default);
        }
        device.delete_framebuffer(handles.framebuffer);
        device.delete_texture(handles.color);
        device.delete_renderbuffer(handles.depth_stencil);
        self.width = 0;
        self.height = 0;
        self.status = None;
        log::debug!("render target released");
    }

    pub fn handles(&self) -> Option<TargetHandles> {
        self.handles
    }

    pub fn is_created(&self) -> bool {
        self.handles.is_some()
    }

    /// Size of the currently allocated storage, `(0, 0)` before creation
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color image to hand to a UI for display
    pub fn color_texture(&self) -> Option<TextureHandle> {
        self.handles.map(|h| h.color)
    }

    pub fn status(&self) -> Option<FramebufferStatus> {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_some_and(FramebufferStatus::is_complete)
    }
}

/// Allocates the container and both attachments with initial storage.
///
/// Any failure deletes whatever was already created.
fn create_handles<D>(
    device: &mut D,
    width: u32,
    height: u32,
) -> Result<TargetHandles, DeviceError>
where
    D: GraphicsDevice + ?Sized,
{
    let mut pending = PendingHandles::new(device);

    let framebuffer = pending.device.create_framebuffer();
    pending.framebuffer = Some(framebuffer);
    let color = pending.device.create_texture();
    pending.color = Some(color);
    let depth_stencil = pending.device.create_renderbuffer();
    pending.depth_stencil = Some(depth_stencil);

    pending
        .device
        .allocate_texture_storage(color, width, height, COLOR_FORMAT)?;
    pending
        .device
        .allocate_renderbuffer_storage(depth_stencil, width, height, DEPTH_STENCIL_FORMAT)?;
    pending.device.attach_color(framebuffer, color)?;
    pending.device.attach_depth_stencil(framebuffer, depth_stencil)?;

    pending.disarm();
    Ok(TargetHandles {
        framebuffer,
        color,
        depth_stencil,
    })
}

/// Scoped ownership of handles that are not yet part of a target
struct PendingHandles<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    framebuffer: Option<FramebufferHandle>,
    color: Option<TextureHandle>,
    depth_stencil: Option<RenderbufferHandle>,
}

impl<'a, D: GraphicsDevice + ?Sized> PendingHandles<'a, D> {
    fn new(device: &'a mut D) -> Self {
        Self {
            device,
            framebuffer: None,
            color: None,
            depth_stencil: None,
        }
    }

    /// Hands ownership of the handles to the caller; nothing is deleted on drop
    fn disarm(mut self) {
        self.framebuffer = None;
        self.color = None;
        self.depth_stencil = None;
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for PendingHandles<'_, D> {
    fn drop(&mut self) {
        if let Some(fb) = self.framebuffer.take() {
            self.device.delete_framebuffer(fb);
        }
        if let Some(tex) = self.color.take() {
            self.device.delete_texture(tex);
        }
        if let Some(rb) = self.depth_stencil.take() {
            self.device.delete_renderbuffer(rb);
        }
    }
}
