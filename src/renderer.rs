use crate::gfx::{ActiveTarget, GraphicsDevice, TextureHandle};
use crate::outline::OutlinePass;
use crate::render_target::RenderTarget;
use crate::scene::Scene;

/// Pixel size requested by the UI for the offscreen image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct PanelSize {
    pub width: u32,
    pub height: u32,
}

impl PanelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Offscreen color image ready for display, valid until the next resize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelImage {
    pub texture: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Per-frame driver: sizes the render target, draws the scene into it or
/// straight to the surface, and hands the color image back for the UI.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    target: RenderTarget,
    outline: OutlinePass,
    recorded_size: Option<PanelSize>,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Panel size the target was last sized for
    pub fn recorded_size(&self) -> Option<PanelSize> {
        self.recorded_size
    }

    /// Renders the scene into the offscreen target sized to `desired`.
    ///
    /// Returns `None` when nothing could be drawn this frame (empty panel or
    /// incomplete target). The default target is active again on return.
    pub fn render_to_panel<D>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        desired: PanelSize,
    ) -> Option<PanelImage>
    where
        D: GraphicsDevice + ?Sized,
    {
        if desired.is_empty() {
            log::trace!("panel has no area, skipping offscreen draw");
            return None;
        }

        if self.recorded_size != Some(desired) {
            self.recorded_size = Some(desired);
            match self.target.ensure_sized(device, desired.width, desired.height) {
                Ok(change) => log::debug!(
                    "panel target {change:?} to {}x{}",
                    desired.width,
                    desired.height
                ),
                Err(err) => log::warn!("offscreen target unavailable: {err}"),
            }
        }

        if !self.target.is_complete() {
            return None;
        }
        let texture = self.target.color_texture()?;

        if let Err(err) = self.target.bind(device) {
            log::warn!("failed to bind offscreen target: {err}");
            return None;
        }
        let (width, height) = self.target.size();
        self.draw_scene(device, scene, width, height);
        self.target.unbind(device);

        Some(PanelImage {
            texture,
            width,
            height,
        })
    }

    /// Renders the scene to the default surface
    pub fn render_direct<D>(&mut self, device: &mut D, scene: &Scene, surface: PanelSize)
    where
        D: GraphicsDevice + ?Sized,
    {
        if device.active_target() != ActiveTarget::Default {
            log::warn!("direct render found an offscreen target still bound, unbinding");
            device.bind_target(ActiveTarget::Default);
        }
        if surface.is_empty() {
            return;
        }
        self.draw_scene(device, scene, surface.width, surface.height);
    }

    fn draw_scene<D>(&self, device: &mut D, scene: &Scene, width: u32, height: u32)
    where
        D: GraphicsDevice + ?Sized,
    {
        device.clear(scene.clear_color);
        let view_projection = scene.view_projection(width, height);
        let base = scene.base_transform();
        if scene.outline_enabled {
            self.outline.draw_with_outline(
                device,
                &scene.mesh,
                &base,
                scene.outline_scale,
                view_projection,
            );
        } else {
            self.outline.draw_plain(device, &scene.mesh, &base, view_projection);
        }
    }

    /// Releases the offscreen target; the renderer can be used again afterwards
    pub fn release<D>(&mut self, device: &mut D)
    where
        D: GraphicsDevice + ?Sized,
    {
        self.target.release(device);
        self.recorded_size = None;
    }
}
