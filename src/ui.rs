//! egui side of the frame: the scene viewport and the control window.

use egui::{Color32, RichText};

use crate::cli::RenderMode;
use crate::gfx::TextureOrigin;
use crate::renderer::{PanelImage, PanelSize};
use crate::scene::Scene;

pub const OUTLINE_SCALE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=2.0;
pub const SPIN_SPEED_RANGE: std::ops::RangeInclusive<f32> = -6.0..=6.0;

const VIEWPORT_DEFAULT_SIZE: [f32; 2] = [800.0, 600.0];
const ACCENT: Color32 = Color32::from_rgb(74, 158, 255);

/// UV rectangle covering the whole image, flipped for bottom-up storage
pub fn panel_uv(origin: TextureOrigin) -> egui::Rect {
    match origin {
        TextureOrigin::TopLeft => egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        TextureOrigin::BottomLeft => {
            egui::Rect::from_min_max(egui::pos2(0.0, 1.0), egui::pos2(1.0, 0.0))
        }
    }
}

/// Physical pixel size of a region measured in points
pub fn pixels_for(points: egui::Vec2, pixels_per_point: f32) -> PanelSize {
    let to_pixels = |v: f32| (v * pixels_per_point).floor().max(0.0) as u32;
    PanelSize::new(to_pixels(points.x), to_pixels(points.y))
}

/// Image registered with the UI renderer together with its pixel size
#[derive(Debug, Clone, Copy)]
pub struct ViewportImage {
    pub id: egui::TextureId,
    pub image: PanelImage,
}

/// Resizable "Scene" window that displays the offscreen image.
///
/// The region measured while laying out frame N is the size the target is
/// rendered at in frame N+1.
#[derive(Debug, Default)]
pub struct ViewportPanel {
    desired: PanelSize,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixel size recorded during the last layout
    pub fn desired_size(&self) -> PanelSize {
        self.desired
    }

    pub fn show(&mut self, ctx: &egui::Context, image: Option<ViewportImage>, origin: TextureOrigin) {
        let pixels_per_point = ctx.pixels_per_point();
        egui::Window::new("Scene")
            .default_size(VIEWPORT_DEFAULT_SIZE)
            .resizable(true)
            .show(ctx, |ui| {
                let available = ui.available_size();
                self.desired = pixels_for(available, pixels_per_point);

                match image {
                    Some(ViewportImage { id, image }) => {
                        let size = egui::vec2(image.width as f32, image.height as f32)
                            / pixels_per_point;
                        let texture = egui::load::SizedTexture::new(id, size);
                        ui.add(
                            egui::Image::new(texture)
                                .uv(panel_uv(origin))
                                .fit_to_exact_size(size),
                        );
                    }
                    None => {
                        ui.allocate_space(available);
                    }
                }
            });
    }
}

/// Frame statistics and live scene tweaks
#[derive(Debug, Default)]
pub struct ControlsPanel;

impl ControlsPanel {
    pub fn show(&self, ctx: &egui::Context, fps: f32, mode: RenderMode, scene: &mut Scene) {
        egui::Window::new("Controls")
            .title_bar(true)
            .resizable(false)
            .default_pos(egui::pos2(10.0, 10.0))
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{fps:.0}")).size(20.0).color(ACCENT));
                    ui.label(RichText::new("FPS").color(Color32::GRAY));
                });
                ui.label(RichText::new(format!("mode: {mode:?}")).color(Color32::GRAY));
                ui.separator();

                ui.checkbox(&mut scene.outline_enabled, "Outline");
                ui.add_enabled(
                    scene.outline_enabled,
                    egui::Slider::new(&mut scene.outline_scale, OUTLINE_SCALE_RANGE)
                        .text("Outline scale"),
                );
                ui.add(egui::Slider::new(&mut scene.spin.speed, SPIN_SPEED_RANGE).text("Spin (rad/s)"));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_origin_is_not_flipped() {
        let uv = panel_uv(TextureOrigin::TopLeft);
        assert_eq!(uv.min, egui::pos2(0.0, 0.0));
        assert_eq!(uv.max, egui::pos2(1.0, 1.0));
    }

    #[test]
    fn bottom_left_origin_flips_vertically() {
        let uv = panel_uv(TextureOrigin::BottomLeft);
        assert_eq!(uv.min, egui::pos2(0.0, 1.0));
        assert_eq!(uv.max, egui::pos2(1.0, 0.0));
    }

    #[test]
    fn pixels_are_floored() {
        assert_eq!(pixels_for(egui::vec2(400.7, 300.2), 1.0), PanelSize::new(400, 300));
        assert_eq!(pixels_for(egui::vec2(400.0, 300.0), 1.5), PanelSize::new(600, 450));
    }

    #[test]
    fn negative_region_clamps_to_zero() {
        let size = pixels_for(egui::vec2(-5.0, 10.0), 2.0);
        assert_eq!(size, PanelSize::new(0, 20));
        assert!(size.is_empty());
    }
}
