//! Windowless run mode: drives the frame loop against [`HeadlessDevice`].

use serde::Serialize;

use crate::cli::{AppConfig, RenderMode};
use crate::gfx::{ActiveTarget, DeviceCommand, GraphicsDevice, HeadlessDevice};
use crate::renderer::{FrameRenderer, PanelSize};
use crate::scene::Scene;

/// Simulated frame time
pub const FIXED_DELTA: f32 = 1.0 / 60.0;

/// Panel size for `frame` out of `total`: full window, then halved, then
/// collapsed to nothing, then full window again.
pub fn scheduled_panel_size(frame: u32, total: u32, window: PanelSize) -> PanelSize {
    let quarter = (total / 4).max(1);
    match frame / quarter {
        0 => window,
        1 => PanelSize::new(window.width / 2, window.height / 2),
        2 => PanelSize::default(),
        _ => window,
    }
}

/// Outcome of a headless run, printed as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlessReport {
    pub mode: RenderMode,
    pub frames: u32,
    /// Frames that produced an image (panel) or drew to the surface (direct)
    pub frames_drawn: u32,
    pub frames_skipped: u32,
    pub draw_calls: usize,
    pub storage_allocations: usize,
    pub last_panel_size: Option<PanelSize>,
    /// Resources still alive after teardown
    pub leaked_resources: usize,
}

/// Runs `config.frames` frames and tears everything down
pub fn run(config: &AppConfig) -> anyhow::Result<HeadlessReport> {
    let mut device = HeadlessDevice::new();
    let report = run_with_device(&mut device, config);

    if report.leaked_resources != 0 {
        anyhow::bail!("{} device resources outlived the run", report.leaked_resources);
    }
    if device.active_target() != ActiveTarget::Default {
        anyhow::bail!("offscreen target left bound after the run");
    }
    Ok(report)
}

pub fn run_with_device(device: &mut HeadlessDevice, config: &AppConfig) -> HeadlessReport {
    let mut scene = Scene::new(device, config.spin_speed);
    scene.outline_scale = config.outline_scale;
    device.clear_commands();

    let mut renderer = FrameRenderer::new();
    let window = PanelSize::new(config.window_width, config.window_height);
    let mut report = HeadlessReport {
        mode: config.mode,
        frames: config.frames,
        ..HeadlessReport::default()
    };

    log::info!("headless run: {} frames in {:?} mode", config.frames, config.mode);

    for frame in 0..config.frames {
        scene.update(FIXED_DELTA);
        let drew = match config.mode {
            RenderMode::Panel => {
                let desired = scheduled_panel_size(frame, config.frames, window);
                renderer.render_to_panel(device, &scene, desired).is_some()
            }
            RenderMode::Direct => {
                renderer.render_direct(device, &scene, window);
                !window.is_empty()
            }
        };
        if drew {
            report.frames_drawn += 1;
        } else {
            report.frames_skipped += 1;
        }

        // Tally this frame and drop its log so long runs stay flat in memory
        report.draw_calls += device.draws().count();
        report.storage_allocations += device
            .commands()
            .iter()
            .filter(|cmd| matches!(cmd, DeviceCommand::TextureStorage { .. }))
            .count();
        device.clear_commands();
    }

    report.last_panel_size = renderer.recorded_size();

    renderer.release(device);
    scene.release(device);
    report.leaked_resources = device.live_resources();

    log::info!(
        "headless run finished: {} drawn, {} skipped, {} draw calls",
        report.frames_drawn,
        report.frames_skipped,
        report.draw_calls
    );
    report
}
