// cli.rs - Command-line interface configuration
use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::outline::DEFAULT_SILHOUETTE_SCALE;

pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1080;
pub const DEFAULT_HEADLESS_FRAMES: u32 = 120;

/// Where the scene is drawn
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Offscreen target shown inside a UI panel
    #[default]
    Panel,
    /// Straight to the window surface
    Direct,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "enginish")]
#[command(about = "Offscreen render target and stencil outline viewer", long_about = None)]
pub struct Cli {
    /// Render into a UI panel or directly to the window
    #[arg(long, value_enum, default_value_t = RenderMode::Panel)]
    pub mode: RenderMode,

    /// Initial window width in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_WIDTH)]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_HEIGHT)]
    pub height: u32,

    /// Silhouette scale factor for the outline pass
    #[arg(long = "outline-scale", default_value_t = DEFAULT_SILHOUETTE_SCALE)]
    pub outline_scale: f32,

    /// Cube rotation speed in radians per second
    #[arg(long = "spin-speed", default_value_t = 1.0)]
    pub spin_speed: f32,

    /// Run without a window against the in-memory device
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = DEFAULT_HEADLESS_FRAMES)]
    pub frames: u32,

    /// Log filter, e.g. "debug" or "enginish=trace" (falls back to RUST_LOG)
    #[arg(long = "log-filter")]
    pub log_filter: Option<String>,
}

/// Validated startup configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AppConfig {
    pub mode: RenderMode,
    pub window_width: u32,
    pub window_height: u32,
    pub outline_scale: f32,
    pub spin_speed: f32,
    pub headless: bool,
    pub frames: u32,
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Panel,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            outline_scale: DEFAULT_SILHOUETTE_SCALE,
            spin_speed: 1.0,
            headless: false,
            frames: DEFAULT_HEADLESS_FRAMES,
            log_filter: None,
        }
    }
}

impl TryFrom<Cli> for AppConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.width == 0 || cli.height == 0 {
            return Err(ConfigError::WindowSize {
                width: cli.width,
                height: cli.height,
            });
        }
        // Scales at or below 1.0 are accepted and simply produce no outline
        if !cli.outline_scale.is_finite() || cli.outline_scale <= 0.0 {
            return Err(ConfigError::OutlineScale(cli.outline_scale));
        }
        if !cli.spin_speed.is_finite() {
            return Err(ConfigError::SpinSpeed(cli.spin_speed));
        }

        Ok(Self {
            mode: cli.mode,
            window_width: cli.width,
            window_height: cli.height,
            outline_scale: cli.outline_scale,
            spin_speed: cli.spin_speed,
            headless: cli.headless,
            frames: cli.frames,
            log_filter: cli.log_filter,
        })
    }
}
