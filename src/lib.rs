pub mod app;
pub mod camera;
pub mod cli;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod headless;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod outline;
pub mod render_target;
pub mod renderer;
pub mod scene;
pub mod ui;

pub use error::{ConfigError, DeviceError, RenderTargetError};
pub use outline::{OutlinePass, Transform};
pub use render_target::{RenderTarget, SizeChange};
pub use renderer::{FrameRenderer, PanelImage, PanelSize};
