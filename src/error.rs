use thiserror::Error;

use crate::gfx::FramebufferStatus;

/// Errors raised by a [`GraphicsDevice`](crate::gfx::GraphicsDevice) backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("unknown or released {0} handle")]
    UnknownHandle(&'static str),

    #[error("storage {width}x{height} exceeds device limit of {limit}")]
    StorageTooLarge { width: u32, height: u32, limit: u32 },

    #[error("attachment rejected by device: {0}")]
    AttachmentRejected(&'static str),
}

/// Errors reported by [`RenderTarget`](crate::render_target::RenderTarget)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderTargetError {
    #[error("render target size must be positive, got {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("render target size {width}x{height} exceeds device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },

    #[error("render target is incomplete: {0:?}")]
    Incomplete(FramebufferStatus),

    #[error("render target has not been created")]
    NotCreated,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors raised while turning command-line arguments into an [`AppConfig`](crate::cli::AppConfig)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window size must be positive, got {width}x{height}")]
    WindowSize { width: u32, height: u32 },

    #[error("outline scale must be a finite number, got {0}")]
    OutlineScale(f32),

    #[error("spin speed must be a finite number, got {0}")]
    SpinSpeed(f32),
}
