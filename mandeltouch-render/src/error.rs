use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("PNG export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Config(#[from] mandeltouch_core::ConfigError),
}
