use thiserror::Error;

/// Rejected configuration: a viewport, surface, gesture parameter, color map,
/// or persisted state that cannot be used as given.
///
/// Every variant is recoverable. Callers substitute a documented default and
/// retry rather than keep a partially applied value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid iteration budget: {0} (must be >= 1)")]
    InvalidIterations(u32),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("invalid surface dimensions: {width}×{height}")]
    InvalidSurface { width: u32, height: u32 },

    #[error("invalid zoom factor: {0} (must be positive and finite)")]
    InvalidZoomFactor(f64),

    #[error("zoom level {0} is out of range")]
    InvalidZoomLevel(i32),

    #[error("invalid aspect ratio: {width}:{height}")]
    InvalidAspect { width: u32, height: u32 },

    #[error("invalid interval size: {0} (must be >= 1)")]
    InvalidIntervalSize(u32),

    #[error("color map needs at least 2 color stops, got {0}")]
    TooFewColorStops(usize),

    #[error("invalid color stop {value:?}: {reason}")]
    InvalidColorStop { value: String, reason: String },

    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),

    #[error("undecodable view state: {0}")]
    Decode(String),
}
