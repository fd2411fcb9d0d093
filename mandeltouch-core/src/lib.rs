pub mod complex;
pub mod error;
pub mod fractal;
pub mod navigation;
pub mod presets;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::ConfigError;
pub use fractal::{escape_iteration, EscapeTime, FractalMode, ESCAPE_RADIUS};
pub use navigation::{
    apply_gesture, change_aspect, iterations_for_zoom_level, pan_zoom, validate_zoom_level,
    GestureKind, ViewportController, ViewportGesture, MAX_ZOOM_LEVEL,
};
pub use presets::{AspectRatio, Resolution};
pub use viewport::{PixelCoordinate, Surface, Viewport};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, ConfigError>;
