pub mod buffer;
pub mod error;
pub mod escape_buffer;
pub mod export;
pub mod palette;
pub mod renderer;

pub use buffer::RenderBuffer;
pub use error::RenderError;
pub use escape_buffer::EscapeBuffer;
pub use export::{export_png, suggested_file_name, ExportMetadata};
pub use palette::{
    build_color_table, builtin_color_map, builtin_color_maps, color_at, ColorMapConfig,
    ColorStop, ColorTable, NamedColorMap, Rgb,
};
pub use renderer::{evaluate_pixel, render, render_rgba, RenderCancel, RenderResult};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
