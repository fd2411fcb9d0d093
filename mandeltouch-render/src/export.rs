//! PNG export with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use mandeltouch_core::{FractalMode, Viewport};

use crate::buffer::RenderBuffer;
use crate::error::RenderError;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    pub mode: FractalMode,
    pub viewport: Viewport,
    pub zoom_level: i32,
    pub color_map: String,
    /// Encoded view state, so the image can be reopened at the same view.
    pub state: Option<String>,
}

/// File name for an exported view:
/// `MB_zStart_r_<re>_i_<im>_zEnd_r_<re>_i_<im>_zoomLevel_<n>.png`.
pub fn suggested_file_name(viewport: &Viewport, zoom_level: i32) -> String {
    let (start, end) = (viewport.z_start(), viewport.z_end());
    format!(
        "MB_zStart_r_{}_i_{}_zEnd_r_{}_i_{}_zoomLevel_{}.png",
        start.real, start.imag, end.real, end.imag, zoom_level
    )
}

/// Write an RGBA buffer as a PNG file with embedded view metadata.
///
/// Uses the `png` crate directly to inject custom tEXt chunks.
pub fn export_png(buffer: &RenderBuffer, path: &Path, metadata: &ExportMetadata) -> crate::Result<()> {
    if buffer.width == 0
        || buffer.height == 0
        || buffer.pixels.len() != buffer.width as usize * buffer.height as usize * 4
    {
        return Err(RenderError::InvalidDimensions {
            width: buffer.width,
            height: buffer.height,
        });
    }

    let file = std::fs::File::create(path)
        .map_err(|e| RenderError::Export(format!("failed to create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "MandelTouch".to_string())
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    encoder
        .add_text_chunk("Description".to_string(), build_description(metadata))
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| RenderError::Export(format!("failed to add text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| RenderError::Export(format!("failed to write PNG header: {e}")))?;
    png_writer
        .write_image_data(&buffer.pixels)
        .map_err(|e| RenderError::Export(format!("failed to write PNG image data: {e}")))?;

    debug!(
        width = buffer.width,
        height = buffer.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    let mut desc = format!(
        "{} - {} .. {}, Zoom level: {}, Iterations: {}",
        meta.mode.label(),
        meta.viewport.z_start(),
        meta.viewport.z_end(),
        meta.zoom_level,
        meta.viewport.iterations(),
    );
    if let Some(c) = meta.mode.julia_param() {
        desc.push_str(&format!(", Julia c: {c}"));
    }
    desc
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    let vp = &meta.viewport;
    let mut pairs = vec![
        ("MandelTouch.Mode".into(), meta.mode.label().to_string()),
        ("MandelTouch.ZStartRe".into(), vp.z_start().real.to_string()),
        ("MandelTouch.ZStartIm".into(), vp.z_start().imag.to_string()),
        ("MandelTouch.ZEndRe".into(), vp.z_end().real.to_string()),
        ("MandelTouch.ZEndIm".into(), vp.z_end().imag.to_string()),
        ("MandelTouch.Iterations".into(), vp.iterations().to_string()),
        ("MandelTouch.ZoomLevel".into(), meta.zoom_level.to_string()),
        ("MandelTouch.ColorMap".into(), meta.color_map.clone()),
    ];
    if let Some(c) = meta.mode.julia_param() {
        pairs.push(("MandelTouch.JuliaC_Re".into(), c.real.to_string()));
        pairs.push(("MandelTouch.JuliaC_Im".into(), c.imag.to_string()));
    }
    if let Some(state) = &meta.state {
        pairs.push(("MandelTouch.State".into(), state.clone()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandeltouch_core::{AspectRatio, Complex};
    use std::io::Read;

    fn meta(mode: FractalMode) -> ExportMetadata {
        ExportMetadata {
            mode,
            viewport: Viewport::default_for(AspectRatio::SIXTEEN_TEN),
            zoom_level: 1,
            color_map: "grayscale".into(),
            state: Some("e30".into()),
        }
    }

    #[test]
    fn file_name_follows_convention() {
        let vp = Viewport::default_for(AspectRatio::SIXTEEN_TEN);
        assert_eq!(
            suggested_file_name(&vp, 1),
            "MB_zStart_r_-3_i_-1.5_zEnd_r_1.8_i_1.5_zoomLevel_1.png"
        );
    }

    #[test]
    fn export_creates_valid_png() {
        let buffer = RenderBuffer::new(4, 4);
        let dir = std::env::temp_dir().join("mandeltouch_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_export.png");
        export_png(&buffer, &path, &meta(FractalMode::Mandelbrot)).expect("export should succeed");

        let mut file = std::fs::File::open(&path).expect("file should exist");
        let mut header = [0u8; 8];
        file.read_exact(&mut header).expect("should read header");
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_embeds_text_chunks() {
        let buffer = RenderBuffer::new(2, 2);
        let mode = FractalMode::Julia {
            c: Complex::new(-0.4, 0.6),
        };
        let dir = std::env::temp_dir().join("mandeltouch_test_export_meta");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_meta.png");
        export_png(&buffer, &path, &meta(mode)).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let texts = &reader.info().uncompressed_latin1_text;
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Software" && t.text == "MandelTouch"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "MandelTouch.Mode" && t.text == "Julia"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "MandelTouch.JuliaC_Re" && t.text == "-0.4"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "MandelTouch.State" && t.text == "e30"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_rejects_mismatched_buffer() {
        let mut buffer = RenderBuffer::new(2, 2);
        buffer.pixels.pop();
        let path = std::env::temp_dir().join("mandeltouch_never_written.png");
        let err = export_png(&buffer, &path, &meta(FractalMode::Mandelbrot)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidDimensions { width: 2, height: 2 }));
    }
}
