use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use mandeltouch_core::{EscapeTime, FractalMode, PixelCoordinate, Surface, Viewport};

use crate::buffer::RenderBuffer;
use crate::escape_buffer::EscapeBuffer;
use crate::palette::{ColorTable, Rgb};

// ---------------------------------------------------------------------------
// Supersession
// ---------------------------------------------------------------------------

/// Shared between a render and whoever may supersede it.
///
/// Every frame records the frame number it started under. [`cancel`] bumps
/// the number, and any row that has not started by then is skipped. Rows
/// already running finish; their results are still marked stale.
///
/// [`cancel`]: Self::cancel
#[derive(Debug, Default)]
pub struct RenderCancel {
    frame: AtomicU64,
    rows_done: AtomicUsize,
    rows_total: AtomicUsize,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede whatever frame is in flight.
    pub fn cancel(&self) {
        self.frame.fetch_add(1, Ordering::SeqCst);
    }

    /// Start a frame of `rows` rows; returns the frame number to check against.
    fn begin(&self, rows: usize) -> u64 {
        self.rows_total.store(rows, Ordering::Relaxed);
        self.rows_done.store(0, Ordering::Relaxed);
        self.frame.load(Ordering::SeqCst)
    }

    fn is_current(&self, frame: u64) -> bool {
        self.frame.load(Ordering::SeqCst) == frame
    }

    fn row_finished(&self) {
        self.rows_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows finished and rows expected in the latest frame.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.rows_done.load(Ordering::Relaxed),
            self.rows_total.load(Ordering::Relaxed),
        )
    }
}

// ---------------------------------------------------------------------------
// Per-pixel entry point
// ---------------------------------------------------------------------------

/// Evaluate a single pixel: map it onto the plane, iterate, and look up its
/// color at `offset`.
#[inline]
pub fn evaluate_pixel(
    coord: PixelCoordinate,
    viewport: &Viewport,
    surface: Surface,
    mode: FractalMode,
    table: &ColorTable,
    offset: i64,
) -> Rgb {
    let point = viewport.pixel_to_plane(coord, surface);
    table.color_at(mode.iterate(point, viewport.iterations()), offset)
}

// ---------------------------------------------------------------------------
// Full-frame render
// ---------------------------------------------------------------------------

/// The result of a full-frame render.
///
/// Contains raw escape data (no coloring); the caller applies a
/// [`ColorTable`] to produce displayable pixels.
#[derive(Debug)]
pub struct RenderResult {
    pub escapes: EscapeBuffer,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub rows_rendered: usize,
}

/// Render a full frame, one row per Rayon task.
///
/// Rows write disjoint slices of the output, so the only synchronization is
/// the join at the end. Each row checks `cancel` before starting; a
/// cancelled render leaves the remaining rows bounded and sets `cancelled`.
pub fn render(
    mode: FractalMode,
    viewport: &Viewport,
    surface: Surface,
    cancel: &Arc<RenderCancel>,
) -> RenderResult {
    let start = Instant::now();
    let max_iterations = viewport.iterations();
    let width = surface.width() as usize;

    debug!(
        width = surface.width(),
        height = surface.height(),
        max_iterations,
        mode = mode.label(),
        "Starting row render"
    );
    let frame = cancel.begin(surface.height() as usize);

    let mut escapes = EscapeBuffer::new(surface.width(), surface.height());
    let rows_rendered: usize = escapes
        .data
        .par_chunks_mut(width)
        .enumerate()
        .map(|(y, row)| {
            if !cancel.is_current(frame) {
                return 0;
            }
            render_row(mode, viewport, surface, y as u32, max_iterations, row);
            cancel.row_finished();
            1
        })
        .sum();

    let cancelled = !cancel.is_current(frame);
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        rows_rendered, cancelled, "Render complete"
    );

    RenderResult {
        escapes,
        elapsed,
        cancelled,
        rows_rendered,
    }
}

/// Render a full frame and colorize it in one step.
pub fn render_rgba(
    mode: FractalMode,
    viewport: &Viewport,
    surface: Surface,
    table: &ColorTable,
    offset: i64,
) -> RenderBuffer {
    let cancel = Arc::new(RenderCancel::new());
    let result = render(mode, viewport, surface, &cancel);
    table.colorize(&result.escapes, offset)
}

fn render_row(
    mode: FractalMode,
    viewport: &Viewport,
    surface: Surface,
    y: u32,
    max_iterations: u32,
    row: &mut [EscapeTime],
) {
    for (x, out) in row.iter_mut().enumerate() {
        let point = viewport.pixel_to_plane(PixelCoordinate::new(x as u32, y), surface);
        *out = mode.iterate(point, max_iterations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandeltouch_core::{AspectRatio, Complex};

    use crate::palette::ColorMapConfig;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(w, h).unwrap()
    }

    #[test]
    fn basic_render_produces_escape_data() {
        let viewport = Viewport::default_for(AspectRatio::SIXTEEN_TEN);
        let cancel = Arc::new(RenderCancel::new());

        let result = render(FractalMode::Mandelbrot, &viewport, surface(160, 100), &cancel);

        assert!(!result.cancelled);
        assert_eq!(result.escapes.data.len(), 160 * 100);
        assert_eq!(result.rows_rendered, 100);
        assert_eq!(cancel.progress(), (100, 100));
        // The default view shows both the set and its exterior.
        let bounded = result.escapes.bounded_count();
        assert!(bounded > 0 && bounded < 160 * 100);
    }

    #[test]
    fn render_matches_evaluate_pixel() {
        let viewport = Viewport::default_for(AspectRatio::SIXTEEN_NINE);
        let s = surface(48, 27);
        let table = ColorTable::build(&ColorMapConfig::default()).unwrap();
        let buf = render_rgba(FractalMode::Mandelbrot, &viewport, s, &table, 7);

        for &(x, y) in &[(0, 0), (10, 13), (47, 26), (30, 5)] {
            let rgb = evaluate_pixel(
                PixelCoordinate::new(x, y),
                &viewport,
                s,
                FractalMode::Mandelbrot,
                &table,
                7,
            );
            assert_eq!(buf.pixel(x, y), Some(rgb.to_rgba()));
        }
    }

    #[test]
    fn cancel_before_start_does_not_stale_the_next_frame() {
        let viewport = Viewport::default_for(AspectRatio::SIXTEEN_TEN);
        let cancel = Arc::new(RenderCancel::new());
        cancel.cancel();
        cancel.cancel();
        let result = render(FractalMode::Mandelbrot, &viewport, surface(32, 20), &cancel);
        assert!(!result.cancelled);
        assert_eq!(result.rows_rendered, 20);
    }

    #[test]
    fn far_region_escapes_everywhere() {
        let viewport = Viewport::new(Complex::new(5.0, 5.0), Complex::new(6.0, 6.0), 100).unwrap();
        let cancel = Arc::new(RenderCancel::new());
        let result = render(FractalMode::Mandelbrot, &viewport, surface(16, 16), &cancel);
        assert!(result
            .escapes
            .data
            .iter()
            .all(|&e| e == EscapeTime::Escaped(0)));
    }

    #[test]
    fn cancellation_stops_render() {
        let viewport = Viewport::default_for(AspectRatio::SIXTEEN_TEN)
            .with_iterations(50_000)
            .unwrap();
        let cancel = Arc::new(RenderCancel::new());

        let cancel_clone = Arc::clone(&cancel);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(5));
            cancel_clone.cancel();
        });

        let result = render(FractalMode::Mandelbrot, &viewport, surface(1024, 640), &cancel);
        if result.cancelled {
            assert!(result.rows_rendered < 640, "not all rows should have been rendered");
        }
    }
}
