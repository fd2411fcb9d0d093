use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::ConfigError;
use crate::presets::AspectRatio;

/// A pixel on the output surface. `(0, 0)` is the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoordinate {
    pub x: u32,
    pub y: u32,
}

impl PixelCoordinate {
    #[inline]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of the output surface.
///
/// Only [`Surface::new`] builds one, so both sides are always in
/// `1..=MAX_DIMENSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
}

impl Surface {
    /// Largest accepted side, in pixels.
    pub const MAX_DIMENSION: u32 = 1 << 16;

    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        let valid = |side: u32| (1..=Self::MAX_DIMENSION).contains(&side);
        if !valid(width) || !valid(height) {
            return Err(ConfigError::InvalidSurface { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The aspect ratio of the surface (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The centre pixel, rounded down.
    pub fn center(&self) -> PixelCoordinate {
        PixelCoordinate::new(self.width / 2, self.height / 2)
    }

    pub fn contains(&self, coord: PixelCoordinate) -> bool {
        coord.x < self.width && coord.y < self.height
    }
}

/// The rectangle of the complex plane mapped onto the output surface, plus
/// the iteration budget used to evaluate it.
///
/// `z_start` is the bottom-left corner and `z_end` the top-right corner in
/// math orientation. Pixel row 0 is the top of the image, so it maps to
/// `z_end.imag`. Construction guarantees finite corners with
/// `z_end > z_start` on both axes and `iterations >= 1`; a viewport is
/// replaced wholesale, never patched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    z_start: Complex,
    z_end: Complex,
    iterations: u32,
}

impl Viewport {
    /// Iteration budget of the default view.
    pub const DEFAULT_ITERATIONS: u32 = 255;

    pub fn new(z_start: Complex, z_end: Complex, iterations: u32) -> crate::Result<Self> {
        if !z_start.is_finite() || !z_end.is_finite() {
            return Err(ConfigError::InvalidViewport {
                reason: format!("bounds must be finite, got {z_start} .. {z_end}"),
            });
        }
        if z_end.real <= z_start.real || z_end.imag <= z_start.imag {
            return Err(ConfigError::InvalidViewport {
                reason: format!("z_end must lie above and right of z_start, got {z_start} .. {z_end}"),
            });
        }
        if iterations < 1 {
            return Err(ConfigError::InvalidIterations(iterations));
        }
        Ok(Self {
            z_start,
            z_end,
            iterations,
        })
    }

    /// Default view for an aspect ratio: the whole set, 255 iterations.
    pub fn default_for(aspect: AspectRatio) -> Self {
        let (z_start, z_end) = aspect.default_bounds();
        Self {
            z_start,
            z_end,
            iterations: Self::DEFAULT_ITERATIONS,
        }
    }

    #[inline]
    pub fn z_start(&self) -> Complex {
        self.z_start
    }

    #[inline]
    pub fn z_end(&self) -> Complex {
        self.z_end
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Width and height of the visible region in plane units.
    #[inline]
    pub fn range(&self) -> Complex {
        self.z_end - self.z_start
    }

    /// Midpoint of the visible region.
    pub fn center(&self) -> Complex {
        (self.z_start + self.z_end) * 0.5
    }

    /// Return a copy with a different iteration budget.
    pub fn with_iterations(self, iterations: u32) -> crate::Result<Self> {
        Self::new(self.z_start, self.z_end, iterations)
    }

    /// Map a pixel coordinate to a point on the complex plane.
    ///
    /// `real = range.real · x / width + z_start.real` and
    /// `imag = z_end.imag − range.imag · y / height`.
    #[inline]
    pub fn pixel_to_plane(&self, coord: PixelCoordinate, surface: Surface) -> Complex {
        self.subpixel_to_plane(coord.x as f64, coord.y as f64, surface)
    }

    /// Like [`pixel_to_plane`](Self::pixel_to_plane) but accepts fractional
    /// and out-of-surface coordinates, as needed for zoom corners.
    #[inline]
    pub fn subpixel_to_plane(&self, x: f64, y: f64, surface: Surface) -> Complex {
        let range = self.range();
        Complex::new(
            range.real * x / surface.width() as f64 + self.z_start.real,
            self.z_end.imag - range.imag * y / surface.height() as f64,
        )
    }

    /// Inverse of [`subpixel_to_plane`](Self::subpixel_to_plane): returns
    /// fractional pixel coordinates `(x, y)`.
    pub fn plane_to_pixel(&self, z: Complex, surface: Surface) -> (f64, f64) {
        let range = self.range();
        (
            (z.real - self.z_start.real) * surface.width() as f64 / range.real,
            (self.z_end.imag - z.imag) * surface.height() as f64 / range.imag,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::default_for(AspectRatio::default())
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} .. {}] @ {} iterations",
            self.z_start, self.z_end, self.iterations
        )
    }
}
