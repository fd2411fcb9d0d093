//! Aspect-ratio and resolution presets for the output surface.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::ConfigError;
use crate::viewport::Surface;

/// Plane units per aspect factor in the default views (16×10 spans 4.8 × 3.0).
const UNITS_PER_FACTOR: f64 = 0.3;

/// Real-axis centre of the default views.
const DEFAULT_CENTER_REAL: f64 = -0.6;

/// An aspect ratio expressed as integer width and height factors (`16:10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SIXTEEN_NINE: Self = Self {
        width: 16,
        height: 9,
    };
    pub const SIXTEEN_TEN: Self = Self {
        width: 16,
        height: 10,
    };
    pub const FORTY_EIGHT_TEN: Self = Self {
        width: 48,
        height: 10,
    };

    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidAspect { width, height });
        }
        Ok(Self { width, height })
    }

    /// Plane bounds `(z_start, z_end)` showing the whole set at this ratio.
    pub fn default_bounds(self) -> (Complex, Complex) {
        match self {
            Self::SIXTEEN_NINE => return (Complex::new(-3.0, -1.35), Complex::new(1.8, 1.35)),
            Self::SIXTEEN_TEN => return (Complex::new(-3.0, -1.5), Complex::new(1.8, 1.5)),
            // The panorama preset is shifted left to keep the set in frame.
            Self::FORTY_EIGHT_TEN => return (Complex::new(-10.0, -1.5), Complex::new(4.4, 1.5)),
            _ => {}
        }
        let half_w = UNITS_PER_FACTOR * self.width as f64 / 2.0;
        let half_h = UNITS_PER_FACTOR * self.height as f64 / 2.0;
        (
            Complex::new(DEFAULT_CENTER_REAL - half_w, -half_h),
            Complex::new(DEFAULT_CENTER_REAL + half_w, half_h),
        )
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SIXTEEN_TEN
    }
}

impl FromStr for AspectRatio {
    type Err = ConfigError;

    /// Parses `"16x10"` or `"16:10"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownPreset(s.to_string());
        let (w, h) = s.split_once(['x', ':']).ok_or_else(unknown)?;
        let width = w.trim().parse().map_err(|_| unknown())?;
        let height = h.trim().parse().map_err(|_| unknown())?;
        Self::new(width, height)
    }
}

/// Named output resolutions, from preview size up to print size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Xs,
    #[default]
    S,
    M,
    L,
    Xl,
}

impl Resolution {
    /// Pixels per aspect factor. The panorama ratio uses a shallower
    /// progression so its larger sizes stay within common texture limits.
    fn pixels_per_factor(self, aspect: AspectRatio) -> u32 {
        let panorama = aspect == AspectRatio::FORTY_EIGHT_TEN;
        match (self, panorama) {
            (Self::Xs, false) => 50,
            (Self::Xs, true) => 40,
            (Self::S, _) => 80,
            (Self::M, _) => 120,
            (Self::L, false) => 300,
            (Self::L, true) => 240,
            (Self::Xl, false) => 600,
            (Self::Xl, true) => 360,
        }
    }

    /// The surface this resolution produces at the given aspect ratio.
    ///
    /// Custom ratios with large factors can exceed [`Surface::MAX_DIMENSION`]
    /// and are rejected.
    pub fn surface(self, aspect: AspectRatio) -> crate::Result<Surface> {
        let k = self.pixels_per_factor(aspect);
        let oversized = || ConfigError::InvalidSurface {
            width: aspect.width.saturating_mul(k),
            height: aspect.height.saturating_mul(k),
        };
        let width = aspect.width.checked_mul(k).ok_or_else(oversized)?;
        let height = aspect.height.checked_mul(k).ok_or_else(oversized)?;
        Surface::new(width, height)
    }
}

impl FromStr for Resolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xs" => Ok(Self::Xs),
            "s" => Ok(Self::S),
            "m" => Ok(Self::M),
            "l" => Ok(Self::L),
            "xl" => Ok(Self::Xl),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}
