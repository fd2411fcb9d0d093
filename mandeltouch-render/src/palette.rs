use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mandeltouch_core::{ConfigError, EscapeTime};

use crate::buffer::RenderBuffer;
use crate::escape_buffer::EscapeBuffer;

// ---------------------------------------------------------------------------
// Colors and color stops
// ---------------------------------------------------------------------------

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA bytes.
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// Parses `#rrggbb`, `rrggbb`, `#rgb`, or `rgb` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidColorStop {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("expected hexadecimal digits"));
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid("bad channel"));
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #abc expands to #aabbcc.
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid("expected 3 or 6 hex digits")),
        }
    }
}

/// A gradient anchor as written in a color map configuration: either a hex
/// string or an explicit RGB triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorStop {
    Hex(String),
    Rgb(Rgb),
}

impl ColorStop {
    /// Resolve to an RGB triple, parsing hex strings.
    pub fn resolve(&self) -> Result<Rgb, ConfigError> {
        match self {
            Self::Hex(s) => s.parse(),
            Self::Rgb(c) => Ok(*c),
        }
    }
}

impl From<Rgb> for ColorStop {
    fn from(c: Rgb) -> Self {
        Self::Rgb(c)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// User-facing description of a gradient color map.
///
/// `color_steps` are visited in order (duplicates are meaningful), each
/// adjacent pair contributing `interval_size` table entries. `offset` shifts
/// the lookup index, which is how color cycling animates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorMapConfig {
    pub color_steps: Vec<ColorStop>,
    pub interval_size: u32,
    #[serde(default)]
    pub offset: i64,
}

impl ColorMapConfig {
    pub fn new(color_steps: Vec<ColorStop>, interval_size: u32, offset: i64) -> Self {
        Self {
            color_steps,
            interval_size,
            offset,
        }
    }

    fn from_rgb(stops: &[Rgb], interval_size: u32) -> Self {
        Self::new(stops.iter().copied().map(ColorStop::from).collect(), interval_size, 0)
    }
}

impl Default for ColorMapConfig {
    fn default() -> Self {
        grayscale()
    }
}

// ---------------------------------------------------------------------------
// Color table
// ---------------------------------------------------------------------------

/// Precomputed gradient lookup table.
///
/// Holds exactly `(stops − 1) · interval_size` colors and is immutable once
/// built; a configuration change builds a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: Vec<Rgb>,
    background: Rgb,
}

impl ColorTable {
    /// Build the table for `config`.
    ///
    /// Each segment `(y1, y2)` contributes `interval_size` steps of the
    /// half-cosine blend `0.5 · ((y1 − y2) · cos(π·i/n) + y1 + y2)` per
    /// channel, rounded and clamped to `0..=255`. Equal endpoints yield a
    /// flat segment.
    pub fn build(config: &ColorMapConfig) -> mandeltouch_core::Result<Self> {
        if config.interval_size < 1 {
            return Err(ConfigError::InvalidIntervalSize(config.interval_size));
        }
        if config.color_steps.len() < 2 {
            return Err(ConfigError::TooFewColorStops(config.color_steps.len()));
        }
        let stops = config
            .color_steps
            .iter()
            .map(ColorStop::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_stops(&stops, config.interval_size))
    }

    fn from_stops(stops: &[Rgb], n: u32) -> Self {
        let mut colors = Vec::with_capacity((stops.len() - 1) * n as usize);
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for i in 0..n {
                colors.push(Rgb::new(
                    blend_channel(a.r, b.r, i, n),
                    blend_channel(a.g, b.g, i, n),
                    blend_channel(a.b, b.b, i, n),
                ));
            }
        }
        debug!(stops = stops.len(), interval_size = n, len = colors.len(), "Built color table");

        Self {
            colors,
            background: stops[0],
        }
    }

    /// Number of table entries; never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Color used for bounded points: the first color stop.
    #[inline]
    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Map an escape result to a color.
    ///
    /// Bounded points get [`background`](Self::background). Escaped points
    /// index the table at `(count + offset) mod len`, using a non-negative
    /// modulo so negative offsets wrap. Any `i64` offset is accepted.
    #[inline]
    pub fn color_at(&self, escape: EscapeTime, offset: i64) -> Rgb {
        match escape {
            EscapeTime::Bounded => self.background,
            EscapeTime::Escaped(count) => {
                let len = self.colors.len() as i64;
                // Both terms are reduced first, so the sum stays below 2·len.
                let index = (i64::from(count) % len + offset.rem_euclid(len)) % len;
                self.colors[index as usize]
            }
        }
    }

    /// Colorize an entire escape buffer into an RGBA pixel buffer.
    pub fn colorize(&self, escapes: &EscapeBuffer, offset: i64) -> RenderBuffer {
        let mut pixels = vec![0u8; escapes.data.len() * 4];
        pixels
            .par_chunks_mut(4)
            .zip(escapes.data.par_iter())
            .for_each(|(pixel, &escape)| {
                pixel.copy_from_slice(&self.color_at(escape, offset).to_rgba());
            });
        RenderBuffer {
            width: escapes.width,
            height: escapes.height,
            pixels,
        }
    }
}

impl Default for ColorTable {
    /// The grayscale table (black, white, black; 256 per segment).
    fn default() -> Self {
        Self::from_stops(&GRAYSCALE, 256)
    }
}

/// Build a color table, rejecting invalid configurations.
pub fn build_color_table(config: &ColorMapConfig) -> mandeltouch_core::Result<ColorTable> {
    ColorTable::build(config)
}

/// Map an escape result to a color with an explicit offset.
#[inline]
pub fn color_at(escape: EscapeTime, table: &ColorTable, offset: i64) -> Rgb {
    table.color_at(escape, offset)
}

fn blend_channel(y1: u8, y2: u8, i: u32, n: u32) -> u8 {
    if y1 == y2 {
        return y1;
    }
    let (y1, y2) = (y1 as f64, y2 as f64);
    let v = 0.5 * ((y1 - y2) * (PI * i as f64 / n as f64).cos() + y1 + y2);
    v.round().clamp(0.0, 255.0) as u8
}

// ---------------------------------------------------------------------------
// Builtin color maps
// ---------------------------------------------------------------------------

/// A named color map configuration.
#[derive(Debug, Clone)]
pub struct NamedColorMap {
    pub name: &'static str,
    pub config: ColorMapConfig,
}

pub fn builtin_color_maps() -> Vec<NamedColorMap> {
    vec![
        NamedColorMap {
            name: "grayscale",
            config: grayscale(),
        },
        NamedColorMap {
            name: "fire",
            config: fire(),
        },
        NamedColorMap {
            name: "rainbow",
            config: rainbow(),
        },
        NamedColorMap {
            name: "flame",
            config: flame(),
        },
    ]
}

/// Look up a builtin color map by name (case-insensitive).
pub fn builtin_color_map(name: &str) -> Option<ColorMapConfig> {
    builtin_color_maps()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.config)
}

const GRAYSCALE: [Rgb; 3] = [Rgb::BLACK, Rgb::WHITE, Rgb::BLACK];

fn grayscale() -> ColorMapConfig {
    ColorMapConfig::from_rgb(&GRAYSCALE, 256)
}

fn fire() -> ColorMapConfig {
    let stops = [
        Rgb::BLACK,
        Rgb::new(128, 0, 0),
        Rgb::new(255, 64, 0),
        Rgb::new(255, 128, 0),
        Rgb::new(255, 64, 0),
        Rgb::new(128, 0, 0),
        Rgb::BLACK,
    ];
    ColorMapConfig::from_rgb(&stops, 64)
}

fn rainbow() -> ColorMapConfig {
    let stops = [
        Rgb::BLACK,
        Rgb::new(255, 0, 0),
        Rgb::new(255, 255, 0),
        Rgb::WHITE,
        Rgb::new(0, 255, 255),
        Rgb::new(0, 0, 255),
        Rgb::new(0, 255, 0),
        Rgb::BLACK,
    ];
    ColorMapConfig::from_rgb(&stops, 32)
}

fn flame() -> ColorMapConfig {
    let stops = [
        Rgb::BLACK,
        Rgb::new(255, 0, 0),
        Rgb::new(255, 255, 0),
        Rgb::WHITE,
        Rgb::new(255, 255, 0),
        Rgb::new(255, 0, 0),
        Rgb::BLACK,
    ];
    ColorMapConfig::from_rgb(&stops, 128)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
