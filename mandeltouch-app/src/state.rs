//! The persisted view record and its compact text encoding.
//!
//! The text form is JSON wrapped in URL-safe unpadded base64, suitable for a
//! URL fragment or a file name. Decoding also accepts bare JSON, which is
//! how older fragments (`{"zStart":…,"zEnd":…,"zoomLevel":…}`) were written.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mandeltouch_core::{
    iterations_for_zoom_level, validate_zoom_level, AspectRatio, Complex, ConfigError,
    FractalMode, Viewport,
};
use mandeltouch_render::{ColorMapConfig, ColorTable};

/// Everything needed to restore a view.
///
/// Missing fields take defaults, so partial records decode. A missing
/// `iterations` is derived from `zoomLevel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(default = "default_z_start")]
    pub z_start: Complex,
    #[serde(default = "default_z_end")]
    pub z_end: Complex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default = "default_zoom_level")]
    pub zoom_level: i32,
    #[serde(default)]
    pub mode: FractalMode,
    #[serde(default)]
    pub color_map: ColorMapConfig,
}

fn default_z_start() -> Complex {
    AspectRatio::default().default_bounds().0
}
fn default_z_end() -> Complex {
    AspectRatio::default().default_bounds().1
}
fn default_zoom_level() -> i32 {
    1
}

impl Default for ViewState {
    fn default() -> Self {
        Self::default_for(AspectRatio::default())
    }
}

impl ViewState {
    /// The whole-set view for `aspect` at zoom level 1.
    pub fn default_for(aspect: AspectRatio) -> Self {
        let (z_start, z_end) = aspect.default_bounds();
        Self {
            z_start,
            z_end,
            iterations: Some(Viewport::DEFAULT_ITERATIONS),
            zoom_level: default_zoom_level(),
            mode: FractalMode::default(),
            color_map: ColorMapConfig::default(),
        }
    }

    /// Snapshot of a live view.
    pub fn capture(
        viewport: &Viewport,
        zoom_level: i32,
        mode: FractalMode,
        color_map: ColorMapConfig,
    ) -> Self {
        Self {
            z_start: viewport.z_start(),
            z_end: viewport.z_end(),
            iterations: Some(viewport.iterations()),
            zoom_level,
            mode,
            color_map,
        }
    }

    /// The iteration budget, explicit or derived from the zoom level.
    pub fn effective_iterations(&self) -> u32 {
        self.iterations
            .unwrap_or_else(|| iterations_for_zoom_level(self.zoom_level))
    }

    /// Validated viewport for this record.
    pub fn viewport(&self) -> mandeltouch_core::Result<Viewport> {
        Viewport::new(self.z_start, self.z_end, self.effective_iterations())
    }

    /// Check every part of the record. Nothing is applied on failure.
    pub fn validate(&self) -> mandeltouch_core::Result<()> {
        validate_zoom_level(self.zoom_level)?;
        self.viewport()?;
        if let Some(c) = self.mode.julia_param() {
            if !c.is_finite() {
                return Err(ConfigError::Decode(format!("non-finite Julia parameter {c}")));
            }
        }
        ColorTable::build(&self.color_map)?;
        Ok(())
    }

    /// Compact text form: base64 (URL-safe, unpadded) of the JSON record.
    pub fn encode(&self) -> String {
        // Serializing plain data with string keys cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        BASE64.encode(json)
    }

    /// Parse and validate a text record. Accepts the base64 form, bare JSON,
    /// and either with a leading `#`.
    pub fn decode(text: &str) -> mandeltouch_core::Result<Self> {
        let text = text.trim();
        let text = text.strip_prefix('#').unwrap_or(text);
        if text.is_empty() {
            return Err(ConfigError::Decode("empty state".into()));
        }

        let json = if text.starts_with('{') {
            text.as_bytes().to_vec()
        } else {
            BASE64
                .decode(text)
                .map_err(|e| ConfigError::Decode(format!("invalid base64: {e}")))?
        };
        let state: Self = serde_json::from_slice(&json)
            .map_err(|e| ConfigError::Decode(format!("invalid JSON: {e}")))?;
        state.validate()?;
        debug!(zoom_level = state.zoom_level, "Decoded view state");
        Ok(state)
    }

    /// [`decode`](Self::decode), falling back to the default view for
    /// `aspect` when the record is missing or malformed.
    pub fn decode_or_default(text: Option<&str>, aspect: AspectRatio) -> Self {
        match text.map(Self::decode) {
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                warn!("Ignoring malformed view state ({e}); using defaults");
                Self::default_for(aspect)
            }
            None => Self::default_for(aspect),
        }
    }
}
