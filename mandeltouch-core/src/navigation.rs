use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::presets::AspectRatio;
use crate::viewport::{PixelCoordinate, Surface, Viewport};

/// Zoom factor for one zoom-in step (halves the visible extent).
pub const ZOOM_IN_FACTOR: f64 = 0.5;
/// Zoom factor for one zoom-out step.
pub const ZOOM_OUT_FACTOR: f64 = 1.0 / ZOOM_IN_FACTOR;

/// Deepest zoom level accepted in either direction. Halving the extent this
/// many times is far past where `f64` bounds collapse.
pub const MAX_ZOOM_LEVEL: i32 = 1 << 12;

/// Iteration budget for a zoom level: 255 up to level 1, then 32 more per level.
/// Saturates at `u32::MAX`.
pub fn iterations_for_zoom_level(level: i32) -> u32 {
    if level < 2 {
        Viewport::DEFAULT_ITERATIONS
    } else {
        Viewport::DEFAULT_ITERATIONS.saturating_add((level as u32).saturating_mul(32))
    }
}

/// Reject a zoom level outside `-MAX_ZOOM_LEVEL..=MAX_ZOOM_LEVEL`.
pub fn validate_zoom_level(level: i32) -> crate::Result<i32> {
    if level.unsigned_abs() > MAX_ZOOM_LEVEL as u32 {
        return Err(ConfigError::InvalidZoomLevel(level));
    }
    Ok(level)
}

/// What a navigation gesture asks the viewport to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    PanZoom,
    Reset,
}

/// A navigation request in pixel space.
///
/// For [`GestureKind::Reset`] only `iterations` is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGesture {
    pub kind: GestureKind,
    pub center: PixelCoordinate,
    pub factor: f64,
    pub iterations: u32,
}

/// Derive the viewport that results from a pan/zoom around `center`.
///
/// The new corners are `center ∓ factor · surface / 2` in pixel space, with
/// the y offset sign flipped so the bottom-left pixel corner becomes
/// `z_start`. Both are mapped through the *current* viewport. A factor below
/// 1 zooms in, above 1 zooms out, exactly 1 pans.
pub fn pan_zoom(
    current: &Viewport,
    surface: Surface,
    center: PixelCoordinate,
    factor: f64,
    iterations: u32,
) -> crate::Result<Viewport> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ConfigError::InvalidZoomFactor(factor));
    }
    let diff_x = factor * surface.width() as f64 / 2.0;
    let diff_y = factor * surface.height() as f64 / 2.0;
    let (cx, cy) = (center.x as f64, center.y as f64);
    let z_start = current.subpixel_to_plane(cx - diff_x, cy + diff_y, surface);
    let z_end = current.subpixel_to_plane(cx + diff_x, cy - diff_y, surface);
    Viewport::new(z_start, z_end, iterations)
}

/// Refit plane bounds to a new aspect ratio.
///
/// The imaginary bounds stay fixed. The plane distance per aspect unit is
/// `vertical_range / old.height`, and the new horizontal range is that
/// distance times `new.width`, recentred on the old real midpoint.
pub fn change_aspect(
    current: &Viewport,
    old: AspectRatio,
    new: AspectRatio,
) -> crate::Result<Viewport> {
    if old.width == 0 || old.height == 0 {
        return Err(ConfigError::InvalidAspect {
            width: old.width,
            height: old.height,
        });
    }
    if new.width == 0 || new.height == 0 {
        return Err(ConfigError::InvalidAspect {
            width: new.width,
            height: new.height,
        });
    }
    let range = current.range();
    let dist_per_unit_height = range.imag / old.height as f64;
    let half_horizontal = dist_per_unit_height * new.width as f64 / 2.0;
    let center_real = current.center().real;

    let mut z_start = current.z_start();
    let mut z_end = current.z_end();
    z_start.real = center_real - half_horizontal;
    z_end.real = center_real + half_horizontal;
    Viewport::new(z_start, z_end, current.iterations())
}

/// Apply a navigation gesture to a viewport without touching any other state.
pub fn apply_gesture(
    current: &Viewport,
    gesture: &ViewportGesture,
    surface: Surface,
    aspect: AspectRatio,
) -> crate::Result<Viewport> {
    match gesture.kind {
        GestureKind::PanZoom => pan_zoom(
            current,
            surface,
            gesture.center,
            gesture.factor,
            gesture.iterations,
        ),
        GestureKind::Reset => Viewport::default_for(aspect).with_iterations(gesture.iterations),
    }
}

/// Owns the current viewport and replaces it on every navigation input.
///
/// A rejected input leaves the controller exactly as it was.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    surface: Surface,
    aspect: AspectRatio,
    zoom_level: i32,
}

impl ViewportController {
    pub fn new(viewport: Viewport, surface: Surface, aspect: AspectRatio, zoom_level: i32) -> Self {
        Self {
            viewport,
            surface,
            aspect,
            zoom_level,
        }
    }

    /// The default view for `aspect` on `surface`, at zoom level 1.
    pub fn with_defaults(surface: Surface, aspect: AspectRatio) -> Self {
        Self::new(Viewport::default_for(aspect), surface, aspect, 1)
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    #[inline]
    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    #[inline]
    pub fn zoom_level(&self) -> i32 {
        self.zoom_level
    }

    /// Replace the viewport with the pan/zoom result around `center`.
    pub fn pan_zoom(
        &mut self,
        center: PixelCoordinate,
        factor: f64,
        iterations: u32,
    ) -> crate::Result<&Viewport> {
        let next = pan_zoom(&self.viewport, self.surface, center, factor, iterations)?;
        debug!(x = center.x, y = center.y, factor, iterations, "Pan/zoom applied");
        self.viewport = next;
        Ok(&self.viewport)
    }

    /// Recentre on `center` without changing the extent or zoom level.
    pub fn pan(&mut self, center: PixelCoordinate) -> crate::Result<&Viewport> {
        let iterations = self.viewport.iterations();
        self.pan_zoom(center, 1.0, iterations)
    }

    /// One zoom-in step at `center`; raises the zoom level and its budget.
    pub fn zoom_in(&mut self, center: PixelCoordinate) -> crate::Result<&Viewport> {
        self.zoom_step(center, ZOOM_IN_FACTOR, 1)
    }

    /// One zoom-out step at `center`; lowers the zoom level and its budget.
    pub fn zoom_out(&mut self, center: PixelCoordinate) -> crate::Result<&Viewport> {
        self.zoom_step(center, ZOOM_OUT_FACTOR, -1)
    }

    fn zoom_step(
        &mut self,
        center: PixelCoordinate,
        factor: f64,
        level_delta: i32,
    ) -> crate::Result<&Viewport> {
        let level = validate_zoom_level(self.zoom_level.saturating_add(level_delta))?;
        let next = pan_zoom(
            &self.viewport,
            self.surface,
            center,
            factor,
            iterations_for_zoom_level(level),
        )?;
        self.zoom_level = level;
        self.viewport = next;
        debug!(zoom_level = level, iterations = next.iterations(), "Zoom step applied");
        Ok(&self.viewport)
    }

    /// Wheel input: a negative delta (wheel up) zooms in, positive zooms out.
    pub fn wheel(&mut self, center: PixelCoordinate, delta_y: f64) -> crate::Result<&Viewport> {
        if delta_y < 0.0 {
            self.zoom_in(center)
        } else {
            self.zoom_out(center)
        }
    }

    /// Restore the default view for the current aspect ratio.
    pub fn reset(&mut self) -> &Viewport {
        self.viewport = Viewport::default_for(self.aspect);
        self.zoom_level = 1;
        &self.viewport
    }

    /// Apply a [`ViewportGesture`]. `Reset` also resets the zoom level.
    pub fn apply(&mut self, gesture: &ViewportGesture) -> crate::Result<&Viewport> {
        let next = apply_gesture(&self.viewport, gesture, self.surface, self.aspect)?;
        if gesture.kind == GestureKind::Reset {
            self.zoom_level = 1;
        }
        self.viewport = next;
        Ok(&self.viewport)
    }

    /// Switch aspect ratio and output resolution together.
    ///
    /// The plane bounds are refitted with [`change_aspect`]; the surface is
    /// replaced as given.
    pub fn change_aspect_or_resolution(
        &mut self,
        aspect: AspectRatio,
        surface: Surface,
    ) -> crate::Result<&Viewport> {
        let next = change_aspect(&self.viewport, self.aspect, aspect)?;
        debug!(
            from = %format!("{}:{}", self.aspect.width, self.aspect.height),
            to = %format!("{}:{}", aspect.width, aspect.height),
            width = surface.width(),
            height = surface.height(),
            "Aspect/resolution changed"
        );
        self.viewport = next;
        self.aspect = aspect;
        self.surface = surface;
        Ok(&self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::Complex;

    const EPSILON: f64 = 1e-9;

    fn surface() -> Surface {
        Surface::new(1280, 800).unwrap()
    }

    fn assert_close(a: &Viewport, b: &Viewport) {
        for (x, y) in [
            (a.z_start().real, b.z_start().real),
            (a.z_start().imag, b.z_start().imag),
            (a.z_end().real, b.z_end().real),
            (a.z_end().imag, b.z_end().imag),
        ] {
            assert!((x - y).abs() < EPSILON, "{a} != {b}");
        }
    }

    #[test]
    fn iteration_budget_by_level() {
        assert_eq!(iterations_for_zoom_level(-3), 255);
        assert_eq!(iterations_for_zoom_level(1), 255);
        assert_eq!(iterations_for_zoom_level(2), 319);
        assert_eq!(iterations_for_zoom_level(10), 575);
        assert_eq!(iterations_for_zoom_level(200_000_000), u32::MAX);
        assert_eq!(iterations_for_zoom_level(i32::MAX), u32::MAX);
    }

    #[test]
    fn zoom_level_bounds() {
        assert_eq!(validate_zoom_level(MAX_ZOOM_LEVEL), Ok(MAX_ZOOM_LEVEL));
        assert_eq!(validate_zoom_level(-MAX_ZOOM_LEVEL), Ok(-MAX_ZOOM_LEVEL));
        assert_eq!(
            validate_zoom_level(MAX_ZOOM_LEVEL + 1),
            Err(ConfigError::InvalidZoomLevel(MAX_ZOOM_LEVEL + 1))
        );
        assert!(validate_zoom_level(i32::MIN).is_err());
    }

    #[test]
    fn zoom_past_deepest_level_is_rejected() {
        let vp = Viewport::default();
        let mut ctl =
            ViewportController::new(vp, surface(), AspectRatio::SIXTEEN_TEN, MAX_ZOOM_LEVEL);
        let c = ctl.surface().center();
        assert_eq!(
            ctl.zoom_in(c),
            Err(ConfigError::InvalidZoomLevel(MAX_ZOOM_LEVEL + 1))
        );
        assert_eq!(ctl.zoom_level(), MAX_ZOOM_LEVEL);
        assert_eq!(*ctl.viewport(), vp);
        ctl.zoom_out(c).unwrap();
        assert_eq!(ctl.zoom_level(), MAX_ZOOM_LEVEL - 1);
    }

    #[test]
    fn zoom_in_halves_extent_around_center() {
        let vp = Viewport::default();
        let s = surface();
        let center = PixelCoordinate::new(320, 200);
        let target = vp.pixel_to_plane(center, s);
        let next = pan_zoom(&vp, s, center, 0.5, 300).unwrap();
        assert!((next.range().real - vp.range().real / 2.0).abs() < EPSILON);
        assert!((next.range().imag - vp.range().imag / 2.0).abs() < EPSILON);
        assert!((next.center().real - target.real).abs() < EPSILON);
        assert!((next.center().imag - target.imag).abs() < EPSILON);
        assert_eq!(next.iterations(), 300);
    }

    #[test]
    fn zoom_then_inverse_restores_bounds() {
        let vp = Viewport::default();
        let s = surface();
        let c = s.center();
        let zoomed = pan_zoom(&vp, s, c, 0.5, 255).unwrap();
        let back = pan_zoom(&zoomed, s, c, 2.0, 255).unwrap();
        assert_close(&back, &vp);
    }

    #[test]
    fn pan_keeps_extent() {
        let vp = Viewport::default();
        let s = surface();
        let next = pan_zoom(&vp, s, PixelCoordinate::new(0, 0), 1.0, 255).unwrap();
        assert!((next.range().real - vp.range().real).abs() < EPSILON);
        assert!((next.center().real - vp.z_start().real).abs() < EPSILON);
        assert!((next.center().imag - vp.z_end().imag).abs() < EPSILON);
    }

    #[test]
    fn rejects_bad_zoom_factor() {
        let vp = Viewport::default();
        for f in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(pan_zoom(&vp, surface(), PixelCoordinate::new(1, 1), f, 255).is_err());
        }
    }

    #[test]
    fn change_aspect_keeps_imag_and_center() {
        let vp = Viewport::default();
        let next =
            change_aspect(&vp, AspectRatio::SIXTEEN_TEN, AspectRatio::FORTY_EIGHT_TEN).unwrap();
        assert_eq!(next.z_start().imag, vp.z_start().imag);
        assert_eq!(next.z_end().imag, vp.z_end().imag);
        // 3.0 / 10 · 48 = 14.4
        assert!((next.range().real - 14.4).abs() < EPSILON);
        assert!((next.center().real - vp.center().real).abs() < EPSILON);
    }

    #[test]
    fn controller_zoom_levels_track_budget() {
        let mut ctl = ViewportController::with_defaults(surface(), AspectRatio::SIXTEEN_TEN);
        let c = ctl.surface().center();
        ctl.zoom_in(c).unwrap();
        ctl.zoom_in(c).unwrap();
        assert_eq!(ctl.zoom_level(), 3);
        assert_eq!(ctl.viewport().iterations(), 255 + 3 * 32);
        ctl.wheel(c, 120.0).unwrap();
        assert_eq!(ctl.zoom_level(), 2);
        assert_eq!(ctl.viewport().iterations(), 319);
        ctl.reset();
        assert_eq!(ctl.zoom_level(), 1);
        assert_eq!(*ctl.viewport(), Viewport::default());
    }

    #[test]
    fn controller_rejects_without_partial_update() {
        let mut ctl = ViewportController::with_defaults(surface(), AspectRatio::SIXTEEN_TEN);
        let before = *ctl.viewport();
        assert!(ctl.pan_zoom(PixelCoordinate::new(5, 5), -2.0, 255).is_err());
        assert!(ctl.pan_zoom(PixelCoordinate::new(5, 5), 0.5, 0).is_err());
        assert!(ctl
            .change_aspect_or_resolution(AspectRatio { width: 0, height: 9 }, surface())
            .is_err());
        assert_eq!(*ctl.viewport(), before);
        assert_eq!(ctl.aspect(), AspectRatio::SIXTEEN_TEN);
    }

    #[test]
    fn apply_gesture_reset_and_pan_zoom() {
        let mut ctl = ViewportController::with_defaults(surface(), AspectRatio::SIXTEEN_TEN);
        let zoom = ViewportGesture {
            kind: GestureKind::PanZoom,
            center: PixelCoordinate::new(100, 100),
            factor: 0.25,
            iterations: 400,
        };
        let vp = *ctl.apply(&zoom).unwrap();
        assert_eq!(vp.iterations(), 400);
        assert!((vp.range().real - 4.8 / 4.0).abs() < EPSILON);

        let reset = ViewportGesture {
            kind: GestureKind::Reset,
            center: PixelCoordinate::new(0, 0),
            factor: 1.0,
            iterations: 255,
        };
        let vp = *ctl.apply(&reset).unwrap();
        assert_eq!(vp.z_start(), Complex::new(-3.0, -1.5));
        assert_eq!(ctl.zoom_level(), 1);
    }

    #[test]
    fn change_resolution_only() {
        let mut ctl = ViewportController::with_defaults(surface(), AspectRatio::SIXTEEN_TEN);
        let before = *ctl.viewport();
        let bigger = Surface::new(1920, 1200).unwrap();
        ctl.change_aspect_or_resolution(AspectRatio::SIXTEEN_TEN, bigger)
            .unwrap();
        assert_close(ctl.viewport(), &before);
        assert_eq!(ctl.surface(), bigger);
    }
}
