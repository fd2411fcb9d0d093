use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use mandeltouch_core::{
    AspectRatio, FractalMode, PixelCoordinate, Resolution, Surface, Viewport, ViewportController,
    ViewportGesture,
};
use mandeltouch_render::{ColorMapConfig, ColorTable, EscapeBuffer, RenderBuffer};

use crate::error::SessionError;
use crate::gesture::{TouchEvent, TouchKind};
use crate::render_worker::{RenderRequest, RenderWorker};
use crate::state::ViewState;

/// The live state of one explorer view.
///
/// Owns the viewport controller, the active color table, and a background
/// render worker. Every navigation method replaces the viewport and queues a
/// render; [`poll_frame`](Self::poll_frame) hands back the newest finished
/// frame and drops stale ones.
pub struct Explorer {
    controller: ViewportController,
    mode: FractalMode,
    color_map: ColorMapConfig,
    table: ColorTable,
    worker: RenderWorker,
    render_id: u64,
    escapes: Option<EscapeBuffer>,
}

impl Explorer {
    /// Build a session from a persisted record. The record is validated
    /// again here; an invalid one is replaced by the default view for
    /// `aspect`.
    pub fn new(
        state: ViewState,
        aspect: AspectRatio,
        resolution: Resolution,
    ) -> Result<Self, SessionError> {
        let surface = resolution.surface(aspect)?;
        let resolved = state
            .validate()
            .and_then(|()| Ok((state.viewport()?, ColorTable::build(&state.color_map)?)));
        let (state, viewport, table) = match resolved {
            Ok((viewport, table)) => (state, viewport, table),
            Err(e) => {
                warn!("Invalid view state ({e}); using defaults");
                (
                    ViewState::default_for(aspect),
                    Viewport::default_for(aspect),
                    ColorTable::default(),
                )
            }
        };

        info!(
            width = surface.width(),
            height = surface.height(),
            zoom_level = state.zoom_level,
            mode = state.mode.label(),
            "Explorer session created"
        );

        Ok(Self {
            controller: ViewportController::new(viewport, surface, aspect, state.zoom_level),
            mode: state.mode,
            color_map: state.color_map,
            table,
            worker: RenderWorker::spawn()?,
            render_id: 0,
            escapes: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn surface(&self) -> Surface {
        self.controller.surface()
    }

    pub fn zoom_level(&self) -> i32 {
        self.controller.zoom_level()
    }

    pub fn mode(&self) -> FractalMode {
        self.mode
    }

    pub fn color_table(&self) -> &ColorTable {
        &self.table
    }

    pub fn color_offset(&self) -> i64 {
        self.color_map.offset
    }

    /// Snapshot for persistence.
    pub fn state(&self) -> ViewState {
        ViewState::capture(
            self.viewport(),
            self.zoom_level(),
            self.mode,
            self.color_map.clone(),
        )
    }

    // -- Navigation --

    /// Apply a classified touch: single tap pans, double tap zooms in,
    /// long tap zooms out, each at the touch point.
    pub fn handle_touch(&mut self, event: TouchEvent) -> mandeltouch_core::Result<()> {
        let center = self.to_pixel(event.x, event.y);
        match event.kind {
            TouchKind::SingleTap => self.controller.pan(center)?,
            TouchKind::DoubleTap => self.controller.zoom_in(center)?,
            TouchKind::LongTap => self.controller.zoom_out(center)?,
        };
        self.request_render();
        Ok(())
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> mandeltouch_core::Result<()> {
        let center = self.to_pixel(x, y);
        self.controller.wheel(center, delta_y)?;
        self.request_render();
        Ok(())
    }

    pub fn apply(&mut self, gesture: &ViewportGesture) -> mandeltouch_core::Result<()> {
        self.controller.apply(gesture)?;
        self.request_render();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.controller.reset();
        self.request_render();
    }

    pub fn change_aspect_or_resolution(
        &mut self,
        aspect: AspectRatio,
        resolution: Resolution,
    ) -> mandeltouch_core::Result<()> {
        self.controller
            .change_aspect_or_resolution(aspect, resolution.surface(aspect)?)?;
        self.escapes = None;
        self.request_render();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: FractalMode) {
        if mode != self.mode {
            self.mode = mode;
            self.request_render();
        }
    }

    // -- Coloring --

    /// Install a new color map. The current table is kept if it is invalid.
    /// No re-render is needed; the next frame is recolored.
    pub fn set_color_map(&mut self, config: ColorMapConfig) -> mandeltouch_core::Result<()> {
        self.table = ColorTable::build(&config)?;
        self.color_map = config;
        Ok(())
    }

    /// Advance the color offset by `step` entries.
    pub fn cycle_colors(&mut self, step: i64) {
        self.color_map.offset = self.color_map.offset.wrapping_add(step);
    }

    // -- Rendering --

    /// Queue a render of the current view, superseding any in flight.
    pub fn request_render(&mut self) -> u64 {
        self.render_id += 1;
        self.worker.submit(RenderRequest {
            id: self.render_id,
            mode: self.mode,
            viewport: *self.controller.viewport(),
            surface: self.controller.surface(),
        });
        self.render_id
    }

    /// Take any finished renders. Returns the colored frame if the newest
    /// request completed.
    pub fn poll_frame(&mut self) -> Option<RenderBuffer> {
        let mut accepted = false;
        while let Some(resp) = self.worker.try_recv() {
            accepted |= self.accept(resp.id, resp.result.escapes, resp.result.cancelled);
        }
        if accepted {
            self.frame()
        } else {
            None
        }
    }

    /// Block until the newest request completes or `timeout` passes.
    pub fn wait_for_frame(&mut self, timeout: Duration) -> Option<RenderBuffer> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let resp = self.worker.recv_timeout(remaining)?;
            if self.accept(resp.id, resp.result.escapes, resp.result.cancelled) {
                return self.frame();
            }
        }
    }

    /// The last accepted frame colored with the current table and offset.
    pub fn frame(&self) -> Option<RenderBuffer> {
        self.escapes
            .as_ref()
            .map(|e| self.table.colorize(e, self.color_map.offset))
    }

    pub fn render_progress(&self) -> (usize, usize) {
        self.worker.progress()
    }

    fn accept(&mut self, id: u64, escapes: EscapeBuffer, cancelled: bool) -> bool {
        if id != self.render_id || cancelled {
            debug!(id, current = self.render_id, "Discarding stale render");
            return false;
        }
        self.escapes = Some(escapes);
        true
    }

    fn to_pixel(&self, x: f64, y: f64) -> PixelCoordinate {
        let surface = self.controller.surface();
        let clamp = |v: f64, len: u32| {
            if v.is_finite() {
                v.floor().clamp(0.0, (len - 1) as f64) as u32
            } else {
                len / 2
            }
        };
        PixelCoordinate::new(clamp(x, surface.width()), clamp(y, surface.height()))
    }
}
