//! Pointer-event classification into single, double, and long taps.
//!
//! The classifier is a pure state machine over caller-supplied millisecond
//! timestamps. It owns one timer slot: arming a timer replaces whatever was
//! pending, so the most recently armed timer is the only one that can fire.
//! Hosts either call [`GestureClassifier::poll`] from their event loop or use
//! [`GestureDriver`](crate::gesture_driver::GestureDriver) for real time.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Delay separating a tap from a long tap, and a single tap from the first
/// half of a double tap.
pub const THRESHOLD_MS: u64 = 251;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Up,
}

/// A raw pointer event in surface offset coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            timestamp_ms,
        }
    }

    pub fn up(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchKind {
    SingleTap,
    DoubleTap,
    LongTap,
}

/// A classified gesture, located at the pointer-down that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub kind: TouchKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Active,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    LongTap,
    SingleTap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    kind: TimerKind,
    deadline_ms: u64,
}

/// Turns pointer down/up sequences into [`TouchEvent`]s.
///
/// Only one pointer is tracked: a down arriving while another pointer is
/// still in contact is ignored, and the gesture continues once the contact
/// count is back to zero.
#[derive(Debug)]
pub struct GestureClassifier {
    state: GestureState,
    timer: Option<Timer>,
    contacts: u32,
    origin: (f64, f64),
    disposed: bool,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            timer: None,
            contacts: 0,
            origin: (0.0, 0.0),
            disposed: false,
        }
    }

    /// Feed one pointer event.
    ///
    /// A timer due at or before `event.timestamp_ms` fires first, so a late
    /// event can never pre-empt a gesture that already completed. Returns
    /// at most one classified event.
    pub fn classify(&mut self, event: PointerEvent) -> Option<TouchEvent> {
        if self.disposed {
            return None;
        }
        let fired = self.poll(event.timestamp_ms);
        let applied = match event.phase {
            PointerPhase::Down => self.pointer_down(event),
            PointerPhase::Up => self.pointer_up(event),
        };
        fired.or(applied)
    }

    /// Fire the pending timer if its deadline is at or before `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<TouchEvent> {
        let timer = self.timer?;
        if now_ms < timer.deadline_ms {
            return None;
        }
        self.timer = None;
        if self.state != GestureState::Active {
            // Stale timer from a superseded transition.
            return None;
        }
        let kind = match timer.kind {
            TimerKind::LongTap => {
                self.state = GestureState::Done;
                TouchKind::LongTap
            }
            TimerKind::SingleTap => {
                self.state = GestureState::Idle;
                TouchKind::SingleTap
            }
        };
        Some(self.emit(kind))
    }

    /// Deadline of the pending timer, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timer.map(|t| t.deadline_ms)
    }

    /// Cancel the pending timer and stop accepting events.
    pub fn dispose(&mut self) {
        if self.timer.take().is_some() {
            debug!("Gesture timer cancelled on dispose");
        }
        self.state = GestureState::Idle;
        self.contacts = 0;
        self.disposed = true;
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    fn pointer_down(&mut self, event: PointerEvent) -> Option<TouchEvent> {
        if self.contacts > 0 {
            self.contacts = self.contacts.saturating_add(1);
            trace!(contacts = self.contacts, "Ignoring concurrent pointer");
            return None;
        }
        self.contacts = 1;
        self.origin = (event.x, event.y);

        match self.state {
            GestureState::Idle => {
                self.state = GestureState::Active;
                self.arm(TimerKind::LongTap, event.timestamp_ms);
                None
            }
            GestureState::Active => {
                self.timer = None;
                self.state = GestureState::Idle;
                Some(self.emit(TouchKind::DoubleTap))
            }
            GestureState::Done => None,
        }
    }

    fn pointer_up(&mut self, event: PointerEvent) -> Option<TouchEvent> {
        if self.contacts == 0 {
            return None;
        }
        self.contacts -= 1;
        if self.contacts > 0 {
            return None;
        }

        match self.state {
            GestureState::Active => {
                self.arm(TimerKind::SingleTap, event.timestamp_ms);
            }
            GestureState::Done => {
                self.state = GestureState::Idle;
            }
            GestureState::Idle => {}
        }
        None
    }

    fn arm(&mut self, kind: TimerKind, now_ms: u64) {
        self.timer = Some(Timer {
            kind,
            deadline_ms: now_ms.saturating_add(THRESHOLD_MS),
        });
    }

    fn emit(&self, kind: TouchKind) -> TouchEvent {
        let (x, y) = self.origin;
        debug!(?kind, x, y, "Gesture classified");
        TouchEvent { kind, x, y }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}
