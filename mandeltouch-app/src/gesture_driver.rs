use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::gesture::{GestureClassifier, PointerEvent, PointerPhase, TouchEvent};

enum DriverMessage {
    Pointer(PointerEvent),
    Shutdown,
}

/// Runs a [`GestureClassifier`] on its own thread with real-time timers.
///
/// Pointer events are stamped against the driver's clock on the calling
/// thread. Classified events are forwarded to the channel passed to
/// [`spawn`](Self::spawn). Dropping the driver cancels any pending timer and
/// joins the thread.
pub struct GestureDriver {
    epoch: Instant,
    tx: mpsc::Sender<DriverMessage>,
    handle: Option<JoinHandle<()>>,
}

impl GestureDriver {
    pub fn spawn(events: mpsc::Sender<TouchEvent>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<DriverMessage>();
        let epoch = Instant::now();

        let handle = std::thread::Builder::new()
            .name("gesture-driver".into())
            .spawn(move || drive(epoch, rx, events))?;

        Ok(Self {
            epoch,
            tx,
            handle: Some(handle),
        })
    }

    pub fn pointer_down(&self, x: f64, y: f64) {
        self.send(PointerPhase::Down, x, y);
    }

    pub fn pointer_up(&self, x: f64, y: f64) {
        self.send(PointerPhase::Up, x, y);
    }

    fn send(&self, phase: PointerPhase, x: f64, y: f64) {
        let event = PointerEvent {
            phase,
            x,
            y,
            timestamp_ms: elapsed_ms(self.epoch),
        };
        if self.tx.send(DriverMessage::Pointer(event)).is_err() {
            warn!("Gesture driver thread is gone; dropping pointer event");
        }
    }
}

impl Drop for GestureDriver {
    fn drop(&mut self) {
        let _ = self.tx.send(DriverMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Gesture driver thread panicked");
            }
        }
    }
}

fn elapsed_ms(epoch: Instant) -> u64 {
    epoch.elapsed().as_millis() as u64
}

fn drive(epoch: Instant, rx: mpsc::Receiver<DriverMessage>, events: mpsc::Sender<TouchEvent>) {
    debug!("Gesture driver thread started");
    let mut classifier = GestureClassifier::new();

    loop {
        let message = match classifier.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_sub(elapsed_ms(epoch));
                rx.recv_timeout(Duration::from_millis(wait))
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let emitted = match message {
            Ok(DriverMessage::Pointer(event)) => classifier.classify(event),
            Err(RecvTimeoutError::Timeout) => classifier.poll(elapsed_ms(epoch)),
            Ok(DriverMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        };

        if let Some(event) = emitted {
            if events.send(event).is_err() {
                break;
            }
        }
    }

    classifier.dispose();
    debug!("Gesture driver thread exiting");
}
