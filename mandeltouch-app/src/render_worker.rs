use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use mandeltouch_core::{FractalMode, Surface, Viewport};
use mandeltouch_render::{render, RenderCancel, RenderResult};

/// One frame to render. `id` increases with every request; only the newest
/// id is worth displaying.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub id: u64,
    pub mode: FractalMode,
    pub viewport: Viewport,
    pub surface: Surface,
}

#[derive(Debug)]
pub struct RenderResponse {
    pub id: u64,
    pub result: RenderResult,
}

/// Background render thread with last-writer-wins supersession.
///
/// [`submit`](Self::submit) cancels whatever is in flight before queueing
/// the new request. The thread skips to the newest queued request and never
/// sends cancelled results, but a result that completed just before it was
/// superseded can still arrive; callers compare ids.
pub struct RenderWorker {
    tx: Option<mpsc::Sender<RenderRequest>>,
    rx: mpsc::Receiver<RenderResponse>,
    cancel: Arc<RenderCancel>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn() -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<RenderRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<RenderResponse>();
        let cancel = Arc::new(RenderCancel::new());

        let worker_cancel = Arc::clone(&cancel);
        let handle = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || render_loop(req_rx, resp_tx, worker_cancel))?;

        Ok(Self {
            tx: Some(req_tx),
            rx: resp_rx,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: RenderRequest) {
        self.cancel.cancel();
        debug!(id = request.id, "Submitting render request");
        let sent = self.tx.as_ref().map(|tx| tx.send(request).is_ok());
        if sent != Some(true) {
            warn!("Render worker is gone; request dropped");
        }
    }

    /// Abort the in-flight render, if any.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `(rows done, rows total)` of the current render.
    pub fn progress(&self) -> (usize, usize) {
        self.cancel.progress()
    }

    pub fn try_recv(&self) -> Option<RenderResponse> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<RenderResponse> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Closing the request channel ends the loop.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Render worker thread panicked");
            }
        }
    }
}

fn drain_latest(initial: RenderRequest, rx: &mpsc::Receiver<RenderRequest>) -> RenderRequest {
    let mut req = initial;
    while let Ok(newer) = rx.try_recv() {
        req = newer;
    }
    req
}

fn render_loop(
    rx: mpsc::Receiver<RenderRequest>,
    tx: mpsc::Sender<RenderResponse>,
    cancel: Arc<RenderCancel>,
) {
    debug!("Render worker thread started");
    while let Ok(initial) = rx.recv() {
        let req = drain_latest(initial, &rx);
        let result = render(req.mode, &req.viewport, req.surface, &cancel);
        if result.cancelled {
            debug!(id = req.id, "Render superseded");
            continue;
        }
        if tx.send(RenderResponse { id: req.id, result }).is_err() {
            break;
        }
    }
    debug!("Render worker thread exiting");
}
