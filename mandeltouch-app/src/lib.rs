pub mod cli;
pub mod error;
pub mod gesture;
pub mod gesture_driver;
pub mod render_worker;
pub mod session;
pub mod state;

pub use error::SessionError;
pub use gesture::{
    GestureClassifier, PointerEvent, PointerPhase, TouchEvent, TouchKind, THRESHOLD_MS,
};
pub use gesture_driver::GestureDriver;
pub use render_worker::{RenderRequest, RenderResponse, RenderWorker};
pub use session::Explorer;
pub use state::ViewState;
