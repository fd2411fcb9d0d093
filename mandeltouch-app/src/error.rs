use thiserror::Error;

use mandeltouch_core::ConfigError;

/// Why an explorer session could not start.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start render worker: {0}")]
    Worker(#[from] std::io::Error),
}
