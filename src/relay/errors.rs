use thiserror::Error;

use crate::validation::TargetError;

/// Errors that can arise inside the relay core.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A command was issued without a usable target token.
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    /// Wrapper around IO errors (data directory, store files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The background save task is gone (runtime shutting down).
    #[error("persistence task stopped")]
    PersisterStopped,

    /// Internal error (task join errors, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
