//! Error types for the editor

use thiserror::Error;

pub use crate::ai::AiError;
pub use crate::mutations::MutationError;
pub use crate::storage::StorageError;
pub use crate::sync::SyncError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid import payload: {0}")]
    InvalidImport(String),
}

/// Errors surfaced by [`crate::SessionHandle`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("An AI request is already in flight")]
    AiBusy,

    #[error("No AI assistant is configured")]
    AiUnavailable,

    #[error("No draft mirror is configured")]
    MirrorUnavailable,

    #[error("Mirror error: {0}")]
    Mirror(#[from] SyncError),

    #[error("Session has shut down")]
    Closed,
}
