//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted while loading the catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("catalog source unavailable: {0}")]
    Source(#[from] StorageError),
    #[error("catalog is inconsistent: {0}")]
    Invalid(#[from] course_core::Error),
}

/// Errors emitted by `PersistenceSynchronizer` operations that report back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors reported by a playback-control capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackControlError {
    #[error("no player is attached")]
    Unavailable,
    #[error("player failed to {operation}: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },
}
