//! Error types for the sync module.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors that abort a sync pass.
///
/// Failures of individual pushes are not errors: they are recorded on the
/// affected record and reported in the [`SyncReport`](crate::SyncReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store operation failed.
    #[error("store error: {0}")]
    Store(#[from] vaultsync_store::StoreError),

    /// Remote service failed outside of a per-record operation.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
