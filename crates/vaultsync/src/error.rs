//! Error types for vaultsync.

use thiserror::Error;
use vaultsync_core::CoreError;
use vaultsync_store::StoreError;
use vaultsync_sync::SyncError;

/// Errors that can occur during vaultsync operations.
#[derive(Debug, Error)]
pub enum VaultSyncError {
    /// Encoding or decoding error.
    #[error("codec error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// The supervisor task panicked or was aborted.
    #[error("supervisor task failed: {0}")]
    Supervisor(String),
}

/// Result type for vaultsync operations.
pub type Result<T> = std::result::Result<T, VaultSyncError>;
