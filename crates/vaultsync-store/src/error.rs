//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] vaultsync_core::CoreError),

    /// Record not found.
    #[error("item not found: {0}")]
    NotFound(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store state poisoned")]
    Poisoned,

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
