//! Error types for vaultsync core.

use thiserror::Error;

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
