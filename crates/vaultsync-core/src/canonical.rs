//! CBOR encoding of persisted records.
//!
//! The local store keeps each [`VaultItem`] together with its sync
//! bookkeeping (baseline, schema version, error state). This module defines
//! the byte form of that record so the bookkeeping survives restarts exactly
//! as it was last written.
//!
//! Encoding goes through `serde`, so fields are always emitted in
//! declaration order and the same record always produces the same bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::item::VaultItem;
use crate::types::CURRENT_SCHEMA_VERSION;

/// Encode any serializable value to CBOR.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Encode a vault record for persistence.
pub fn encode_item(item: &VaultItem) -> Result<Vec<u8>> {
    to_cbor(item)
}

/// Decode a persisted vault record.
///
/// Records written by a newer build are rejected rather than silently
/// truncated. Older records decode fine; the engine will force-pull them.
pub fn decode_item(bytes: &[u8]) -> Result<VaultItem> {
    let item: VaultItem = from_cbor(bytes)?;
    if item.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchema(item.schema_version));
    }
    Ok(item)
}

/// Encode a batch of records.
pub fn encode_items(items: &[VaultItem]) -> Result<Vec<u8>> {
    to_cbor(items)
}

/// Decode a batch of records.
pub fn decode_items(bytes: &[u8]) -> Result<Vec<VaultItem>> {
    let items: Vec<VaultItem> = from_cbor(bytes)?;
    if let Some(newer) = items.iter().find(|i| i.schema_version > CURRENT_SCHEMA_VERSION) {
        return Err(CoreError::UnsupportedSchema(newer.schema_version));
    }
    Ok(items)
}
