//! Strong type definitions for vaultsync.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Integer tag of a record's on-disk shape.
pub type SchemaVersion = u32;

/// The newest record shape this build understands.
///
/// Linked records stored with an older version are force-pulled from
/// remote on the next pass so the local copy is rebuilt in this shape.
pub const CURRENT_SCHEMA_VERSION: SchemaVersion = 2;

/// Domain separator mixed into every payload fingerprint.
const FINGERPRINT_DOMAIN: &[u8] = b"vaultsync-payload-v1:";

/// A 32-byte content fingerprint, computed as Blake3(domain || payload).
///
/// Two payloads with the same bytes have the same fingerprint, so a
/// fingerprint comparison is a structural-equality check on content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Fingerprint a payload.
    pub fn of(payload: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN);
        hasher.update(payload);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a fingerprint from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidFingerprint(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidFingerprint(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = Fingerprint::of(b"secret note");
        let recovered = Fingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(fp, recovered);
    }

    #[test]
    fn test_fingerprint_from_hex_rejects_short_input() {
        let err = Fingerprint::from_hex("abcd").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFingerprint(_)));
    }

    #[test]
    fn test_fingerprint_distinguishes_payloads() {
        assert_eq!(Fingerprint::of(b"a"), Fingerprint::of(b"a"));
        assert_ne!(Fingerprint::of(b"a"), Fingerprint::of(b"b"));
    }

    #[test]
    fn test_fingerprint_is_domain_separated() {
        let raw = *blake3::hash(b"a").as_bytes();
        assert_ne!(Fingerprint::of(b"a").0, raw);
    }

    #[test]
    fn test_fingerprint_display() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", fp), "abababababababab");
        assert!(format!("{:?}", fp).starts_with("Fingerprint("));
    }
}
