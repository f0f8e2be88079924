//! Concrete vault records.
//!
//! [`VaultItem`] is a vault entry as stored locally, [`RemoteItem`] is the
//! same entry as returned by the remote service. Payloads are opaque bytes
//! (already encrypted by the time they reach this crate); the only thing
//! vaultsync does with them is fingerprint and carry them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::record::{LocalView, RemoteRef, RemoteView};
use crate::retry::ErrorState;
use crate::timestamp::Timestamp;
use crate::types::{Fingerprint, SchemaVersion, CURRENT_SCHEMA_VERSION};

/// A vault entry as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    /// Stable local identifier. Never changes.
    pub local_id: String,
    /// Last local modification time.
    pub revision_date: Timestamp,
    /// Local tombstone.
    pub deleted_date: Option<Timestamp>,
    /// Last-synced baseline.
    pub remote_ref: Option<RemoteRef>,
    /// Shape tag of this record.
    pub schema_version: SchemaVersion,
    /// Last push failure.
    pub error: Option<ErrorState>,
    /// Opaque record content.
    pub payload: Bytes,
}

impl VaultItem {
    /// Create a new, never-synced record in the current schema.
    pub fn new(local_id: impl Into<String>, payload: impl Into<Bytes>, revision_date: Timestamp) -> Self {
        Self {
            local_id: local_id.into(),
            revision_date,
            deleted_date: None,
            remote_ref: None,
            schema_version: CURRENT_SCHEMA_VERSION,
            error: None,
            payload: payload.into(),
        }
    }

    /// Build a local copy of a remote record, linked to it.
    pub fn from_remote(local_id: impl Into<String>, remote: &RemoteItem) -> Self {
        Self {
            local_id: local_id.into(),
            revision_date: remote.revision_date,
            deleted_date: remote.deleted_date,
            remote_ref: Some(RemoteRef::observe(remote)),
            schema_version: CURRENT_SCHEMA_VERSION,
            error: None,
            payload: remote.payload.clone(),
        }
    }

    /// Set the baseline.
    pub fn linked(mut self, remote_ref: RemoteRef) -> Self {
        self.remote_ref = Some(remote_ref);
        self
    }

    /// Set the local tombstone.
    pub fn deleted_at(mut self, deleted_date: Timestamp) -> Self {
        self.deleted_date = Some(deleted_date);
        self
    }

    /// Set the schema version.
    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    /// Set the push failure state.
    pub fn with_error(mut self, error: ErrorState) -> Self {
        self.error = Some(error);
        self
    }

    /// Replace the content as a local edit made at `at`.
    pub fn edit(&mut self, payload: impl Into<Bytes>, at: Timestamp) {
        self.payload = payload.into();
        self.revision_date = at;
    }

    /// Mark the record deleted locally at `at`.
    pub fn delete(&mut self, at: Timestamp) {
        self.deleted_date = Some(at);
    }

    /// Overwrite this record with the remote state and refresh its baseline.
    ///
    /// The result is in the current schema and carries no error state.
    pub fn adopt_remote(&mut self, remote: &RemoteItem) {
        self.revision_date = remote.revision_date;
        self.deleted_date = remote.deleted_date;
        self.remote_ref = Some(RemoteRef::observe(remote));
        self.schema_version = CURRENT_SCHEMA_VERSION;
        self.error = None;
        self.payload = remote.payload.clone();
    }

    /// Fingerprint of the payload.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.payload)
    }
}

impl LocalView for VaultItem {
    fn local_id(&self) -> &str {
        &self.local_id
    }

    fn revision_date(&self) -> Timestamp {
        self.revision_date
    }

    fn deleted_date(&self) -> Option<Timestamp> {
        self.deleted_date
    }

    fn remote_ref(&self) -> Option<&RemoteRef> {
        self.remote_ref.as_ref()
    }

    fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    fn error_state(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }
}

/// A vault entry as returned by a remote sync query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Identifier assigned by the remote service.
    pub remote_id: String,
    /// Remote modification time.
    pub revision_date: Timestamp,
    /// Remote tombstone.
    pub deleted_date: Option<Timestamp>,
    /// Opaque record content.
    pub payload: Bytes,
}

impl RemoteItem {
    /// Create a live remote record.
    pub fn new(remote_id: impl Into<String>, payload: impl Into<Bytes>, revision_date: Timestamp) -> Self {
        Self {
            remote_id: remote_id.into(),
            revision_date,
            deleted_date: None,
            payload: payload.into(),
        }
    }

    /// Set the remote tombstone.
    pub fn deleted_at(mut self, deleted_date: Timestamp) -> Self {
        self.deleted_date = Some(deleted_date);
        self
    }

    /// Fingerprint of the payload.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.payload)
    }
}

impl RemoteView for RemoteItem {
    fn remote_id(&self) -> &str {
        &self.remote_id
    }

    fn revision_date(&self) -> Timestamp {
        self.revision_date
    }

    fn deleted_date(&self) -> Option<Timestamp> {
        self.deleted_date
    }
}

/// Default content comparison: do the payload fingerprints differ?
pub fn payload_differs(local: &VaultItem, remote: &RemoteItem) -> bool {
    local.fingerprint() != remote.fingerprint()
}
