//! Capability views over local and remote records.
//!
//! The reconciliation engine never looks at concrete record types. It reads
//! local records through [`LocalView`] and remote records through
//! [`RemoteView`], so any storage shape can be reconciled as long as it can
//! answer these questions.

use serde::{Deserialize, Serialize};

use crate::retry::ErrorState;
use crate::timestamp::{effective_date, Timestamp};
use crate::types::SchemaVersion;

/// The remote state a local record last observed during synchronization.
///
/// Present only after the local record has been linked to a remote entry
/// at least once. Persisted alongside the local record and must survive
/// restarts unchanged, since the engine's conflict detection compares
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteRef {
    /// Identifier of the linked remote entry.
    pub remote_id: String,
    /// Remote revision date at the last observation.
    pub revision_date: Timestamp,
    /// Remote deletion date at the last observation.
    pub deleted_date: Option<Timestamp>,
}

impl RemoteRef {
    /// Create a baseline for a live remote entry.
    pub fn new(remote_id: impl Into<String>, revision_date: Timestamp) -> Self {
        Self {
            remote_id: remote_id.into(),
            revision_date,
            deleted_date: None,
        }
    }

    /// Capture the current state of a remote record as a baseline.
    pub fn observe<R: RemoteView + ?Sized>(remote: &R) -> Self {
        Self {
            remote_id: remote.remote_id().to_owned(),
            revision_date: remote.revision_date(),
            deleted_date: remote.deleted_date(),
        }
    }

    /// Set the observed deletion date.
    pub fn deleted_at(mut self, deleted_date: Timestamp) -> Self {
        self.deleted_date = Some(deleted_date);
        self
    }

    /// Effective date of the baseline.
    pub fn effective_date(&self) -> Timestamp {
        effective_date(self.revision_date, self.deleted_date)
    }
}

/// Read access to a record as returned by a remote sync query.
pub trait RemoteView {
    /// Identifier, unique within one remote snapshot.
    fn remote_id(&self) -> &str;

    /// Remote modification time.
    fn revision_date(&self) -> Timestamp;

    /// Remote tombstone marker.
    fn deleted_date(&self) -> Option<Timestamp> {
        None
    }

    /// See [`effective_date`].
    fn effective_date(&self) -> Timestamp {
        effective_date(self.revision_date(), self.deleted_date())
    }
}

/// Read access to a record as stored locally.
pub trait LocalView {
    /// Stable local identifier.
    fn local_id(&self) -> &str;

    /// Last local modification time.
    fn revision_date(&self) -> Timestamp;

    /// Set when the user deleted the record locally.
    fn deleted_date(&self) -> Option<Timestamp> {
        None
    }

    /// Last-synced baseline, `None` for records never linked to remote.
    fn remote_ref(&self) -> Option<&RemoteRef>;

    /// Shape tag of the stored record.
    fn schema_version(&self) -> SchemaVersion;

    /// Outcome of the last failed push, if any.
    fn error_state(&self) -> Option<&ErrorState>;

    /// See [`effective_date`].
    fn effective_date(&self) -> Timestamp {
        effective_date(self.revision_date(), self.deleted_date())
    }

    /// Whether the record is a local tombstone.
    fn is_deleted(&self) -> bool {
        self.deleted_date().is_some()
    }
}
