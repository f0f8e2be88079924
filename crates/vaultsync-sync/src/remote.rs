//! Remote service abstraction.
//!
//! The remote service is the authority for remote ids and remote revision
//! dates. Implementations may use HTTP or anything else; vaultsync only
//! needs a full snapshot and per-record writes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use vaultsync_core::{RemoteItem, VaultItem};

/// A failed remote call, carrying the service's status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote returned {code}: {message}")]
pub struct RemoteError {
    /// HTTP-like status code.
    pub code: u16,
    /// Human-readable detail.
    pub message: String,
}

impl RemoteError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(remote_id: &str) -> Self {
        Self::new(404, format!("no remote entry {remote_id}"))
    }

    /// Whether the entry addressed by the call does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// The remote vault service.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Every record visible to the session, tombstones included.
    async fn fetch_all(&self) -> Result<Vec<RemoteItem>>;

    /// Create a remote entry from a local record.
    ///
    /// Returns the entry as stored, with its assigned id and revision date.
    async fn create(&self, item: &VaultItem) -> Result<RemoteItem>;

    /// Overwrite the remote entry `remote_id` with a local record.
    async fn update(&self, remote_id: &str, item: &VaultItem) -> Result<RemoteItem>;

    /// Delete the remote entry `remote_id`.
    async fn delete(&self, remote_id: &str) -> Result<()>;
}

#[async_trait]
impl<R: RemoteService + ?Sized> RemoteService for Arc<R> {
    async fn fetch_all(&self) -> Result<Vec<RemoteItem>> {
        (**self).fetch_all().await
    }

    async fn create(&self, item: &VaultItem) -> Result<RemoteItem> {
        (**self).create(item).await
    }

    async fn update(&self, remote_id: &str, item: &VaultItem) -> Result<RemoteItem> {
        (**self).update(remote_id, item).await
    }

    async fn delete(&self, remote_id: &str) -> Result<()> {
        (**self).delete(remote_id).await
    }
}

/// A simple in-memory remote for testing.
///
/// Revision dates come from a logical clock that advances one second per
/// write, so consecutive writes never share a comparison bucket.
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    use bytes::Bytes;
    use vaultsync_core::Timestamp;

    const TICK: Duration = Duration::from_secs(1);

    struct State {
        items: BTreeMap<String, RemoteItem>,
        next_id: u64,
        clock: Timestamp,
        failures: VecDeque<u16>,
        writes: usize,
    }

    impl State {
        fn tick(&mut self) -> Timestamp {
            self.clock = self.clock.saturating_add(TICK);
            self.clock
        }

        fn take_failure(&mut self) -> Result<()> {
            match self.failures.pop_front() {
                Some(code) => Err(RemoteError::new(code, "injected failure")),
                None => Ok(()),
            }
        }
    }

    /// In-memory remote service.
    pub struct MemoryRemote {
        state: Mutex<State>,
    }

    impl MemoryRemote {
        /// Create an empty remote whose clock starts at the current time.
        pub fn new() -> Self {
            Self::starting_at(Timestamp::now())
        }

        /// Create an empty remote whose clock starts at `clock`.
        pub fn starting_at(clock: Timestamp) -> Self {
            Self {
                state: Mutex::new(State {
                    items: BTreeMap::new(),
                    next_id: 1,
                    clock,
                    failures: VecDeque::new(),
                    writes: 0,
                }),
            }
        }

        fn lock(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Make the next write call (create, update or delete) fail with
        /// `code`. Calls queue up.
        pub fn fail_next(&self, code: u16) {
            self.lock().failures.push_back(code);
        }

        /// Current state of all entries, ordered by remote id.
        pub fn items(&self) -> Vec<RemoteItem> {
            self.lock().items.values().cloned().collect()
        }

        /// An entry by id.
        pub fn get(&self, remote_id: &str) -> Option<RemoteItem> {
            self.lock().items.get(remote_id).cloned()
        }

        /// Number of entries, tombstones included.
        pub fn len(&self) -> usize {
            self.lock().items.len()
        }

        /// Whether the remote holds no entries.
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Successful write calls made through [`RemoteService`].
        pub fn write_count(&self) -> usize {
            self.lock().writes
        }

        /// Current logical time.
        pub fn clock(&self) -> Timestamp {
            self.lock().clock
        }

        /// Create an entry as another client would.
        pub fn insert_external(&self, payload: impl Into<Bytes>) -> RemoteItem {
            let mut state = self.lock();
            let remote_id = format!("r-{}", state.next_id);
            state.next_id += 1;
            let item = RemoteItem::new(remote_id.clone(), payload, state.tick());
            state.items.insert(remote_id, item.clone());
            item
        }

        /// Edit an entry as another client would.
        pub fn edit_external(&self, remote_id: &str, payload: impl Into<Bytes>) -> Option<RemoteItem> {
            let mut state = self.lock();
            let now = state.tick();
            let item = state.items.get_mut(remote_id)?;
            item.payload = payload.into();
            item.revision_date = now;
            Some(item.clone())
        }

        /// Move an entry to the trash as another client would.
        pub fn trash_external(&self, remote_id: &str) -> Option<RemoteItem> {
            let mut state = self.lock();
            let now = state.tick();
            let item = state.items.get_mut(remote_id)?;
            item.deleted_date = Some(now);
            Some(item.clone())
        }

        /// Purge an entry as another client would.
        pub fn remove_external(&self, remote_id: &str) -> Option<RemoteItem> {
            self.lock().items.remove(remote_id)
        }
    }

    impl Default for MemoryRemote {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl RemoteService for MemoryRemote {
        async fn fetch_all(&self) -> Result<Vec<RemoteItem>> {
            Ok(self.items())
        }

        async fn create(&self, item: &VaultItem) -> Result<RemoteItem> {
            let mut state = self.lock();
            state.take_failure()?;

            let remote_id = format!("r-{}", state.next_id);
            state.next_id += 1;
            let created = RemoteItem {
                remote_id: remote_id.clone(),
                revision_date: state.tick(),
                deleted_date: None,
                payload: item.payload.clone(),
            };
            state.items.insert(remote_id, created.clone());
            state.writes += 1;
            Ok(created)
        }

        async fn update(&self, remote_id: &str, item: &VaultItem) -> Result<RemoteItem> {
            let mut state = self.lock();
            state.take_failure()?;

            let now = state.tick();
            let entry = state
                .items
                .get_mut(remote_id)
                .ok_or_else(|| RemoteError::not_found(remote_id))?;
            entry.payload = item.payload.clone();
            entry.revision_date = now;
            entry.deleted_date = None;
            let updated = entry.clone();
            state.writes += 1;
            Ok(updated)
        }

        async fn delete(&self, remote_id: &str) -> Result<()> {
            let mut state = self.lock();
            state.take_failure()?;

            state
                .items
                .remove(remote_id)
                .ok_or_else(|| RemoteError::not_found(remote_id))?;
            state.writes += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryRemote;
    use super::*;
    use vaultsync_core::Timestamp;

    #[tokio::test]
    async fn test_create_assigns_id_and_revision() {
        let remote = MemoryRemote::starting_at(Timestamp::from_millis(0));
        let item = VaultItem::new("l-1", &b"secret"[..], Timestamp::from_millis(5));

        let created = remote.create(&item).await.unwrap();
        assert_eq!(created.remote_id, "r-1");
        assert_eq!(created.revision_date, Timestamp::from_millis(1_000));
        assert_eq!(created.payload, item.payload);
        assert_eq!(remote.fetch_all().await.unwrap(), vec![created]);
        assert_eq!(remote.write_count(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_entry() {
        let remote = MemoryRemote::new();
        let item = VaultItem::new("l-1", &b""[..], Timestamp::from_millis(0));

        assert!(remote.update("nope", &item).await.unwrap_err().is_not_found());
        assert!(remote.delete("nope").await.unwrap_err().is_not_found());
        assert_eq!(remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let remote = MemoryRemote::new();
        let item = VaultItem::new("l-1", &b""[..], Timestamp::from_millis(0));
        remote.fail_next(503);

        let err = remote.create(&item).await.unwrap_err();
        assert_eq!(err.code, 503);
        assert!(remote.is_empty());

        remote.create(&item).await.unwrap();
        assert_eq!(remote.len(), 1);
    }

    #[tokio::test]
    async fn test_external_edits_advance_clock() {
        let remote = MemoryRemote::starting_at(Timestamp::from_millis(0));
        let created = remote.insert_external(&b"a"[..]);
        let edited = remote.edit_external(&created.remote_id, &b"b"[..]).unwrap();
        let trashed = remote.trash_external(&created.remote_id).unwrap();

        assert!(edited.revision_date > created.revision_date);
        assert_eq!(trashed.deleted_date, Some(remote.clock()));
        assert!(remote.edit_external("missing", &b""[..]).is_none());

        remote.remove_external(&created.remote_id);
        assert!(remote.get(&created.remote_id).is_none());
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let remote: Arc<dyn RemoteService> = Arc::new(MemoryRemote::new());
        let item = VaultItem::new("l-1", &b""[..], Timestamp::from_millis(0));

        let created = remote.create(&item).await.unwrap();
        remote.delete(&created.remote_id).await.unwrap();
        assert!(remote.fetch_all().await.unwrap().is_empty());
    }
}
