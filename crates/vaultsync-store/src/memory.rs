//! In-memory implementation of the LocalStore trait.
//!
//! Records are kept in their encoded (CBOR) form, the same bytes a durable
//! store would write, so tests exercise the persisted shape. Snapshots can
//! be exported and restored to simulate a process restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use vaultsync_core::{decode_item, decode_items, encode_item, encode_items, VaultItem};

use crate::error::{Result, StoreError};
use crate::traits::LocalStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Records are listed in `local_id` order.
pub struct MemoryLocalStore {
    inner: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLocalStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store holding the given records.
    pub fn with_items(items: impl IntoIterator<Item = VaultItem>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for item in items {
            map.insert(item.local_id.clone(), encode_item(&item)?);
        }
        Ok(Self {
            inner: RwLock::new(map),
        })
    }

    /// Number of records, tombstones included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Encode every record into a single snapshot blob.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let items = inner
            .values()
            .map(|bytes| decode_item(bytes))
            .collect::<vaultsync_core::Result<Vec<_>>>()?;
        Ok(encode_items(&items)?)
    }

    /// Rebuild a store from a snapshot produced by [`export_snapshot`].
    ///
    /// [`export_snapshot`]: MemoryLocalStore::export_snapshot
    pub fn restore_snapshot(snapshot: &[u8]) -> Result<Self> {
        let items = decode_items(snapshot)?;
        tracing::debug!(count = items.len(), "restored local snapshot");
        Self::with_items(items)
    }
}

impl Default for MemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn list_items(&self) -> Result<Vec<VaultItem>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut items = Vec::with_capacity(inner.len());
        for bytes in inner.values() {
            items.push(decode_item(bytes)?);
        }
        Ok(items)
    }

    async fn get_item(&self, local_id: &str) -> Result<Option<VaultItem>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        match inner.get(local_id) {
            Some(bytes) => Ok(Some(decode_item(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, item: &VaultItem) -> Result<()> {
        let bytes = encode_item(item)?;
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        inner.insert(item.local_id.clone(), bytes);
        Ok(())
    }

    async fn delete_item(&self, local_id: &str) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.remove(local_id).is_some())
    }
}
