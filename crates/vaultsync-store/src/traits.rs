//! LocalStore trait: the boundary to the local persistent store.
//!
//! vaultsync does not own durable storage. The application's store
//! implements this trait; the sync executor reads snapshots from it and
//! writes back the outcome of each pass.

use std::sync::Arc;

use async_trait::async_trait;
use vaultsync_core::{ErrorState, LocalView, Timestamp, VaultItem};

use crate::error::{Result, StoreError};

/// Async interface to the local vault store.
///
/// Implementations must persist each record's baseline (`remote_ref`),
/// `schema_version` and `error` exactly as written: the reconciliation
/// engine compares against them on every pass, including after a restart.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// All records, including local tombstones.
    async fn list_items(&self) -> Result<Vec<VaultItem>>;

    /// A record by local id.
    async fn get_item(&self, local_id: &str) -> Result<Option<VaultItem>>;

    /// Insert or replace a record.
    async fn put_item(&self, item: &VaultItem) -> Result<()>;

    /// Remove a record. Returns `false` if it did not exist.
    async fn delete_item(&self, local_id: &str) -> Result<bool>;
}

#[async_trait]
impl<S: LocalStore + ?Sized> LocalStore for Arc<S> {
    async fn list_items(&self) -> Result<Vec<VaultItem>> {
        (**self).list_items().await
    }

    async fn get_item(&self, local_id: &str) -> Result<Option<VaultItem>> {
        (**self).get_item(local_id).await
    }

    async fn put_item(&self, item: &VaultItem) -> Result<()> {
        (**self).put_item(item).await
    }

    async fn delete_item(&self, local_id: &str) -> Result<bool> {
        (**self).delete_item(local_id).await
    }
}

/// Extension trait for common store patterns.
pub trait LocalStoreExt: LocalStore {
    /// Record a failed push on the stored copy of `local_id`.
    ///
    /// The attempt counter is carried over while the record is unchanged
    /// since the previous failure.
    fn record_push_failure(
        &self,
        local_id: &str,
        code: u16,
        message: Option<String>,
        now: Timestamp,
    ) -> impl std::future::Future<Output = Result<VaultItem>> + Send;
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {
    async fn record_push_failure(
        &self,
        local_id: &str,
        code: u16,
        message: Option<String>,
        now: Timestamp,
    ) -> Result<VaultItem> {
        let mut item = self
            .get_item(local_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(local_id.to_owned()))?;

        let error = ErrorState::after_failure(
            item.error.as_ref(),
            code,
            message,
            item.effective_date(),
            now,
        );
        tracing::debug!(
            local_id,
            code,
            attempts = error.attempts,
            "recorded push failure"
        );
        item.error = Some(error);

        self.put_item(&item).await?;
        Ok(item)
    }
}
