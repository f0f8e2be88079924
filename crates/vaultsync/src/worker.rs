//! Periodic sync worker.
//!
//! [`SyncWorker`] is the [`SyncCapability`] handed to the supervisor for a
//! session: it runs a pass immediately, then one every interval plus a
//! random jitter, until cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use vaultsync_store::LocalStore;
use vaultsync_sync::{RemoteService, SyncSession};

use crate::session::{CapabilityHandle, SyncCapability};

/// Runs sync passes for one session until cancelled.
pub struct SyncWorker<S: LocalStore, R: RemoteService> {
    session: SyncSession<S, R>,
    passes: AtomicU64,
}

impl<S: LocalStore, R: RemoteService> SyncWorker<S, R> {
    pub fn new(session: SyncSession<S, R>) -> Self {
        Self {
            session,
            passes: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &SyncSession<S, R> {
        &self.session
    }

    /// Number of passes completed, successful or not.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    fn next_delay(&self) -> Duration {
        let config = self.session.config();
        let jitter_ms = u64::try_from(config.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return config.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        config.interval.saturating_add(Duration::from_millis(extra))
    }
}

impl<S, R> SyncWorker<S, R>
where
    S: LocalStore + 'static,
    R: RemoteService + 'static,
{
    /// Wrap into a capability handle for a [`SessionHandle`](crate::SessionHandle).
    pub fn into_capability(self) -> CapabilityHandle {
        CapabilityHandle::new(self)
    }
}

#[async_trait]
impl<S: LocalStore, R: RemoteService> SyncCapability for SyncWorker<S, R> {
    async fn run(&self, cancel: CancellationToken) {
        tracing::debug!("sync worker started");
        loop {
            match cancel.run_until_cancelled(self.session.run_pass()).await {
                None => break,
                Some(Ok(report)) => {
                    tracing::debug!(planned = %report.planned, failed = report.failures.len(), "sync pass finished");
                }
                Some(Err(e)) => tracing::warn!(error = %e, "sync pass failed"),
            }
            self.passes.fetch_add(1, Ordering::Relaxed);

            let delay = self.next_delay();
            if cancel.run_until_cancelled(tokio::time::sleep(delay)).await.is_none() {
                break;
            }
        }
        tracing::debug!("sync worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vaultsync_core::{Timestamp, VaultItem};
    use vaultsync_store::MemoryLocalStore;
    use vaultsync_sync::{MemoryRemote, SyncConfig};

    fn worker(config: SyncConfig) -> SyncWorker<Arc<MemoryLocalStore>, Arc<MemoryRemote>> {
        let store = Arc::new(
            MemoryLocalStore::with_items(vec![VaultItem::new("l", &b"a"[..], Timestamp::from_millis(0))]).unwrap(),
        );
        SyncWorker::new(SyncSession::new(store, Arc::new(MemoryRemote::new()), config))
    }

    #[test]
    fn test_delay_within_jitter() {
        let config = SyncConfig::default()
            .with_interval(Duration::from_secs(10))
            .with_jitter(Duration::from_secs(2));
        let worker = worker(config);

        for _ in 0..50 {
            let delay = worker.next_delay();
            assert!(delay >= Duration::from_secs(10));
            assert!(delay <= Duration::from_secs(12));
        }
    }

    #[tokio::test]
    async fn test_runs_passes_until_cancelled() {
        let config = SyncConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_jitter(Duration::ZERO);
        let worker = Arc::new(worker(config));
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let worker = Arc::clone(&worker);
            let cancel = cancel.clone();
            async move { worker.run(cancel).await }
        });

        while worker.passes() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(worker.session().remote().len(), 1);
        assert_eq!(worker.session().remote().write_count(), 1);
    }
}
