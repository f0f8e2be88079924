//! Sync pass executor.
//!
//! A pass reads both snapshots, asks the engine for a plan, and applies it:
//! remote writes go through [`RemoteService`], local writes through
//! [`LocalStore`]. Store errors abort the pass. A failed push is recorded on
//! the record and the pass moves on.

use std::time::Duration;

use vaultsync_core::{
    payload_differs, BackoffPolicy, RemoteItem, RemoteRef, Timestamp, VaultItem,
};
use vaultsync_store::{LocalStore, LocalStoreExt};

use crate::error::Result;
use crate::plan::PlanSummary;
use crate::reconcile::{ReconcileConfig, Reconciler};
use crate::remote::{RemoteError, RemoteService};

/// Prefix of local ids assigned to records first seen on remote.
pub const IMPORTED_ID_PREFIX: &str = "remote:";

/// Configuration for sync behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Engine configuration.
    pub reconcile: ReconcileConfig,
    /// Time between periodic passes.
    pub interval: Duration,
    /// Upper bound of the random delay added to each interval.
    pub jitter: Duration,
    /// Backoff after the first failed push of a record.
    pub retry_initial_delay: Duration,
    /// Upper bound on the backoff.
    pub retry_max_delay: Duration,
    /// Backoff growth per consecutive failure.
    pub retry_multiplier: u32,
}

impl SyncConfig {
    /// The retry policy for a pass running at `now`.
    pub fn backoff_at(&self, now: Timestamp) -> BackoffPolicy {
        BackoffPolicy::at(now)
            .with_initial_delay(self.retry_initial_delay)
            .with_max_delay(self.retry_max_delay)
            .with_multiplier(self.retry_multiplier)
    }

    /// Sets the interval between periodic passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the maximum jitter.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconcile: ReconcileConfig::default(),
            interval: Duration::from_secs(5 * 60),
            jitter: Duration::from_secs(30),
            retry_initial_delay: Duration::from_secs(30),
            retry_max_delay: Duration::from_secs(60 * 60),
            retry_multiplier: 2,
        }
    }
}

/// A push or remote delete that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub local_id: String,
    pub code: u16,
    pub message: String,
}

/// Result of a sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// What the engine asked for.
    pub planned: PlanSummary,
    /// Local records created or overwritten from remote.
    pub pulled: usize,
    /// Records created or updated on remote.
    pub pushed: usize,
    /// Local records removed.
    pub deleted_local: usize,
    /// Local tombstones propagated to remote.
    pub deleted_remote: usize,
    /// Remote writes that failed.
    pub failures: Vec<PushFailure>,
}

impl SyncReport {
    /// Whether the pass found both sides already consistent.
    pub fn is_noop(&self) -> bool {
        self.planned == PlanSummary::default()
    }

    /// Number of plan entries applied successfully.
    pub fn applied(&self) -> usize {
        self.pulled + self.pushed + self.deleted_local + self.deleted_remote
    }
}

/// Local id for a record first seen on remote.
pub fn imported_local_id(remote: &RemoteItem) -> String {
    format!("{IMPORTED_ID_PREFIX}{}", remote.remote_id)
}

/// Executes sync passes between a local store and a remote service.
pub struct SyncSession<S: LocalStore, R: RemoteService> {
    store: S,
    remote: R,
    config: SyncConfig,
}

impl<S: LocalStore, R: RemoteService> SyncSession<S, R> {
    /// Create a new sync session.
    pub fn new(store: S, remote: R, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one pass at the current time.
    pub async fn run_pass(&self) -> Result<SyncReport> {
        self.run_pass_at(Timestamp::now()).await
    }

    /// Run one pass, evaluating retry eligibility at `now`.
    pub async fn run_pass_at(&self, now: Timestamp) -> Result<SyncReport> {
        let local_items = self.store.list_items().await?;
        let remote_items = self.remote.fetch_all().await?;

        let reconciler = Reconciler::new(self.config.reconcile, self.config.backoff_at(now));
        let plan = reconciler.reconcile(&local_items, &remote_items, payload_differs);

        let mut report = SyncReport {
            planned: plan.summary(),
            ..SyncReport::default()
        };

        for &(local, remote) in &plan.remote_deletes {
            match self.remote.delete(&remote.remote_id).await {
                Ok(()) => {}
                // Already gone: the local tombstone is all that is left.
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    self.record_failure(local, e, now, &mut report).await?;
                    continue;
                }
            }
            self.store.delete_item(&local.local_id).await?;
            report.deleted_remote += 1;
        }

        for &(local, _) in &plan.local_deletes {
            self.store.delete_item(&local.local_id).await?;
            report.deleted_local += 1;
        }

        for &(local, remote) in &plan.remote_puts {
            let result = match remote {
                Some(remote) => self.remote.update(&remote.remote_id, local).await,
                None => self.remote.create(local).await,
            };
            match result {
                Ok(stored) => {
                    let mut item = local.clone();
                    item.revision_date = stored.revision_date;
                    item.deleted_date = stored.deleted_date;
                    item.remote_ref = Some(RemoteRef::observe(&stored));
                    item.error = None;
                    self.store.put_item(&item).await?;
                    report.pushed += 1;
                }
                Err(e) => self.record_failure(local, e, now, &mut report).await?,
            }
        }

        for &(local, remote) in &plan.local_puts {
            let item = match local {
                Some(local) => {
                    let mut item = local.clone();
                    item.adopt_remote(remote);
                    item
                }
                None => VaultItem::from_remote(imported_local_id(remote), remote),
            };
            self.store.put_item(&item).await?;
            report.pulled += 1;
        }

        tracing::debug!(
            planned = %report.planned,
            applied = report.applied(),
            failed = report.failures.len(),
            "sync pass complete"
        );
        Ok(report)
    }

    async fn record_failure(
        &self,
        local: &VaultItem,
        error: RemoteError,
        now: Timestamp,
        report: &mut SyncReport,
    ) -> Result<()> {
        tracing::warn!(
            local_id = %local.local_id,
            code = error.code,
            "remote write failed: {}",
            error.message
        );
        self.store
            .record_push_failure(&local.local_id, error.code, Some(error.message.clone()), now)
            .await?;
        report.failures.push(PushFailure {
            local_id: local.local_id.clone(),
            code: error.code,
            message: error.message,
        });
        Ok(())
    }
}
