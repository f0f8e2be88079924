//! The reconciliation engine.
//!
//! Given a local snapshot and a remote snapshot, compute which records have
//! to be pulled, pushed, or deleted on either side. The computation is pure:
//! no I/O, no errors, and the same inputs always produce the same plan.
//!
//! Algorithm, for each remote record `R`:
//! 1. Find the local record `L` linked to `R.remote_id`. Unlinked: pull.
//! 2. `L` stored in an older schema: pull (forces migration).
//! 3. `R` changed since `L`'s baseline: pull. Remote changes always win.
//! 4. Otherwise compare `L` with `R` at coarse granularity:
//!    - `L` older: pull.
//!    - `L` newer: delete on remote if `L` is a tombstone, else push
//!      (subject to the retry policy).
//!    - Same bucket: pull if the exact dates differ or `L` has a failed
//!      push on record, else pull only if the content differs.
//!
//! Linked local records whose remote entry is missing are deleted locally.
//! Unlinked local records are pushed, or dropped if deleted before they
//! ever reached remote.
//!
//! The order of these checks decides the winner on boundary cases and
//! must not be rearranged.

use std::cmp::Ordering;
use std::collections::HashMap;

use vaultsync_core::{
    BackoffPolicy, Granularity, LocalView, RemoteRef, RemoteView, RetryPolicy, SchemaVersion,
    Timestamp, CURRENT_SCHEMA_VERSION,
};

use crate::plan::ReconciliationPlan;

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Bucket width for date comparisons.
    pub granularity: Granularity,
    /// Records below this schema version are force-pulled.
    pub schema_version: SchemaVersion,
}

impl ReconcileConfig {
    /// Sets the comparison granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the current schema version.
    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::DEFAULT,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }
}

/// Why a matched record is pulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullReason {
    Migration,
    RemoteChanged,
    LocalStale,
    DateRounding,
    PendingError,
    ContentDiverged,
}

/// Outcome for a local record matched with a remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Pull(PullReason),
    Push,
    DeleteRemote,
    BackingOff,
    UpToDate,
}

/// The reconciliation engine.
///
/// Holds configuration and the retry policy; carries no state between
/// passes and can be shared freely.
#[derive(Debug, Clone)]
pub struct Reconciler<P = BackoffPolicy> {
    config: ReconcileConfig,
    retry: P,
}

impl<P: RetryPolicy> Reconciler<P> {
    /// Create an engine with the given configuration and retry policy.
    pub fn new(config: ReconcileConfig, retry: P) -> Self {
        Self { config, retry }
    }

    /// The configuration.
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &P {
        &self.retry
    }

    /// Compute the plan that reconciles `local_items` with `remote_items`.
    ///
    /// `content_changed` is only consulted when both sides agree on dates;
    /// it should report whether the payloads differ.
    pub fn reconcile<'a, L, R, I, J, F>(
        &self,
        local_items: I,
        remote_items: J,
        mut content_changed: F,
    ) -> ReconciliationPlan<'a, L, R>
    where
        L: LocalView + 'a,
        R: RemoteView + 'a,
        I: IntoIterator<Item = &'a L>,
        J: IntoIterator<Item = &'a R>,
        F: FnMut(&L, &R) -> bool,
    {
        let mut plan = ReconciliationPlan::new();

        // Split local records into linked and new. Linked records are
        // indexed by remote id; slots are cleared as they are matched.
        let mut fresh: Vec<&'a L> = Vec::new();
        let mut linked: Vec<Option<&'a L>> = Vec::new();
        let mut by_remote_id: HashMap<&'a str, usize> = HashMap::new();

        for local in local_items {
            match local.remote_ref() {
                Some(baseline) => {
                    let slot = linked.len();
                    linked.push(Some(local));
                    if let Some(previous) = by_remote_id.insert(baseline.remote_id.as_str(), slot) {
                        tracing::warn!(
                            remote_id = %baseline.remote_id,
                            local_id = local.local_id(),
                            "several local records linked to one remote entry; keeping the last"
                        );
                        linked[previous] = None;
                    }
                }
                None => fresh.push(local),
            }
        }

        for remote in remote_items {
            let matched = by_remote_id
                .remove(remote.remote_id())
                .and_then(|slot| linked[slot].take());

            let Some(local) = matched else {
                plan.local_puts.push((None, remote));
                continue;
            };

            match self.decide(local, remote, &mut content_changed) {
                Decision::Pull(reason) => {
                    tracing::trace!(local_id = local.local_id(), ?reason, "pull");
                    plan.local_puts.push((Some(local), remote));
                }
                Decision::Push => plan.remote_puts.push((local, Some(remote))),
                Decision::DeleteRemote => plan.remote_deletes.push((local, remote)),
                Decision::BackingOff => {
                    tracing::trace!(local_id = local.local_id(), "push backing off");
                }
                Decision::UpToDate => {}
            }
        }

        // Still linked but absent from remote: deleted remotely.
        for local in linked.into_iter().flatten() {
            plan.local_deletes.push((local, None));
        }

        for local in fresh {
            if local.is_deleted() {
                plan.local_deletes.push((local, None));
            } else if self.may_push(local) {
                plan.remote_puts.push((local, None));
            } else {
                tracing::trace!(local_id = local.local_id(), "create backing off");
            }
        }

        tracing::debug!(plan = %plan.summary(), "reconciled");
        plan
    }

    fn decide<L, R, F>(&self, local: &L, remote: &R, content_changed: &mut F) -> Decision
    where
        L: LocalView,
        R: RemoteView,
        F: FnMut(&L, &R) -> bool,
    {
        if local.schema_version() < self.config.schema_version {
            return Decision::Pull(PullReason::Migration);
        }

        let g = self.config.granularity;
        let baseline = local
            .remote_ref()
            .map_or(Timestamp::MIN, RemoteRef::effective_date)
            .quantize(g);
        let remote_now = remote.effective_date().quantize(g);
        if remote_now != baseline {
            return Decision::Pull(PullReason::RemoteChanged);
        }

        let local_now = local.effective_date().quantize(g);
        match local_now.cmp(&remote_now) {
            Ordering::Less => Decision::Pull(PullReason::LocalStale),
            Ordering::Greater => {
                if local.is_deleted() {
                    Decision::DeleteRemote
                } else if self.may_push(local) {
                    Decision::Push
                } else {
                    Decision::BackingOff
                }
            }
            Ordering::Equal => {
                // Same bucket. Without a finer signal there is no safe way
                // to tell who is ahead, so remote wins.
                if local.effective_date() != remote.effective_date() {
                    Decision::Pull(PullReason::DateRounding)
                } else if local.error_state().is_some() {
                    Decision::Pull(PullReason::PendingError)
                } else if content_changed(local, remote) {
                    Decision::Pull(PullReason::ContentDiverged)
                } else {
                    Decision::UpToDate
                }
            }
        }
    }

    fn may_push<L: LocalView>(&self, local: &L) -> bool {
        match local.error_state() {
            Some(error) => self.retry.can_retry(error, local.effective_date()),
            None => true,
        }
    }
}

impl Default for Reconciler<BackoffPolicy> {
    fn default() -> Self {
        Self::new(ReconcileConfig::default(), BackoffPolicy::default())
    }
}

/// Reconcile with the default configuration and a backoff policy
/// evaluated at the current time.
pub fn reconcile<'a, L, R, I, J, F>(
    local_items: I,
    remote_items: J,
    content_changed: F,
) -> ReconciliationPlan<'a, L, R>
where
    L: LocalView + 'a,
    R: RemoteView + 'a,
    I: IntoIterator<Item = &'a L>,
    J: IntoIterator<Item = &'a R>,
    F: FnMut(&L, &R) -> bool,
{
    Reconciler::default().reconcile(local_items, remote_items, content_changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::{
        payload_differs, AlwaysRetry, ErrorState, NeverRetry, RemoteItem, VaultItem,
    };

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn engine() -> Reconciler<AlwaysRetry> {
        Reconciler::new(ReconcileConfig::default(), AlwaysRetry)
    }

    /// A local record in sync with `remote`.
    fn synced(local_id: &str, remote: &RemoteItem) -> VaultItem {
        VaultItem::from_remote(local_id, remote)
    }

    fn local_put_ids<'a>(plan: &ReconciliationPlan<'a, VaultItem, RemoteItem>) -> Vec<(Option<&'a str>, &'a str)> {
        plan.local_puts
            .iter()
            .map(|(l, r)| (l.map(|l| l.local_id.as_str()), r.remote_id.as_str()))
            .collect()
    }

    fn remote_put_ids<'a>(plan: &ReconciliationPlan<'a, VaultItem, RemoteItem>) -> Vec<(&'a str, Option<&'a str>)> {
        plan.remote_puts
            .iter()
            .map(|(l, r)| (l.local_id.as_str(), r.map(|r| r.remote_id.as_str())))
            .collect()
    }

    fn local_delete_ids<'a>(plan: &ReconciliationPlan<'a, VaultItem, RemoteItem>) -> Vec<&'a str> {
        plan.local_deletes.iter().map(|(l, _)| l.local_id.as_str()).collect()
    }

    #[test]
    fn test_new_remote_record_is_pulled() {
        let remote = vec![RemoteItem::new("x", &b"a"[..], ts(1_000))];
        let local: Vec<VaultItem> = vec![];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_put_ids(&plan), vec![(None, "x")]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_new_local_record_is_pushed() {
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000))];
        let remote: Vec<RemoteItem> = vec![];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(remote_put_ids(&plan), vec![("l", None)]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_local_delete_before_first_sync() {
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000)).deleted_at(ts(2_000))];
        let remote: Vec<RemoteItem> = vec![];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_delete_ids(&plan), vec!["l"]);
        assert!(plan.local_deletes[0].1.is_none());
        assert!(plan.remote_puts.is_empty());
    }

    #[test]
    fn test_remote_deleted_since_baseline() {
        let r = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &r)];
        let remote: Vec<RemoteItem> = vec![];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_delete_ids(&plan), vec!["l"]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_concurrent_remote_edit_wins_over_local_edit() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.edit(&b"local"[..], ts(2_000));
        let local = vec![l];
        let remote = vec![RemoteItem::new("x", &b"remote"[..], ts(3_000))];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
        assert!(plan.remote_puts.is_empty());
    }

    #[test]
    fn test_remote_change_wins_even_if_local_is_newer() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.edit(&b"local"[..], ts(9_000));
        let local = vec![l];
        let remote = vec![RemoteItem::new("x", &b"remote"[..], ts(2_000))];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_remote_change_wins_over_local_delete() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &base).deleted_at(ts(5_000))];
        let remote = vec![RemoteItem::new("x", &b"b"[..], ts(2_000))];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
        assert!(plan.remote_deletes.is_empty());
    }

    #[test]
    fn test_remote_tombstone_counts_as_change() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &base)];
        let remote = vec![base.clone().deleted_at(ts(4_000))];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_local_edit_is_pushed() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.edit(&b"b"[..], ts(2_000));
        let local = vec![l];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(remote_put_ids(&plan), vec![("l", Some("x"))]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_local_delete_is_propagated() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &base).deleted_at(ts(2_000))];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(plan.remote_deletes.len(), 1);
        assert_eq!(plan.remote_deletes[0].0.local_id, "l");
        assert_eq!(plan.remote_deletes[0].1.remote_id, "x");
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_local_older_than_baseline_is_pulled() {
        let base = RemoteItem::new("x", &b"a"[..], ts(5_000));
        let mut l = synced("l", &base);
        l.revision_date = ts(1_000);
        let local = vec![l];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_outdated_schema_forces_pull() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base).with_schema_version(CURRENT_SCHEMA_VERSION - 1);
        l.edit(&b"pending"[..], ts(2_000));
        let local = vec![l];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);

        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
        assert!(plan.remote_puts.is_empty());
    }

    #[test]
    fn test_schema_threshold_is_configurable() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &base).with_schema_version(1)];
        let remote = vec![base];

        let lenient = Reconciler::new(ReconcileConfig::default().with_schema_version(1), AlwaysRetry);
        assert!(lenient.reconcile(&local, &remote, payload_differs).is_empty());
    }

    #[test]
    fn test_rounding_noise_is_absorbed() {
        // Baseline recorded at .1819975, service now reports .1833333.
        let remote = vec![RemoteItem::new("x", &b"a"[..], Timestamp::from_micros(1_663_769_073_183_333))];
        let mut l = synced("l", &remote[0]);
        let recorded = Timestamp::from_micros(1_663_769_073_181_997);
        l.revision_date = recorded;
        l.remote_ref = Some(RemoteRef::new("x", recorded));
        let local = vec![l];

        let plan = engine().reconcile(&local, &remote, |_: &VaultItem, _: &RemoteItem| false);

        // Rounded dates agree, exact dates differ: fall back to remote.
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
        assert!(plan.remote_puts.is_empty());
    }

    #[test]
    fn test_same_bucket_local_edit_is_overwritten() {
        // A local edit within the same 100ms bucket as the baseline is
        // indistinguishable from rounding noise and loses to remote.
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.edit(&b"quick edit"[..], ts(1_020));
        let local = vec![l];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_pending_error_with_equal_dates_pulls() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("l", &base).with_error(ErrorState::new(500, ts(1_000), ts(1_000)))];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, |_: &VaultItem, _: &RemoteItem| false);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_content_divergence_pulls() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.payload = bytes::Bytes::from_static(b"corrupted");
        let local = vec![l];
        let remote = vec![base];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_put_ids(&plan), vec![(Some("l"), "x")]);
    }

    #[test]
    fn test_content_predicate_only_called_on_date_agreement() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut edited = synced("edited", &RemoteItem::new("y", &b"a"[..], ts(1_000)));
        edited.edit(&b"b"[..], ts(2_000));
        let local = vec![synced("same", &base), edited];
        let remote = vec![base, RemoteItem::new("y", &b"a"[..], ts(1_000))];

        let mut calls = Vec::new();
        let plan = engine().reconcile(&local, &remote, |l: &VaultItem, _: &RemoteItem| {
            calls.push(l.local_id.clone());
            false
        });

        assert_eq!(calls, vec!["same".to_string()]);
        assert_eq!(remote_put_ids(&plan), vec![("edited", Some("y"))]);
    }

    #[test]
    fn test_retry_suppression_for_linked_record() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let mut l = synced("l", &base);
        l.edit(&b"b"[..], ts(2_000));
        let l = l.with_error(ErrorState::new(400, ts(2_000), ts(2_100)));
        let local = vec![l];
        let remote = vec![base];

        let backing_off = Reconciler::new(ReconcileConfig::default(), NeverRetry);
        assert!(backing_off.reconcile(&local, &remote, payload_differs).is_empty());

        let retrying = Reconciler::new(ReconcileConfig::default(), AlwaysRetry);
        assert_eq!(
            remote_put_ids(&retrying.reconcile(&local, &remote, payload_differs)),
            vec![("l", Some("x"))]
        );
    }

    #[test]
    fn test_retry_suppression_for_new_record() {
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000)).with_error(ErrorState::new(500, ts(1_000), ts(1_000)))];
        let remote: Vec<RemoteItem> = vec![];

        let plan = Reconciler::new(ReconcileConfig::default(), NeverRetry).reconcile(&local, &remote, payload_differs);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_retry_policy_sees_effective_date() {
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000))
            .deleted_at(ts(3_000))
            .linked(RemoteRef::new("x", ts(500)))
            .with_error(ErrorState::new(500, ts(1_000), ts(1_000)))];
        let remote = vec![RemoteItem::new("x", &b"a"[..], ts(500))];

        // Deletions are not gated by the retry policy.
        let seen = std::cell::RefCell::new(Vec::new());
        let policy = |_: &ErrorState, reference: Timestamp| {
            seen.borrow_mut().push(reference);
            false
        };
        let plan = Reconciler::new(ReconcileConfig::default(), policy).reconcile(&local, &remote, payload_differs);
        assert_eq!(plan.remote_deletes.len(), 1);
        assert!(seen.borrow().is_empty());

        let pending = vec![VaultItem::new("m", &b"a"[..], ts(1_000)).with_error(ErrorState::new(500, ts(0), ts(0)))];
        let none: Vec<RemoteItem> = vec![];
        Reconciler::new(ReconcileConfig::default(), policy).reconcile(&pending, &none, payload_differs);
        assert_eq!(*seen.borrow(), vec![ts(1_000)]);
    }

    #[test]
    fn test_backoff_policy_in_engine() {
        let error = ErrorState::new(503, ts(1_000), ts(10_000));
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000)).with_error(error)];
        let remote: Vec<RemoteItem> = vec![];

        let too_soon = Reconciler::new(ReconcileConfig::default(), BackoffPolicy::at(ts(10_001)));
        assert!(too_soon.reconcile(&local, &remote, payload_differs).is_empty());

        let later = Reconciler::new(ReconcileConfig::default(), BackoffPolicy::at(ts(60_000)));
        assert_eq!(remote_put_ids(&later.reconcile(&local, &remote, payload_differs)), vec![("l", None)]);
    }

    #[test]
    fn test_up_to_date_produces_nothing() {
        let remote = vec![
            RemoteItem::new("x", &b"a"[..], ts(1_000)),
            RemoteItem::new("y", &b"b"[..], ts(2_000)).deleted_at(ts(3_000)),
        ];
        let local: Vec<VaultItem> = remote.iter().enumerate().map(|(i, r)| synced(&format!("l{i}"), r)).collect();

        assert!(engine().reconcile(&local, &remote, payload_differs).is_empty());
    }

    #[test]
    fn test_duplicate_links_keep_last() {
        let base = RemoteItem::new("x", &b"a"[..], ts(1_000));
        let local = vec![synced("first", &base), synced("second", &base)];
        let remote = vec![base.clone()];

        let plan = engine().reconcile(&local, &remote, |l: &VaultItem, _: &RemoteItem| l.local_id == "second");

        assert_eq!(local_put_ids(&plan), vec![(Some("second"), "x")]);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_plan_order_follows_input_order() {
        let (a, b, c) = (
            RemoteItem::new("a", &b""[..], ts(1_000)),
            RemoteItem::new("b", &b""[..], ts(1_000)),
            RemoteItem::new("c", &b""[..], ts(1_000)),
        );
        let local = vec![synced("lc", &c), synced("la", &a), synced("lb", &b)];
        let remote: Vec<RemoteItem> = vec![];

        let plan = engine().reconcile(&local, &remote, payload_differs);
        assert_eq!(local_delete_ids(&plan), vec!["lc", "la", "lb"]);
    }

    #[test]
    fn test_free_function_uses_defaults() {
        let local = vec![VaultItem::new("l", &b"a"[..], ts(1_000))];
        let remote = vec![RemoteItem::new("x", &b"a"[..], ts(1_000))];

        let plan = reconcile(&local, &remote, payload_differs);
        assert_eq!(remote_put_ids(&plan), vec![("l", None)]);
        assert_eq!(local_put_ids(&plan), vec![(None, "x")]);
    }

    proptest::proptest! {
        #[test]
        fn test_synced_records_are_idle(
            dates in proptest::collection::vec(-1_000_000_000_000i64..1_000_000_000_000i64, 0..16),
        ) {
            let remote: Vec<RemoteItem> = dates
                .iter()
                .enumerate()
                .map(|(i, &micros)| RemoteItem::new(format!("r{i}"), format!("p{i}").into_bytes(), Timestamp::from_micros(micros)))
                .collect();
            let local: Vec<VaultItem> = remote.iter().map(|r| synced(&format!("l-{}", r.remote_id), r)).collect();

            proptest::prop_assert!(engine().reconcile(&local, &remote, payload_differs).is_empty());
        }

        #[test]
        fn test_noise_within_bucket_pulls(base in 0i64..1_000_000_000_000i64, noise in 1i64..40_000i64) {
            let exact = Timestamp::from_millis(base * 100);
            let remote = vec![RemoteItem::new("r", &b"x"[..], exact)];
            let mut item = synced("l", &remote[0]);
            item.revision_date = Timestamp::from_micros(exact.as_micros() + noise);

            let plan = engine().reconcile(std::slice::from_ref(&item), &remote, payload_differs);
            proptest::prop_assert_eq!(local_put_ids(&plan), vec![(Some("l"), "r")]);
        }
    }
}
