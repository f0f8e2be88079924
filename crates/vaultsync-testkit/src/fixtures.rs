//! Test fixtures and helpers.
//!
//! [`SyncFixture`] is a synchronous, in-memory two-sided world for driving
//! the engine: reconcile, apply the plan, repeat. [`DeviceFixture`] wires a
//! real [`SyncSession`] to memory collaborators for async tests.

use std::sync::Arc;
use std::time::Duration;

use vaultsync_core::{
    payload_differs, AlwaysRetry, LocalView, RemoteItem, RemoteRef, RemoteView, Timestamp,
    VaultItem,
};
use vaultsync_store::MemoryLocalStore;
use vaultsync_sync::{
    imported_local_id, MemoryRemote, PlanSummary, ReconcileConfig, Reconciler, SyncConfig,
    SyncSession,
};

/// Local and remote snapshots with a simulated server clock.
///
/// Pushes get a server revision date strictly later than anything seen so
/// far, one second apart.
#[derive(Debug, Clone)]
pub struct SyncFixture {
    pub local: Vec<VaultItem>,
    pub remote: Vec<RemoteItem>,
    pub config: ReconcileConfig,
    clock: Timestamp,
    created: u64,
}

impl SyncFixture {
    /// Create an empty fixture.
    pub fn new() -> Self {
        Self::with_snapshots(Vec::new(), Vec::new())
    }

    /// Create a fixture from existing snapshots.
    pub fn with_snapshots(local: Vec<VaultItem>, remote: Vec<RemoteItem>) -> Self {
        let latest = local
            .iter()
            .flat_map(|l| [Some(l.effective_date()), l.remote_ref.as_ref().map(RemoteRef::effective_date)])
            .flatten()
            .chain(remote.iter().map(RemoteView::effective_date))
            .max()
            .unwrap_or(Timestamp::EPOCH);

        Self {
            local,
            remote,
            config: ReconcileConfig::default(),
            clock: latest,
            created: 0,
        }
    }

    /// Reconcile without applying.
    pub fn plan_summary(&self) -> PlanSummary {
        Reconciler::new(self.config, AlwaysRetry)
            .reconcile(&self.local, &self.remote, payload_differs)
            .summary()
    }

    /// Reconcile once and apply the plan to both sides.
    pub fn step(&mut self) -> PlanSummary {
        let local = self.local.clone();
        let remote = self.remote.clone();
        let plan = Reconciler::new(self.config, AlwaysRetry).reconcile(&local, &remote, payload_differs);

        for &(l, r) in &plan.remote_deletes {
            self.remote.retain(|x| x.remote_id != r.remote_id);
            self.local.retain(|x| x.local_id != l.local_id);
        }

        for &(l, _) in &plan.local_deletes {
            self.local.retain(|x| x.local_id != l.local_id);
        }

        for &(l, r) in &plan.remote_puts {
            let now = self.tick();
            let remote_id = match r {
                Some(r) => r.remote_id.clone(),
                None => {
                    self.created += 1;
                    format!("created-{}", self.created)
                }
            };
            let stored = RemoteItem::new(remote_id, l.payload.clone(), now);

            match self.remote.iter_mut().find(|x| x.remote_id == stored.remote_id) {
                Some(slot) => *slot = stored.clone(),
                None => self.remote.push(stored.clone()),
            }
            if let Some(local) = self.local.iter_mut().find(|x| x.local_id == l.local_id) {
                local.revision_date = stored.revision_date;
                local.deleted_date = stored.deleted_date;
                local.remote_ref = Some(RemoteRef::observe(&stored));
                local.error = None;
            }
        }

        for &(l, r) in &plan.local_puts {
            match l.and_then(|l| self.local.iter_mut().find(|x| x.local_id == l.local_id)) {
                Some(local) => local.adopt_remote(r),
                None => self.local.push(VaultItem::from_remote(imported_local_id(r), r)),
            }
        }

        plan.summary()
    }

    /// Step until the plan is empty. Returns the number of non-empty steps,
    /// or `None` if still not settled after `max_steps`.
    pub fn settle(&mut self, max_steps: usize) -> Option<usize> {
        for taken in 0..=max_steps {
            if self.step() == PlanSummary::default() {
                return Some(taken);
            }
        }
        None
    }

    /// A local record by id.
    pub fn local_item(&self, local_id: &str) -> Option<&VaultItem> {
        self.local.iter().find(|x| x.local_id == local_id)
    }

    /// A remote record by id.
    pub fn remote_item(&self, remote_id: &str) -> Option<&RemoteItem> {
        self.remote.iter().find(|x| x.remote_id == remote_id)
    }

    /// Edit a local record at the next clock tick.
    pub fn edit_local(&mut self, local_id: &str, payload: &'static [u8]) -> bool {
        let now = self.tick();
        match self.local.iter_mut().find(|x| x.local_id == local_id) {
            Some(item) => {
                item.edit(payload, now);
                true
            }
            None => false,
        }
    }

    /// Edit a remote record at the next clock tick.
    pub fn edit_remote(&mut self, remote_id: &str, payload: &'static [u8]) -> bool {
        let now = self.tick();
        match self.remote.iter_mut().find(|x| x.remote_id == remote_id) {
            Some(item) => {
                item.payload = payload.into();
                item.revision_date = now;
                true
            }
            None => false,
        }
    }

    fn tick(&mut self) -> Timestamp {
        self.clock = self.clock.saturating_add(Duration::from_secs(1));
        self.clock
    }
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One client device: a memory store synced against a shared remote.
pub struct DeviceFixture {
    pub session: SyncSession<Arc<MemoryLocalStore>, Arc<MemoryRemote>>,
}

impl DeviceFixture {
    /// Create a device with an empty store.
    pub fn new(remote: Arc<MemoryRemote>) -> Self {
        Self::from_store(remote, MemoryLocalStore::new())
    }

    /// Create a device whose store holds `items`.
    pub fn with_items(remote: Arc<MemoryRemote>, items: Vec<VaultItem>) -> vaultsync_store::Result<Self> {
        Ok(Self::from_store(remote, MemoryLocalStore::with_items(items)?))
    }

    fn from_store(remote: Arc<MemoryRemote>, store: MemoryLocalStore) -> Self {
        Self {
            session: SyncSession::new(Arc::new(store), remote, SyncConfig::default()),
        }
    }

    pub fn store(&self) -> &MemoryLocalStore {
        self.session.store()
    }
}

/// Create several devices sharing one remote.
pub fn multi_device_fixtures(count: usize) -> (Arc<MemoryRemote>, Vec<DeviceFixture>) {
    let remote = Arc::new(MemoryRemote::starting_at(Timestamp::EPOCH));
    let devices = (0..count)
        .map(|_| DeviceFixture::new(Arc::clone(&remote)))
        .collect();
    (remote, devices)
}
