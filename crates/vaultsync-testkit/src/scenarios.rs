//! Named reconciliation scenarios with known plans.
//!
//! Each scenario is a small local/remote snapshot pair together with the
//! plan the engine must produce for it. The table doubles as executable
//! documentation of the decision order: every branch of the engine is hit
//! by at least one entry.

use serde::{Deserialize, Serialize};

use vaultsync_core::{
    payload_differs, AlwaysRetry, ErrorState, NeverRetry, RemoteItem, RemoteRef, Timestamp,
    VaultItem, CURRENT_SCHEMA_VERSION,
};
use vaultsync_sync::{ReconcileConfig, ReconciliationPlan, Reconciler};

/// Retry answer used while reconciling a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioRetry {
    Always,
    Never,
}

/// Plan contents reduced to ids.
///
/// Deletions and pushes are listed by local id, pulls by remote id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanIds {
    pub remote_deletes: Vec<String>,
    pub local_deletes: Vec<String>,
    pub remote_puts: Vec<String>,
    pub local_puts: Vec<String>,
}

impl PlanIds {
    /// Reduce a plan to ids.
    pub fn of(plan: &ReconciliationPlan<'_, VaultItem, RemoteItem>) -> Self {
        Self {
            remote_deletes: plan.remote_deletes.iter().map(|(l, _)| l.local_id.clone()).collect(),
            local_deletes: plan.local_deletes.iter().map(|(l, _)| l.local_id.clone()).collect(),
            remote_puts: plan.remote_puts.iter().map(|(l, _)| l.local_id.clone()).collect(),
            local_puts: plan.local_puts.iter().map(|(_, r)| r.remote_id.clone()).collect(),
        }
    }

    fn expected(
        remote_deletes: &[&str],
        local_deletes: &[&str],
        remote_puts: &[&str],
        local_puts: &[&str],
    ) -> Self {
        let owned = |ids: &[&str]| ids.iter().map(|id| id.to_string()).collect();
        Self {
            remote_deletes: owned(remote_deletes),
            local_deletes: owned(local_deletes),
            remote_puts: owned(remote_puts),
            local_puts: owned(local_puts),
        }
    }
}

/// A reconciliation scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name.
    pub name: &'static str,
    pub local: Vec<VaultItem>,
    pub remote: Vec<RemoteItem>,
    pub retry: ScenarioRetry,
    pub expected: PlanIds,
}

impl Scenario {
    /// Reconcile the snapshots with the default configuration.
    pub fn run(&self) -> PlanIds {
        let config = ReconcileConfig::default();
        match self.retry {
            ScenarioRetry::Always => PlanIds::of(&Reconciler::new(config, AlwaysRetry).reconcile(
                &self.local,
                &self.remote,
                payload_differs,
            )),
            ScenarioRetry::Never => PlanIds::of(&Reconciler::new(config, NeverRetry).reconcile(
                &self.local,
                &self.remote,
                payload_differs,
            )),
        }
    }
}

/// Outcome of running one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub actual: PlanIds,
}

fn ms(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn remote(id: &str, payload: &'static [u8], at: i64) -> RemoteItem {
    RemoteItem::new(id, payload, ms(at))
}

/// A local record in sync with `remote`.
fn synced(id: &str, remote: &RemoteItem) -> VaultItem {
    VaultItem::from_remote(id, remote)
}

/// Get all scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    let r1 = remote("r1", b"remote", 1_000);
    let none = PlanIds::default();

    vec![
        Scenario {
            name: "unknown remote record is pulled",
            local: vec![],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "new local record is pushed",
            local: vec![VaultItem::new("l1", &b"draft"[..], ms(1_000))],
            remote: vec![],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &["l1"], &[]),
        },
        Scenario {
            name: "new local tombstone is dropped",
            local: vec![VaultItem::new("l1", &b"draft"[..], ms(1_000)).deleted_at(ms(2_000))],
            remote: vec![],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &["l1"], &[], &[]),
        },
        Scenario {
            name: "record gone from remote is deleted locally",
            local: vec![synced("l1", &r1)],
            remote: vec![],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &["l1"], &[], &[]),
        },
        Scenario {
            name: "identical record is left alone",
            local: vec![synced("l1", &r1)],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: none.clone(),
        },
        Scenario {
            name: "local edit is pushed",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.edit(&b"edited"[..], ms(3_000));
                item
            }],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &["l1"], &[]),
        },
        Scenario {
            name: "local delete reaches remote",
            local: vec![synced("l1", &r1).deleted_at(ms(3_000))],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&["l1"], &[], &[], &[]),
        },
        Scenario {
            name: "remote edit wins over concurrent local edit",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.edit(&b"local"[..], ms(9_000));
                item
            }],
            remote: vec![remote("r1", b"elsewhere", 5_000)],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "remote trash wins over local edit",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.edit(&b"local"[..], ms(9_000));
                item
            }],
            remote: vec![r1.clone().deleted_at(ms(5_000))],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "stale local copy is refreshed",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.revision_date = ms(500);
                item
            }],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "sub-bucket date noise takes the remote date",
            local: vec![{
                let noisy = RemoteItem::new("r1", &b"remote"[..], Timestamp::from_micros(1_663_769_073_183_333));
                let mut item = synced("l1", &noisy);
                item.revision_date = Timestamp::from_micros(1_663_769_073_181_997);
                item
            }],
            remote: vec![RemoteItem::new("r1", &b"remote"[..], Timestamp::from_micros(1_663_769_073_183_333))],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "same date with different content pulls",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.payload = (&b"diverged"[..]).into();
                item
            }],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "same date with a failed push pulls",
            local: vec![synced("l1", &r1).with_error(ErrorState::new(500, ms(1_000), ms(1_500)))],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "outdated schema is pulled",
            local: vec![synced("l1", &r1).with_schema_version(CURRENT_SCHEMA_VERSION - 1)],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &[], &["r1"]),
        },
        Scenario {
            name: "failed push waits when retry is refused",
            local: vec![
                {
                    let mut item = synced("l1", &r1);
                    item.edit(&b"edited"[..], ms(3_000));
                    item.with_error(ErrorState::new(503, ms(3_000), ms(3_500)))
                },
                VaultItem::new("l2", &b"draft"[..], ms(3_000))
                    .with_error(ErrorState::new(400, ms(3_000), ms(3_500))),
            ],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Never,
            expected: none.clone(),
        },
        Scenario {
            name: "failed push is retried when allowed",
            local: vec![{
                let mut item = synced("l1", &r1);
                item.edit(&b"edited"[..], ms(3_000));
                item.with_error(ErrorState::new(503, ms(3_000), ms(3_500)))
            }],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &[], &["l1"], &[]),
        },
        Scenario {
            name: "duplicate link keeps the later record",
            local: vec![
                {
                    let mut item = synced("l1", &r1);
                    item.edit(&b"older copy"[..], ms(3_000));
                    item
                },
                synced("l2", &r1),
            ],
            remote: vec![r1.clone()],
            retry: ScenarioRetry::Always,
            expected: none,
        },
        Scenario {
            name: "mixed snapshot keeps input order",
            local: vec![
                VaultItem::new("new-b", &b"b"[..], ms(2_000)),
                synced("gone", &remote("r9", b"x", 500)),
                VaultItem::new("new-a", &b"a"[..], ms(2_000)),
                synced("l1", &r1).linked(RemoteRef::new("r1", ms(1_000))),
            ],
            remote: vec![remote("r2", b"two", 700), r1.clone(), remote("r0", b"zero", 800)],
            retry: ScenarioRetry::Always,
            expected: PlanIds::expected(&[], &["gone"], &["new-b", "new-a"], &["r2", "r0"]),
        },
    ]
}

/// Run every scenario and report whether it produced the expected plan.
pub fn verify_all_scenarios() -> Vec<ScenarioResult> {
    all_scenarios()
        .iter()
        .map(|scenario| {
            let actual = scenario.run();
            ScenarioResult {
                name: scenario.name.to_string(),
                passed: actual == scenario.expected,
                actual,
            }
        })
        .collect()
}

/// Render scenario results as pretty JSON, for diffing across versions.
pub fn results_to_json(results: &[ScenarioResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
