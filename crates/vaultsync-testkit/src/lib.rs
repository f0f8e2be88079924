//! # vaultsync Testkit
//!
//! Testing utilities for vaultsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: Named snapshot pairs with the plan the engine must produce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: In-memory worlds for driving reconciliation and sync passes
//!
//! ## Scenarios
//!
//! Scenarios pin the decision order of the engine:
//!
//! ```rust
//! use vaultsync_testkit::scenarios::verify_all_scenarios;
//!
//! for result in verify_all_scenarios() {
//!     assert!(result.passed, "{}", result.name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use vaultsync_testkit::generators::{snapshots_from_params, SnapshotParams};
//! use vaultsync_testkit::fixtures::SyncFixture;
//!
//! proptest! {
//!     #[test]
//!     fn sync_settles(params: SnapshotParams) {
//!         let (local, remote) = snapshots_from_params(&params);
//!         let mut fixture = SyncFixture::with_snapshots(local, remote);
//!         prop_assert!(fixture.settle(2).is_some());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Step a two-sided world by hand:
//!
//! ```rust
//! use vaultsync_core::{RemoteItem, Timestamp};
//! use vaultsync_testkit::fixtures::SyncFixture;
//!
//! let mut fixture = SyncFixture::with_snapshots(
//!     vec![],
//!     vec![RemoteItem::new("r1", &b"hello"[..], Timestamp::from_millis(1_000))],
//! );
//! assert_eq!(fixture.step().local_puts, 1);
//! assert_eq!(fixture.settle(1), Some(0));
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{multi_device_fixtures, DeviceFixture, SyncFixture};
pub use generators::{snapshots, snapshots_from_params, LocalParams, RemoteParams, SnapshotParams};
pub use scenarios::{
    all_scenarios, results_to_json, verify_all_scenarios, PlanIds, Scenario, ScenarioResult,
    ScenarioRetry,
};
