//! # vaultsync sync
//!
//! Three-way reconciliation between a local vault and a remote service.
//!
//! ## Overview
//!
//! Each local record remembers the remote state it last synced with (its
//! baseline). Comparing the current local record, its baseline, and the
//! current remote record tells which side changed. The [`Reconciler`] turns
//! two snapshots into a [`ReconciliationPlan`]; a [`SyncSession`] applies the
//! plan through a [`LocalStore`](vaultsync_store::LocalStore) and a
//! [`RemoteService`].
//!
//! ## Key Properties
//!
//! - **Pure**: The engine does no I/O and cannot fail
//! - **Deterministic**: Same snapshots, same plan, same order
//! - **Remote wins**: Concurrent edits and ambiguous timestamps resolve in
//!   favor of remote
//! - **Idempotent**: Applying a plan and reconciling again yields an empty
//!   plan
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultsync_store::MemoryLocalStore;
//! use vaultsync_sync::{MemoryRemote, SyncConfig, SyncSession};
//!
//! async fn example() -> vaultsync_sync::Result<()> {
//!     let store = Arc::new(MemoryLocalStore::new());
//!     let remote = Arc::new(MemoryRemote::new());
//!
//!     let session = SyncSession::new(store, remote, SyncConfig::default());
//!     let report = session.run_pass().await?;
//!     println!("{}", report.planned);
//!     Ok(())
//! }
//! ```
//!
//! ## Decision Order
//!
//! ```text
//! remote record R
//!   |-- no linked local ------------------------> pull
//!   |-- local schema outdated ------------------> pull
//!   |-- R moved since baseline -----------------> pull
//!   |-- local older ----------------------------> pull
//!   |-- local newer, tombstone -----------------> delete remote
//!   |-- local newer, retry allowed -------------> push
//!   |-- same bucket, exact dates or error differ> pull
//!   `-- same bucket, content differs -----------> pull
//! ```

pub mod error;
pub mod plan;
pub mod reconcile;
pub mod remote;
pub mod session;

pub use error::{Result, SyncError};
pub use plan::{PlanSummary, ReconciliationPlan};
pub use reconcile::{reconcile, ReconcileConfig, Reconciler};
pub use remote::{memory::MemoryRemote, RemoteError, RemoteService};
pub use session::{imported_local_id, PushFailure, SyncConfig, SyncReport, SyncSession, IMPORTED_ID_PREFIX};
