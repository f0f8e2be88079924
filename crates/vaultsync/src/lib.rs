//! # vaultsync
//!
//! Local-first vault synchronization: a three-way reconciliation engine and
//! the lifecycle-gated supervisor that decides when it may run.
//!
//! ## Overview
//!
//! - **Reconciliation**: Compare a local and a remote snapshot against each
//!   record's last-synced baseline and plan pulls, pushes and deletions
//! - **Sync passes**: Apply a plan through the application's store and the
//!   remote service, recording failed pushes for backoff
//! - **Supervision**: Run exactly one sync task per foreground session,
//!   restarting it when the session changes
//!
//! ## Key Concepts
//!
//! - **Baseline**: The remote state a local record last observed
//! - **Remote wins**: Concurrent edits resolve in favor of remote
//! - **Session identity**: A new session instance means a new sync task,
//!   even if it looks the same
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::watch;
//! use vaultsync::{
//!     CancellationToken, LifecycleState, SessionHandle, SyncSupervisor, SyncWorker,
//!     VaultSyncConfig,
//! };
//! use vaultsync::store::MemoryLocalStore;
//! use vaultsync::sync::{MemoryRemote, SyncSession};
//!
//! async fn example() -> vaultsync::Result<()> {
//!     let config = VaultSyncConfig::default();
//!
//!     let (lifecycle_tx, lifecycle_rx) = watch::channel(LifecycleState::Created);
//!     let (sessions_tx, sessions_rx) = watch::channel(None);
//!
//!     let supervisor = SyncSupervisor::new(config.supervisor.clone())
//!         .spawn(lifecycle_rx, sessions_rx, CancellationToken::new());
//!
//!     // Log in: publish a session that can sync.
//!     let session = SyncSession::new(
//!         Arc::new(MemoryLocalStore::new()),
//!         Arc::new(MemoryRemote::new()),
//!         config.sync.clone(),
//!     );
//!     let capability = SyncWorker::new(session).into_capability();
//!     sessions_tx.send_replace(Some(SessionHandle::with_sync("alice", capability)));
//!
//!     // Foreground: sync starts.
//!     lifecycle_tx.send_replace(LifecycleState::Resumed);
//!
//!     supervisor.shutdown().await
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `vaultsync::core` - Records, timestamps, retry policy
//! - `vaultsync::store` - Local store boundary
//! - `vaultsync::sync` - Reconciliation engine and sync passes

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod supervisor;
pub mod version_log;
pub mod worker;

// Re-export component crates
pub use vaultsync_core as core;
pub use vaultsync_store as store;
pub use vaultsync_sync as sync;

// Re-export main types for convenience
pub use tokio_util::sync::CancellationToken;
pub use config::{SupervisorConfig, VaultSyncConfig};
pub use error::{Result, VaultSyncError};
pub use lifecycle::LifecycleState;
pub use session::{CapabilityHandle, SessionHandle, SyncCapability};
pub use supervisor::{SupervisorHandle, SupervisorState, SyncSupervisor};
pub use version_log::{NoopVersionLog, VersionLog};
pub use worker::SyncWorker;

// Re-export commonly used types
pub use vaultsync_core::{RemoteItem, Timestamp, VaultItem};
pub use vaultsync_sync::{ReconciliationPlan, Reconciler, SyncConfig, SyncReport};
