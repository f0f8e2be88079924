//! Top-level configuration.

use std::time::Duration;

use vaultsync_sync::SyncConfig;

/// Configuration for the sync supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long a cancelled sync task may take to wind down before it is
    /// aborted.
    pub shutdown_grace: Duration,
}

impl SupervisorConfig {
    /// Sets the shutdown grace period.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Configuration for vaultsync.
#[derive(Debug, Clone, Default)]
pub struct VaultSyncConfig {
    /// Sync pass configuration.
    pub sync: SyncConfig,
    /// Supervisor configuration.
    pub supervisor: SupervisorConfig,
}

impl VaultSyncConfig {
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_supervisor(mut self, supervisor: SupervisorConfig) -> Self {
        self.supervisor = supervisor;
        self
    }
}
