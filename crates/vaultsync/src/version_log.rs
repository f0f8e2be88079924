//! Version log collaborator.
//!
//! On the first foreground transition the supervisor asks the version log
//! to refresh once. The refresh is best effort: errors are logged and
//! dropped, and it is never retried.

use async_trait::async_trait;

/// A log of application versions that wants refreshing at startup.
#[async_trait]
pub trait VersionLog: Send + Sync {
    async fn refresh(&self) -> anyhow::Result<()>;
}

/// A version log that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVersionLog;

#[async_trait]
impl VersionLog for NoopVersionLog {
    async fn refresh(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
