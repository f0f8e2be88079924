//! Session-scoped sync supervisor.
//!
//! The supervisor watches two inputs, the application lifecycle and the
//! current session, and keeps exactly one sync task alive while the
//! application is in the foreground and the session can sync.
//!
//! ```text
//!              lifecycle active
//!   Idle ---------------------------> WaitingForSession
//!    ^                                  |        ^
//!    | lifecycle inactive               |        | capability gone
//!    |                                  v        |
//!    +------------------------------- Running ---+
//!                                       |  ^
//!                 session identity      |  |
//!                 changed: cancel,      +--+
//!                 await, restart
//! ```
//!
//! Replacing a task is always cancel, await termination, then start. The
//! previous task has fully stopped before the next one is spawned.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::error::{Result, VaultSyncError};
use crate::lifecycle::LifecycleState;
use crate::session::{CapabilityHandle, SessionHandle};
use crate::version_log::VersionLog;

/// Observable state of the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    /// Application not in the foreground.
    #[default]
    Idle,
    /// In the foreground, but no session that can sync.
    WaitingForSession,
    /// A sync task is alive.
    Running,
}

struct RunningTask {
    session: SessionHandle,
    capability: CapabilityHandle,
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Builder for the supervisor task.
pub struct SyncSupervisor {
    config: SupervisorConfig,
    version_log: Option<Arc<dyn VersionLog>>,
}

impl SyncSupervisor {
    /// Create a supervisor with the given configuration.
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            version_log: None,
        }
    }

    /// Refresh `log` once, on the first foreground transition.
    pub fn with_version_log(mut self, log: Arc<dyn VersionLog>) -> Self {
        self.version_log = Some(log);
        self
    }

    /// Start supervising.
    ///
    /// The supervisor runs until `shutdown` is cancelled or both input
    /// channels are closed. Must be called within a Tokio runtime.
    pub fn spawn(
        self,
        lifecycle: watch::Receiver<LifecycleState>,
        sessions: watch::Receiver<Option<SessionHandle>>,
        shutdown: CancellationToken,
    ) -> SupervisorHandle {
        let (state_tx, state_rx) = watch::channel(SupervisorState::Idle);
        let driver = Driver {
            config: self.config,
            version_log: self.version_log,
            state: state_tx,
            active: false,
            session: None,
            activation: None,
            running: None,
            spent: None,
            refreshed: false,
        };
        let task = tokio::spawn(driver.run(lifecycle, sessions, shutdown.clone()));

        SupervisorHandle {
            state: state_rx,
            shutdown,
            task,
        }
    }
}

impl Default for SyncSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

/// Handle to a running supervisor.
pub struct SupervisorHandle {
    state: watch::Receiver<SupervisorState>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Current state.
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.clone()
    }

    /// Wait until the supervisor reaches `target`.
    ///
    /// Returns `false` if the supervisor exited first.
    pub async fn wait_for_state(&self, target: SupervisorState) -> bool {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(|state| *state == target).await.is_ok();
        reached
    }

    /// Whether the supervisor task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the running sync task, if any, and wait for the supervisor to
    /// exit.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.join().await
    }

    /// Wait for the supervisor to exit on its own.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| VaultSyncError::Supervisor(e.to_string()))
    }
}

struct Driver {
    config: SupervisorConfig,
    version_log: Option<Arc<dyn VersionLog>>,
    state: watch::Sender<SupervisorState>,
    active: bool,
    /// Latest session, compared by handle identity.
    session: Option<SessionHandle>,
    /// Lives for one foreground period; parent of the sync task token.
    activation: Option<CancellationToken>,
    running: Option<RunningTask>,
    /// Session whose task returned on its own. Not restarted until the
    /// session or the foreground period changes.
    spent: Option<SessionHandle>,
    refreshed: bool,
}

impl Driver {
    async fn run(
        mut self,
        mut lifecycle: watch::Receiver<LifecycleState>,
        mut sessions: watch::Receiver<Option<SessionHandle>>,
        shutdown: CancellationToken,
    ) {
        self.active = lifecycle.borrow_and_update().is_active();
        self.session = sessions.borrow_and_update().clone();

        let mut lifecycle_open = true;
        let mut sessions_open = true;

        loop {
            self.settle(&shutdown).await;
            if !lifecycle_open && !sessions_open {
                tracing::debug!("supervisor inputs closed");
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = lifecycle.changed(), if lifecycle_open => match changed {
                    Ok(()) => {
                        self.active = lifecycle.borrow_and_update().is_active();
                    }
                    Err(_) => lifecycle_open = false,
                },
                changed = sessions.changed(), if sessions_open => match changed {
                    Ok(()) => {
                        let next = sessions.borrow_and_update().clone();
                        if !same_session(next.as_ref(), self.session.as_ref()) {
                            self.spent = None;
                        }
                        self.session = next;
                    }
                    Err(_) => sessions_open = false,
                },
                _ = finished(&mut self.running) => {
                    if let Some(task) = self.running.take() {
                        tracing::warn!(capability = ?task.capability, "sync task returned without being cancelled");
                        self.spent = Some(task.session);
                    }
                }
            }
        }

        self.teardown().await;
    }

    /// Bring the running task in line with the current inputs.
    async fn settle(&mut self, shutdown: &CancellationToken) {
        if self.active {
            if self.activation.is_none() {
                let activation = shutdown.child_token();
                self.refresh_version_log_once(&activation);
                self.activation = Some(activation);
            }
        } else if let Some(activation) = self.activation.take() {
            activation.cancel();
            self.spent = None;
        }

        // A task runs for a session handle, not for its capability: a new
        // session carrying the same capability still gets a fresh task.
        let desired = match (&self.activation, &self.session) {
            (Some(_), Some(session))
                if session.sync_capability().is_some()
                    && !same_session(self.spent.as_ref(), Some(session)) =>
            {
                Some(session.clone())
            }
            _ => None,
        };

        let current = self.running.as_ref().map(|task| &task.session);
        if !same_session(current, desired.as_ref()) {
            if let Some(task) = self.running.take() {
                self.stop(task).await;
            }
            if let (Some(session), Some(activation)) = (desired, &self.activation) {
                self.running = start(session, activation);
            }
        }

        let next = if self.running.is_some() {
            SupervisorState::Running
        } else if self.active {
            SupervisorState::WaitingForSession
        } else {
            SupervisorState::Idle
        };
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            tracing::info!(from = ?*state, to = ?next, "supervisor state changed");
            *state = next;
            true
        });
    }

    /// Cancel `task` and wait for it to terminate.
    async fn stop(&self, task: RunningTask) {
        let RunningTask {
            session: _,
            capability,
            token,
            mut join,
        } = task;
        token.cancel();

        match tokio::time::timeout(self.config.shutdown_grace, &mut join).await {
            Ok(Ok(())) => tracing::debug!(?capability, "sync task stopped"),
            Ok(Err(e)) => tracing::warn!(?capability, error = %e, "sync task failed"),
            Err(_) => {
                tracing::warn!(
                    ?capability,
                    grace = ?self.config.shutdown_grace,
                    "sync task ignored cancellation; aborting"
                );
                join.abort();
                let _ = join.await;
            }
        }
    }

    fn refresh_version_log_once(&mut self, activation: &CancellationToken) {
        if self.refreshed {
            return;
        }
        self.refreshed = true;

        let Some(log) = self.version_log.clone() else {
            return;
        };
        let token = activation.child_token();
        tokio::spawn(async move {
            match token.run_until_cancelled(log.refresh()).await {
                Some(Ok(())) => tracing::debug!("version log refreshed"),
                Some(Err(e)) => tracing::debug!(error = %e, "version log refresh failed"),
                None => tracing::debug!("version log refresh cancelled"),
            }
        });
    }

    async fn teardown(&mut self) {
        if let Some(activation) = self.activation.take() {
            activation.cancel();
        }
        if let Some(task) = self.running.take() {
            self.stop(task).await;
        }
        self.state.send_replace(SupervisorState::Idle);
        tracing::debug!("supervisor stopped");
    }
}

fn same_session(a: Option<&SessionHandle>, b: Option<&SessionHandle>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}

fn start(session: SessionHandle, activation: &CancellationToken) -> Option<RunningTask> {
    let capability = session.sync_capability()?;
    let token = activation.child_token();
    let join = tokio::spawn({
        let capability = capability.clone();
        let token = token.clone();
        async move { capability.run(token).await }
    });
    tracing::debug!(account_id = session.account_id(), ?capability, "sync task started");

    Some(RunningTask {
        session,
        capability,
        token,
        join,
    })
}

/// Resolves when the running task, if any, has returned.
async fn finished(running: &mut Option<RunningTask>) {
    match running {
        Some(task) => {
            let _ = (&mut task.join).await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SyncCapability;
    use async_trait::async_trait;
    use std::time::Duration;

    struct UntilCancelled;

    #[async_trait]
    impl SyncCapability for UntilCancelled {
        async fn run(&self, cancel: CancellationToken) {
            cancel.cancelled().await;
        }
    }

    struct Stubborn;

    #[async_trait]
    impl SyncCapability for Stubborn {
        async fn run(&self, _cancel: CancellationToken) {
            std::future::pending::<()>().await;
        }
    }

    async fn settled(handle: &SupervisorHandle, state: SupervisorState) {
        tokio::time::timeout(Duration::from_secs(5), handle.wait_for_state(state))
            .await
            .expect("supervisor did not settle");
    }

    #[tokio::test]
    async fn test_idle_until_foreground() {
        let (lifecycle_tx, lifecycle_rx) = watch::channel(LifecycleState::Created);
        let session = SessionHandle::with_sync("a", CapabilityHandle::new(UntilCancelled));
        let (_sessions_tx, sessions_rx) = watch::channel(Some(session));

        let handle = SyncSupervisor::default().spawn(lifecycle_rx, sessions_rx, CancellationToken::new());
        tokio::task::yield_now().await;
        assert_eq!(handle.state(), SupervisorState::Idle);

        lifecycle_tx.send_replace(LifecycleState::Started);
        settled(&handle, SupervisorState::Running).await;

        // Started -> Resumed is not a transition.
        lifecycle_tx.send_replace(LifecycleState::Resumed);
        tokio::task::yield_now().await;
        assert_eq!(handle.state(), SupervisorState::Running);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_waiting_without_capability() {
        let (_lifecycle_tx, lifecycle_rx) = watch::channel(LifecycleState::Resumed);
        let (sessions_tx, sessions_rx) = watch::channel(Some(SessionHandle::new("locked")));

        let handle = SyncSupervisor::default().spawn(lifecycle_rx, sessions_rx, CancellationToken::new());
        settled(&handle, SupervisorState::WaitingForSession).await;

        sessions_tx.send_replace(Some(SessionHandle::with_sync("a", CapabilityHandle::new(UntilCancelled))));
        settled(&handle, SupervisorState::Running).await;

        sessions_tx.send_replace(None);
        settled(&handle, SupervisorState::WaitingForSession).await;

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stubborn_task_is_aborted() {
        let (lifecycle_tx, lifecycle_rx) = watch::channel(LifecycleState::Resumed);
        let session = SessionHandle::with_sync("a", CapabilityHandle::new(Stubborn));
        let (_sessions_tx, sessions_rx) = watch::channel(Some(session));

        let config = SupervisorConfig::default().with_shutdown_grace(Duration::from_millis(20));
        let handle = SyncSupervisor::new(config).spawn(lifecycle_rx, sessions_rx, CancellationToken::new());
        settled(&handle, SupervisorState::Running).await;

        lifecycle_tx.send_replace(LifecycleState::Created);
        settled(&handle, SupervisorState::Idle).await;
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_exits_when_inputs_close() {
        let (lifecycle_tx, lifecycle_rx) = watch::channel(LifecycleState::Resumed);
        let session = SessionHandle::with_sync("a", CapabilityHandle::new(UntilCancelled));
        let (sessions_tx, sessions_rx) = watch::channel(Some(session));

        let handle = SyncSupervisor::default().spawn(lifecycle_rx, sessions_rx, CancellationToken::new());
        settled(&handle, SupervisorState::Running).await;

        drop(lifecycle_tx);
        drop(sessions_tx);
        tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("supervisor did not exit")
            .unwrap();
    }
}
