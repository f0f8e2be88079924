//! Sessions and the sync capability they expose.
//!
//! Identity matters here, not equality: two handles are "the same session"
//! only if they point at the same allocation. A session that is torn down
//! and rebuilt with identical contents is a new session and gets a fresh
//! sync task.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Something that keeps a session in sync until cancelled.
#[async_trait]
pub trait SyncCapability: Send + Sync {
    /// Run until `cancel` fires.
    ///
    /// Implementations must return promptly once the token is cancelled.
    async fn run(&self, cancel: CancellationToken);
}

/// Shared handle to a [`SyncCapability`], compared by identity.
#[derive(Clone)]
pub struct CapabilityHandle(Arc<dyn SyncCapability>);

impl CapabilityHandle {
    /// Wrap a capability in a new handle with its own identity.
    pub fn new(capability: impl SyncCapability + 'static) -> Self {
        Self(Arc::new(capability))
    }

    /// Wrap an already shared capability; clones of `capability` share identity.
    pub fn from_arc(capability: Arc<dyn SyncCapability>) -> Self {
        Self(capability)
    }

    /// Whether both handles refer to the same capability instance.
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }

    /// Run the capability until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        self.0.run(cancel).await
    }
}

impl PartialEq for CapabilityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for CapabilityHandle {}

impl fmt::Debug for CapabilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityHandle({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

struct SessionInner {
    account_id: String,
    capability: Option<CapabilityHandle>,
}

/// The current user session, as published to the supervisor.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    /// A session without sync capability (e.g. locked).
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                account_id: account_id.into(),
                capability: None,
            }),
        }
    }

    /// A session that can sync.
    pub fn with_sync(account_id: impl Into<String>, capability: CapabilityHandle) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                account_id: account_id.into(),
                capability: Some(capability),
            }),
        }
    }

    /// Account the session belongs to.
    pub fn account_id(&self) -> &str {
        &self.inner.account_id
    }

    /// The session-scoped sync capability, if the session has one.
    pub fn sync_capability(&self) -> Option<CapabilityHandle> {
        self.inner.capability.clone()
    }

    /// Whether both handles refer to the same session instance.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("account_id", &self.inner.account_id)
            .field("capability", &self.inner.capability)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    #[async_trait]
    impl SyncCapability for Idle {
        async fn run(&self, cancel: CancellationToken) {
            cancel.cancelled().await;
        }
    }

    #[test]
    fn test_capability_identity() {
        let a = CapabilityHandle::new(Idle);
        let b = CapabilityHandle::new(Idle);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_identity_is_not_structural() {
        let capability = CapabilityHandle::new(Idle);
        let first = SessionHandle::with_sync("alice", capability.clone());
        let second = SessionHandle::with_sync("alice", capability.clone());

        assert!(first.same_as(&first.clone()));
        assert!(!first.same_as(&second));
        // Same capability behind both sessions.
        assert_eq!(first.sync_capability(), second.sync_capability());
        assert!(SessionHandle::new("alice").sync_capability().is_none());
    }

    #[tokio::test]
    async fn test_run_returns_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        CapabilityHandle::new(Idle).run(token).await;
    }
}
