//! Application lifecycle signal.

/// Lifecycle state of the hosting application.
///
/// Sync only runs while the application is in the foreground
/// ([`Started`](Self::Started) or [`Resumed`](Self::Resumed)).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    #[default]
    Initialized,
    Created,
    Started,
    Resumed,
    Destroyed,
}

impl LifecycleState {
    /// Whether sync is allowed to run in this state.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Started | Self::Resumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        let active: Vec<_> = [
            LifecycleState::Initialized,
            LifecycleState::Created,
            LifecycleState::Started,
            LifecycleState::Resumed,
            LifecycleState::Destroyed,
        ]
        .into_iter()
        .filter(LifecycleState::is_active)
        .collect();

        assert_eq!(active, vec![LifecycleState::Started, LifecycleState::Resumed]);
        assert!(!LifecycleState::default().is_active());
    }
}
