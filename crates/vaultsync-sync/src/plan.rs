//! The output of one reconciliation pass.

use std::fmt;

/// Everything that has to happen to bring a local and a remote snapshot
/// back in agreement.
///
/// Entries borrow from the snapshots passed to the engine. Each local and
/// each remote record appears in at most one entry across all four lists.
#[derive(Debug)]
pub struct ReconciliationPlan<'a, L, R> {
    /// Local tombstones to propagate: delete the remote entry.
    pub remote_deletes: Vec<(&'a L, &'a R)>,
    /// Records gone from remote, or deleted locally before ever syncing:
    /// delete locally.
    pub local_deletes: Vec<(&'a L, Option<&'a R>)>,
    /// Local content to push: create (`None`) or update the remote entry.
    pub remote_puts: Vec<(&'a L, Option<&'a R>)>,
    /// Remote content to pull: create (`None`) or overwrite the local record.
    pub local_puts: Vec<(Option<&'a L>, &'a R)>,
}

impl<'a, L, R> ReconciliationPlan<'a, L, R> {
    /// An empty plan.
    pub fn new() -> Self {
        Self {
            remote_deletes: Vec::new(),
            local_deletes: Vec::new(),
            remote_puts: Vec::new(),
            local_puts: Vec::new(),
        }
    }

    /// Whether the snapshots are already consistent.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.remote_deletes.len() + self.local_deletes.len() + self.remote_puts.len() + self.local_puts.len()
    }

    /// Per-list entry counts.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            remote_deletes: self.remote_deletes.len(),
            local_deletes: self.local_deletes.len(),
            remote_puts: self.remote_puts.len(),
            local_puts: self.local_puts.len(),
        }
    }
}

impl<'a, L, R> Default for ReconciliationPlan<'a, L, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry counts of a [`ReconciliationPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub remote_deletes: usize,
    pub local_deletes: usize,
    pub remote_puts: usize,
    pub local_puts: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pull {} / push {} / delete local {} / delete remote {}",
            self.local_puts, self.remote_puts, self.local_deletes, self.remote_deletes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan() {
        let plan: ReconciliationPlan<'_, u8, u8> = ReconciliationPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.summary(), PlanSummary::default());
    }

    #[test]
    fn test_summary_counts() {
        let (a, b) = (1u8, 2u8);
        let mut plan = ReconciliationPlan::new();
        plan.local_puts.push((None, &b));
        plan.remote_puts.push((&a, None));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.summary().to_string(), "pull 1 / push 1 / delete local 0 / delete remote 0");
    }
}
