//! Executor counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of an executor's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStats {
    /// Jobs accepted into the queue
    pub submitted: u64,
    /// Jobs taken off the queue and finished, successful or not
    pub completed: u64,
    /// Finished jobs whose persistence failed
    pub failed: u64,
    /// Jobs rejected because the executor was closed
    pub rejected: u64,
    /// Documents in successfully persisted jobs
    pub items_persisted: u64,
}

impl ExecutorStats {
    /// Jobs accepted but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    items_persisted: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unsubmit(&self) {
        self.submitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, items: usize) {
        self.items_persisted
            .fetch_add(items as u64, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            items_persisted: self.items_persisted.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = StatsCounters::default();
        counters.record_submit();
        counters.record_submit();
        counters.record_success(5);
        counters.record_failure();
        counters.record_reject();

        let stats = counters.snapshot();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.items_persisted, 5);
        assert_eq!(stats.in_flight(), 0);
    }
}
