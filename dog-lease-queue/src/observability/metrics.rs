use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Live counters for queue operations
#[derive(Debug, Default)]
pub struct LiveMetrics {
    jobs_enqueued: AtomicU64,
    duplicates_suppressed: AtomicU64,
    entries_discarded: AtomicU64,
    leases_contended: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    queue_purges: AtomicU64,
}

/// Point-in-time copy of `LiveMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub jobs_enqueued: u64,
    pub duplicates_suppressed: u64,
    pub entries_discarded: u64,
    pub leases_contended: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub queue_purges: u64,
}

impl MetricsSnapshot {
    /// Share of finished jobs that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let finished = self.jobs_completed + self.jobs_failed;
        if finished == 0 {
            100.0
        } else {
            (self.jobs_completed as f64 / finished as f64) * 100.0
        }
    }
}

impl LiveMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_jobs_enqueued(&self) {
        self.jobs_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicates_suppressed(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_entries_discarded(&self) {
        self.entries_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_leases_contended(&self) {
        self.leases_contended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queue_purges(&self) {
        self.queue_purges.fetch_add(1, Ordering::Relaxed);
    }

    // Getters for global metrics
    pub fn jobs_enqueued(&self) -> u64 {
        self.jobs_enqueued.load(Ordering::Relaxed)
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_enqueued: self.jobs_enqueued.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
            entries_discarded: self.entries_discarded.load(Ordering::Relaxed),
            leases_contended: self.leases_contended.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            queue_purges: self.queue_purges.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let metrics = LiveMetrics::new();
        metrics.increment_jobs_enqueued();
        metrics.increment_jobs_enqueued();
        metrics.increment_jobs_completed();
        metrics.increment_jobs_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_enqueued, 2);
        assert_eq!(snapshot.jobs_completed, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.success_rate(), 50.0);
    }

    #[test]
    fn test_success_rate_defaults_to_full() {
        assert_eq!(MetricsSnapshot::default().success_rate(), 100.0);
    }
}
