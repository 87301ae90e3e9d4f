use std::sync::Arc;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::debug;

use crate::{JobId, QueueEvent, backend::BoxStream};

/// Event broadcaster plus live counters, shared by every component of one queue
#[derive(Clone)]
pub struct ObservabilityLayer {
    event_broadcaster: broadcast::Sender<QueueEvent>,
    metrics: Arc<super::LiveMetrics>,
}

impl ObservabilityLayer {
    /// Create new observability layer
    pub fn new() -> Self {
        let (event_broadcaster, _) = broadcast::channel(10000);

        Self {
            event_broadcaster,
            metrics: Arc::new(super::LiveMetrics::new()),
        }
    }

    fn emit(&self, event: QueueEvent) {
        debug!(event = event.event_name(), job_id = ?event.job_id(), "queue event");
        // No subscribers is fine
        let _ = self.event_broadcaster.send(event);
    }

    pub fn record_job_enqueued(&self, job_id: &JobId) {
        self.metrics.increment_jobs_enqueued();
        self.emit(QueueEvent::Enqueued {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
    }

    pub fn record_duplicate_suppressed(&self, job_id: &JobId) {
        self.metrics.increment_duplicates_suppressed();
        self.emit(QueueEvent::DuplicateSuppressed {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
    }

    pub fn record_entry_discarded(&self, reason: &str) {
        self.metrics.increment_entries_discarded();
        self.emit(QueueEvent::Discarded {
            reason: reason.to_string(),
            at: Utc::now(),
        });
    }

    pub fn record_lease_contended(&self, job_id: &JobId) {
        self.metrics.increment_leases_contended();
        self.emit(QueueEvent::Contended {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
    }

    pub fn record_job_completed(&self, job_id: &JobId) {
        self.metrics.increment_jobs_completed();
        self.emit(QueueEvent::Completed {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
    }

    pub fn record_job_failed(&self, job_id: &JobId, error: &str) {
        self.metrics.increment_jobs_failed();
        self.emit(QueueEvent::Failed {
            job_id: job_id.clone(),
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    pub fn record_queue_purged(&self) {
        self.metrics.increment_queue_purges();
        self.emit(QueueEvent::Purged { at: Utc::now() });
    }

    /// Subscribe to raw events
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.event_broadcaster.subscribe()
    }

    /// Event stream; lagged receivers skip what they missed
    pub fn event_stream(&self) -> BoxStream<QueueEvent> {
        let stream = BroadcastStream::new(self.subscribe()).filter_map(|result| result.ok());
        Box::pin(stream)
    }

    /// Get live metrics
    pub fn metrics(&self) -> &super::LiveMetrics {
        &self.metrics
    }
}

impl Default for ObservabilityLayer {
    fn default() -> Self {
        Self::new()
    }
}
