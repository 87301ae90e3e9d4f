use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobId;

/// Structured events emitted by the queue, lease, ledger and driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueueEvent {
    /// Job was appended to the queue
    Enqueued {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// Producer skipped a job already marked done
    DuplicateSuppressed {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// A corrupt entry was popped and dropped
    Discarded {
        reason: String,
        at: DateTime<Utc>,
    },

    /// Lease was held by someone else; the job was skipped
    Contended {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// Job processed and marked done
    Completed {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// Job processing failed; the job is dropped
    Failed {
        job_id: JobId,
        error: String,
        at: DateTime<Utc>,
    },

    /// The whole queue was deleted
    Purged {
        at: DateTime<Utc>,
    },
}

impl QueueEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Enqueued { .. } => "enqueued",
            Self::DuplicateSuppressed { .. } => "duplicate_suppressed",
            Self::Discarded { .. } => "discarded",
            Self::Contended { .. } => "contended",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Purged { .. } => "purged",
        }
    }

    /// Get the job ID, for events tied to one job
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Enqueued { job_id, .. }
            | Self::DuplicateSuppressed { job_id, .. }
            | Self::Contended { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. } => Some(job_id),
            Self::Discarded { .. } | Self::Purged { .. } => None,
        }
    }
}
