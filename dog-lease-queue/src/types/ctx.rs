use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What started a drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Periodic drain from a scheduler or the drainer's ticker
    Scheduled,
    /// Administrative, on-demand drain
    Manual,
    /// Best-effort wake-up fired by a producer
    Kick,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
            Self::Kick => "kick",
        };
        f.write_str(name)
    }
}

/// Per-drain context carried through logs and events.
///
/// Every drain gets its own `request_id`; nothing is counted process-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueCtx {
    /// Unique id of this drain invocation
    pub request_id: String,

    /// What started the drain
    pub trigger: Trigger,

    /// Optional trace ID for distributed tracing
    pub trace_id: Option<String>,
}

impl QueueCtx {
    /// Create a context with a fresh request id
    pub fn new(trigger: Trigger) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            trigger,
            trace_id: None,
        }
    }

    /// Context for a scheduled drain
    pub fn scheduled() -> Self {
        Self::new(Trigger::Scheduled)
    }

    /// Context for an on-demand drain
    pub fn manual() -> Self {
        Self::new(Trigger::Manual)
    }

    /// Add a trace ID for distributed tracing
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}
