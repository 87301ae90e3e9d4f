use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Infrastructure errors for queue, lease and ledger operations
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueueError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Outcome of a failed processing attempt.
///
/// Jobs are never retried by the driver, so there is no retryable/permanent
/// split: every variant ends the job's run.
#[derive(Error, Debug, Clone)]
pub enum JobError {
    /// The processor returned an error
    #[error("Job failed: {0}")]
    Failed(String),

    /// The processor panicked
    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Create a failure from a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            Self::Failed(msg) | Self::Panicked(msg) => msg,
        }
    }
}

impl From<QueueError> for JobError {
    fn from(err: QueueError) -> Self {
        Self::Failed(err.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}
