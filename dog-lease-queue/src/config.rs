use std::time::Duration;

use crate::{QueueError, QueueResult};

pub const DEFAULT_NAMESPACE: &str = "queue";
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(120);
pub const DEFAULT_DONE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_MAX_JOBS_CEILING: usize = 5;
pub const DEFAULT_MAX_DEQUEUE_ATTEMPTS: usize = 10;
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for one queue namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Prefix of every key this queue touches
    pub namespace: String,
    /// How long a lease blocks other workers for the same job
    pub lease_ttl: Duration,
    /// How long a completion marker suppresses duplicates
    pub done_ttl: Duration,
    /// Upper bound for `max_jobs` in a single drain
    pub max_jobs_ceiling: usize,
    /// Pops per dequeue before giving up on a queue full of corrupt entries
    pub max_dequeue_attempts: usize,
    /// Period of the background drainer's scheduled drains
    pub drain_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            lease_ttl: DEFAULT_LEASE_TTL,
            done_ttl: DEFAULT_DONE_TTL,
            max_jobs_ceiling: DEFAULT_MAX_JOBS_CEILING,
            max_dequeue_attempts: DEFAULT_MAX_DEQUEUE_ATTEMPTS,
            drain_interval: DEFAULT_DRAIN_INTERVAL,
        }
    }
}

impl QueueConfig {
    /// Default configuration under a custom namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// | variable                      | field                  |
    /// |-------------------------------|------------------------|
    /// | `QUEUE_NAMESPACE`             | `namespace`            |
    /// | `QUEUE_LEASE_TTL_SECS`        | `lease_ttl`            |
    /// | `QUEUE_DONE_TTL_SECS`         | `done_ttl`             |
    /// | `QUEUE_MAX_JOBS`              | `max_jobs_ceiling`     |
    /// | `QUEUE_MAX_DEQUEUE_ATTEMPTS`  | `max_dequeue_attempts` |
    /// | `QUEUE_DRAIN_INTERVAL_SECS`   | `drain_interval`       |
    ///
    /// A value that is present but unparsable fails the whole load.
    pub fn from_env() -> QueueResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading from an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> QueueResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let namespace = match lookup("QUEUE_NAMESPACE") {
            Some(ns) if ns.trim().is_empty() => {
                return Err(QueueError::config("QUEUE_NAMESPACE must not be empty"));
            }
            Some(ns) => ns,
            None => defaults.namespace,
        };

        let config = Self {
            namespace,
            lease_ttl: secs_var(&lookup, "QUEUE_LEASE_TTL_SECS")?.unwrap_or(defaults.lease_ttl),
            done_ttl: secs_var(&lookup, "QUEUE_DONE_TTL_SECS")?.unwrap_or(defaults.done_ttl),
            max_jobs_ceiling: usize_var(&lookup, "QUEUE_MAX_JOBS")?.unwrap_or(defaults.max_jobs_ceiling),
            max_dequeue_attempts: usize_var(&lookup, "QUEUE_MAX_DEQUEUE_ATTEMPTS")?
                .unwrap_or(defaults.max_dequeue_attempts),
            drain_interval: secs_var(&lookup, "QUEUE_DRAIN_INTERVAL_SECS")?
                .unwrap_or(defaults.drain_interval),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the queue unusable
    pub fn validate(&self) -> QueueResult<()> {
        if self.lease_ttl.is_zero() {
            return Err(QueueError::config("lease_ttl must be positive"));
        }
        if self.done_ttl.is_zero() {
            return Err(QueueError::config("done_ttl must be positive"));
        }
        if self.max_jobs_ceiling == 0 {
            return Err(QueueError::config("max_jobs_ceiling must be at least 1"));
        }
        if self.max_dequeue_attempts == 0 {
            return Err(QueueError::config("max_dequeue_attempts must be at least 1"));
        }
        if self.drain_interval.is_zero() {
            return Err(QueueError::config("drain_interval must be positive"));
        }
        Ok(())
    }

    /// Clamp a caller-supplied job count into `1..=max_jobs_ceiling`
    pub fn clamp_max_jobs(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_jobs_ceiling.max(1))
    }
}

fn usize_var<F>(lookup: &F, key: &str) -> QueueResult<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|e| QueueError::config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

fn secs_var<F>(lookup: &F, key: &str) -> QueueResult<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| QueueError::config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}
