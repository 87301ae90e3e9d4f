pub mod metrics;
pub mod analytics;

pub use metrics::{LiveMetrics, MetricsSnapshot};
pub use analytics::ObservabilityLayer;

/// Install a global `tracing` subscriber filtered by `RUST_LOG`.
///
/// `json` switches to one JSON object per line for log shippers. Returns an
/// error if a global subscriber is already installed.
#[cfg(feature = "tracing-basic")]
pub fn init_tracing(json: bool) -> crate::QueueResult<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| crate::QueueError::Internal(format!("tracing init failed: {e}")))
}
