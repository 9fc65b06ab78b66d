//! Logging and metrics setup

use crate::config::LogFormat;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "fraudserve=info,tower_http=info";

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool, format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("fraudserve=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Install the Prometheus recorder and return handle for rendering
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    describe_metrics();
    info!("Metrics exporter initialized");
    Ok(handle)
}

/// Register descriptions for the service's metrics
pub fn describe_metrics() {
    metrics::describe_counter!(
        "fraudserve_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "fraudserve_predictions_total",
        "Total number of scored transactions by predicted label"
    );
    metrics::describe_counter!("fraudserve_errors_total", "Total number of errors by type");
    metrics::describe_histogram!(
        "fraudserve_inference_latency_us",
        metrics::Unit::Microseconds,
        "Vectorization and inference latency in microseconds per request"
    );
}
