//! Prometheus metrics for the eventostec services.
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, EventMetrics};
//!
//! init_metrics()?;
//! EventMetrics::record_event_created(false);
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod events;
pub mod middleware;

pub use events::{EventMetrics, QueryKind, UploadTimer};
pub use middleware::metrics_middleware;

pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Later calls return the same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();
        Ok(handle)
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// `/metrics` in Prometheus text format
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP requests answered with 4xx or 5xx"
    );

    describe_counter!(
        "events_created_total",
        "Events created, labelled by remote flag"
    );
    describe_counter!(
        "image_uploads_total",
        "Event image uploads to object storage by status"
    );
    describe_histogram!(
        "image_upload_duration_seconds",
        "Time spent uploading an event image"
    );
    describe_counter!(
        "event_queries_total",
        "Event listing and lookup queries by kind"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_handler_renders_recorded_counters() {
        let handle = init_metrics().unwrap();
        let again = init_metrics().unwrap();
        assert!(std::ptr::eq(handle, again));

        EventMetrics::record_event_created(true);

        let body = metrics_handler().await;
        assert!(body.contains("events_created_total"));
    }
}
