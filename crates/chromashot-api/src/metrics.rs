//! Prometheus metrics for the API server.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use chromashot_media::MediaResult;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "chromashot_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "chromashot_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "chromashot_http_requests_in_flight";

    // Conversion metrics
    pub const CONVERSIONS_TOTAL: &str = "chromashot_conversions_total";
    pub const CONVERSION_DURATION_SECONDS: &str = "chromashot_conversion_duration_seconds";

    // Artifact metrics
    pub const IMAGES_SERVED_TOTAL: &str = "chromashot_images_served_total";
    pub const ARTIFACTS_SWEPT_TOTAL: &str = "chromashot_artifacts_swept_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of one conversion, labelled with the failing stage.
pub fn record_conversion(result: &MediaResult<()>, elapsed: Duration) {
    let (outcome, stage) = match result {
        Ok(()) => ("success", "none"),
        Err(e) => ("failure", e.stage().map_or("unknown", |s| s.as_str())),
    };
    let labels = [("outcome", outcome.to_string()), ("stage", stage.to_string())];

    counter!(names::CONVERSIONS_TOTAL, &labels).increment(1);
    histogram!(names::CONVERSION_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
}

/// Record an image handed out.
pub fn record_image_served() {
    counter!(names::IMAGES_SERVED_TOTAL).increment(1);
}

/// Record abandoned artifacts removed by the sweeper.
pub fn record_artifacts_swept(count: usize) {
    counter!(names::ARTIFACTS_SWEPT_TOTAL).increment(count as u64);
}

/// Collapse per-image paths so ids don't explode label cardinality.
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/image/") {
        "/image/:id".to_string()
    } else {
        path.to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
