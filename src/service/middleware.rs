//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! - `request` - Request count by path, method, status with latency
//! - `population` - People, edges removed and source per assembled population

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing events; aggregate them from logs.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "popnet_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces UUIDs and numeric segments with `:id`.
fn normalize_path(path: &str) -> String {
    static ID_SEGMENT: OnceLock<regex_lite::Regex> = OnceLock::new();
    let pattern = ID_SEGMENT.get_or_init(|| {
        regex_lite::Regex::new(
            r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|\b[0-9]+\b",
        )
        .expect("static pattern")
    });

    pattern.replace_all(path, ":id").to_string()
}

/// Record population assembly metrics.
pub fn record_population_metrics(people: usize, edges_removed: usize, source: &str, latency_ms: u64) {
    info!(
        target: "popnet_kernel::metrics",
        metric_type = "population",
        people = people,
        edges_removed = edges_removed,
        source = source,
        latency_ms = latency_ms,
        "population_metric"
    );
}
