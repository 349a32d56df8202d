//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! - `request` - path, method, status and latency of every request
//! - `classification` - method, n, k and fit of every fit served
//! - `coloring` - strategy, vertex count and colors used

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing events; aggregate them from the log stream.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "choropleth_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Routes reported under their own path label.
const KNOWN_PATHS: &[&str] = &[
    "/api/classify",
    "/api/classify/pooled",
    "/api/optimize",
    "/api/color",
    "/api/methods",
    "/health",
    "/health/live",
];

/// Normalize path for metrics to avoid high cardinality.
///
/// Strips trailing slashes, keeps known routes and maps everything else to
/// `/api/unknown` or `/other`.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if KNOWN_PATHS.contains(&trimmed) {
        trimmed.to_string()
    } else if trimmed.starts_with("/api/") {
        "/api/unknown".to_string()
    } else {
        "/other".to_string()
    }
}

/// Record classification metrics.
///
/// Call this after a fit is served.
pub fn record_classification_metrics(method: &str, n: usize, k: usize, fit: f64) {
    info!(
        target: "choropleth_kernel::metrics",
        metric_type = "classification",
        method = method,
        n = n,
        k = k,
        fit = fit,
        "classification_metric"
    );
}

/// Record coloring metrics.
pub fn record_coloring_metrics(strategy: &str, vertices: usize, colors: usize) {
    info!(
        target: "choropleth_kernel::metrics",
        metric_type = "coloring",
        strategy = strategy,
        vertices = vertices,
        colors = colors,
        "coloring_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_trims_slash() {
        assert_eq!(normalize_path("/api/classify/"), "/api/classify");
    }

    #[test]
    fn test_normalize_path_buckets_unknown() {
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/favicon.ico"), "/other");
        assert_eq!(normalize_path("/api/classify/pooled"), "/api/classify/pooled");
        assert_eq!(normalize_path("/api/a1b2c3"), "/api/unknown");
        assert_eq!(normalize_path("/api/methods/x/y/z"), "/api/unknown");
        assert_eq!(normalize_path("/health/deep"), "/other");
    }
}
