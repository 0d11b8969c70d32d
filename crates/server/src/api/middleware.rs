//! HTTP metrics middleware.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

/// Record duration, count and in-flight gauge for each routed request.
///
/// Installed with `route_layer`, so the matched route template (e.g.
/// `/api/v1/repacks/search`) is available and used as the `path` label;
/// query strings never reach the label set.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().as_str().to_owned();

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let status = response.status();
    let labels = [method.as_str(), route.as_str(), status.as_str()];
    HTTP_REQUEST_DURATION.with_label_values(&labels).observe(elapsed);
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}
