//! Prometheus metrics exposed by the server.
//!
//! Server-side collectors (HTTP, WebSocket, stored collection size) live
//! here; index build and search collectors come from
//! [`repackhub_core::metrics`] and are registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::state::AppState;

/// Registry served on `/api/v1/metrics`.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for collector in server_collectors()
        .into_iter()
        .chain(repackhub_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(collector) {
            tracing::error!("Failed to register metric: {}", e);
        }
    }
    registry
});

// HTTP

/// Request latency by method, route template and status.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "repackhub_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("repackhub_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "repackhub_http_requests_in_flight",
        "HTTP requests currently being served",
    )
    .unwrap()
});

// WebSocket

pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "repackhub_ws_connections_active",
        "Open WebSocket connections",
    )
    .unwrap()
});

pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "repackhub_ws_connections_total",
        "WebSocket connections accepted since start",
    )
    .unwrap()
});

/// Frames sent to clients, by frame type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "repackhub_ws_messages_sent_total",
            "WebSocket frames sent to clients",
        ),
        &["type"],
    )
    .unwrap()
});

/// Times a client fell behind the index notification channel.
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "repackhub_ws_lag_events_total",
        "Index notifications skipped by lagging WebSocket clients",
    )
    .unwrap()
});

// Collection

/// Rows in the persisted collection; differs from the live index until the
/// next build.
pub static STORED_REPACKS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "repackhub_stored_repacks",
        "Repacks in the persisted collection",
    )
    .unwrap()
});

fn server_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(WS_CONNECTIONS_TOTAL.clone()),
        Box::new(WS_MESSAGES_SENT.clone()),
        Box::new(WS_LAG_EVENTS.clone()),
        Box::new(STORED_REPACKS.clone()),
    ]
}

/// Refresh gauges that are read from state at scrape time.
pub fn collect_dynamic_metrics(state: &AppState) {
    match state.store().count() {
        Ok(count) => STORED_REPACKS.set(count as i64),
        Err(e) => tracing::warn!("Failed to count stored repacks: {}", e),
    }
}

/// Render the registry in the Prometheus text format.
pub fn encode_metrics() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
