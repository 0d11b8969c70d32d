//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Index builds (outcome, duration, indexed repacks)
//! - Searches (outcome, latency, result counts)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Index Builds
// =============================================================================

/// Index builds total by result.
pub static INDEX_BUILDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("repackhub_index_builds_total", "Total repack index builds"),
        &["result"], // "success", "store_error"
    )
    .unwrap()
});

/// Index build duration in seconds.
pub static INDEX_BUILD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "repackhub_index_build_duration_seconds",
            "Duration of a full repack index build",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .unwrap()
});

/// Repacks held by the live index.
pub static INDEXED_REPACKS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "repackhub_indexed_repacks",
        "Number of repacks in the live index",
    )
    .unwrap()
});

// =============================================================================
// Searches
// =============================================================================

/// Searches total by result.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("repackhub_searches_total", "Total repack searches"),
        &["result"], // "success", "not_built"
    )
    .unwrap()
});

/// Search latency in seconds, measured inside the worker.
pub static SEARCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "repackhub_search_duration_seconds",
            "Time spent answering one search",
        )
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
    )
    .unwrap()
});

/// Results returned per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("repackhub_search_results", "Number of results per search")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Builds
        Box::new(INDEX_BUILDS.clone()),
        Box::new(INDEX_BUILD_DURATION.clone()),
        Box::new(INDEXED_REPACKS.clone()),
        // Searches
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
    ]
}
