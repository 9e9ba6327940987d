// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the adapter.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `instantsearch_adapter_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: search, facet_search
//! - `outcome`: hit, coalesced, success, no_rewrite, error, timeout
//! - `status`: success, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record the outcome of one enhancement lookup
pub fn record_enhancement(outcome: &'static str) {
    counter!(
        "instantsearch_adapter_enhancements_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record latency of one outbound enhancement call
pub fn record_enhancement_latency(duration: Duration) {
    histogram!("instantsearch_adapter_enhancement_seconds").record(duration.as_secs_f64());
}

/// Set number of memoized enhancement entries
pub fn set_enhancement_cache_entries(count: usize) {
    gauge!("instantsearch_adapter_enhancement_cache_entries").set(count as f64);
}

/// Record a multi-search call
pub fn record_multi_search(operation: &'static str, status: &'static str) {
    counter!(
        "instantsearch_adapter_multi_search_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

/// Record number of searches in one multi-search batch
pub fn record_batch_size(count: usize) {
    histogram!("instantsearch_adapter_batch_size").record(count as f64);
}

/// Record multi-search latency
pub fn record_latency(operation: &'static str, duration: Duration) {
    histogram!(
        "instantsearch_adapter_multi_search_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());
}

/// Record a request rejected before any network call (bad filter, unknown sort)
pub fn record_request_error(kind: &'static str) {
    counter!(
        "instantsearch_adapter_request_errors_total",
        "kind" => kind
    )
    .increment(1);
}

/// Record an error reported by Typesense for one search in a batch
pub fn record_engine_error(kind: &'static str) {
    counter!(
        "instantsearch_adapter_engine_errors_total",
        "kind" => kind
    )
    .increment(1);
}

/// Record a configuration reload or cache clear
pub fn record_reset(reason: &'static str) {
    counter!(
        "instantsearch_adapter_resets_total",
        "reason" => reason
    )
    .increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests verify the API compiles and doesn't panic.
    // Without an installed recorder every call is a no-op.

    #[test]
    fn test_enhancement_metrics() {
        record_enhancement("hit");
        record_enhancement("timeout");
        record_enhancement_latency(Duration::from_millis(12));
        set_enhancement_cache_entries(3);
    }

    #[test]
    fn test_search_metrics() {
        record_multi_search("search", "success");
        record_multi_search("facet_search", "error");
        record_batch_size(4);
        record_request_error("geo");
        record_engine_error("missing_hits");
        record_reset("clear_cache");
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("search");
            std::thread::sleep(Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
