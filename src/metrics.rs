// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the confession board.
//!
//! Uses the `metrics` crate for backend-agnostic collection. The host
//! process chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `confession_board_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `mode`: byte-estimate, count-cap
//! - `outcome`: empty_store, below_threshold, evicted, store_unavailable
//! - `operation`: estimate, list_oldest, delete, create, wipe

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::eviction::estimate::UsageEstimate;

/// Record a completed eviction check
pub fn record_check(mode: &str, outcome: &str, duration: Duration) {
    counter!(
        "confession_board_checks_total",
        "mode" => mode.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "confession_board_check_seconds",
        "mode" => mode.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record confessions removed by eviction
pub fn record_eviction(deleted: u64) {
    counter!("confession_board_evicted_total").increment(deleted);
}

/// Publish the latest usage estimate
pub fn set_usage(usage: &UsageEstimate) {
    gauge!("confession_board_usage_percent").set(usage.percent_used);
    gauge!("confession_board_estimated_bytes").set(usage.total_bytes_estimate as f64);
    gauge!("confession_board_confessions").set(usage.confession_count as f64);
}

/// Record a failed store call
pub fn record_store_error(operation: &str) {
    counter!(
        "confession_board_store_errors_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a monitor tick skipped because the previous check was still running
pub fn record_monitor_skip() {
    counter!("confession_board_monitor_skipped_total").increment(1);
}

/// Record a post attempt (status: accepted, rejected, error)
pub fn record_post(status: &str) {
    counter!(
        "confession_board_posts_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an administrative wipe
pub fn record_wipe(deleted: u64) {
    counter!("confession_board_wiped_total").increment(deleted);
}
