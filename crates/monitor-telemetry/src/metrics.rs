//! Prometheus metrics for the price monitor.
//!
//! Covers the poll loop and the fact cache:
//! - Observer connection state
//! - Blocks received and decode failures
//! - Per-stage I/O errors (write/read)
//! - Per-slot updates, extraction errors and cache size
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means duplicate
//! metric names, a fatal configuration error that should crash at startup.
//! These panics only occur during static initialization.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_int_counter, CounterVec,
    Encoder, Gauge, GaugeVec, IntCounter, TextEncoder,
};

/// Observer connection state (1 = connected, 0 = closed).
pub static OBSERVER_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "monitor_observer_connected",
        "Observer connection state (1=connected)"
    )
    .unwrap()
});

/// Blocks received from the observer.
/// Labels: outcome (parsed/decode_error)
pub static BLOCKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "monitor_blocks_total",
        "Blocks received from the observer",
        &["outcome"]
    )
    .unwrap()
});

/// Poll cycle I/O failures.
/// Labels: stage (write/read)
pub static POLL_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "monitor_poll_errors_total",
        "Observer I/O failures in the poll loop",
        &["stage"]
    )
    .unwrap()
});

/// Cache slot installs.
/// Labels: slot (rates/supply)
pub static SLOT_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "monitor_slot_updates_total",
        "Cache slot replacements",
        &["slot"]
    )
    .unwrap()
});

/// Malformed fact fields.
/// Labels: slot (rates/supply)
pub static EXTRACT_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "monitor_extract_errors_total",
        "Fact extractions abandoned due to malformed fields",
        &["slot"]
    )
    .unwrap()
});

/// Denominations currently cached.
/// Labels: slot (rates/supply)
pub static CACHED_DENOMS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "monitor_cached_denoms",
        "Denominations held in each cache slot",
        &["slot"]
    )
    .unwrap()
});

/// Supply denominations priced at 0 because the oracle has no rate.
pub static UNTRACKED_DENOM_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "monitor_untracked_denom_total",
        "Price entries emitted without an oracle rate"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record observer connected.
    pub fn observer_connected() {
        OBSERVER_CONNECTED.set(1.0);
    }

    /// Record observer closed.
    pub fn observer_closed() {
        OBSERVER_CONNECTED.set(0.0);
    }

    /// Record a block that parsed.
    pub fn block_parsed() {
        BLOCKS_TOTAL.with_label_values(&["parsed"]).inc();
    }

    /// Record a payload that failed to decode.
    pub fn block_decode_error() {
        BLOCKS_TOTAL.with_label_values(&["decode_error"]).inc();
    }

    /// Record a poll loop I/O failure.
    pub fn poll_error(stage: &str) {
        POLL_ERRORS_TOTAL.with_label_values(&[stage]).inc();
    }

    /// Record a slot install and its new size.
    pub fn slot_updated(slot: &str, denoms: usize) {
        SLOT_UPDATES_TOTAL.with_label_values(&[slot]).inc();
        CACHED_DENOMS.with_label_values(&[slot]).set(denoms as f64);
    }

    /// Record an abandoned extraction.
    pub fn extract_error(slot: &str) {
        EXTRACT_ERRORS_TOTAL.with_label_values(&[slot]).inc();
    }

    /// Record a supply denom without an oracle rate.
    pub fn untracked_denom() {
        UNTRACKED_DENOM_TOTAL.inc();
    }

    /// Render every registered metric in Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_updated_sets_gauge() {
        Metrics::slot_updated("rates", 3);
        assert_eq!(CACHED_DENOMS.with_label_values(&["rates"]).get(), 3.0);
        assert!(SLOT_UPDATES_TOTAL.with_label_values(&["rates"]).get() >= 1.0);
    }

    #[test]
    fn test_gather_text_contains_counters() {
        Metrics::block_parsed();
        Metrics::poll_error("read");
        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("monitor_blocks_total"));
        assert!(text.contains("monitor_poll_errors_total"));
    }
}
