//! Metrics for player identity resolution
//!
//! Prometheus counters for cache traffic and backend calls.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Lookups by direction and whether an entry already existed
    pub static ref IDENTITY_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "identity_lookups_total",
        "Total number of identity lookups",
        &["direction", "outcome"]
    )
    .unwrap();

    /// Backend calls by tier and outcome
    pub static ref IDENTITY_BACKEND_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "identity_backend_calls_total",
        "Total number of identity backend calls",
        &["tier", "outcome"]
    )
    .unwrap();

    /// Pairs seeded without a lookup
    pub static ref IDENTITY_POPULATE_TOTAL: IntCounter = register_int_counter!(
        "identity_populate_total",
        "Total number of identity pairs populated incidentally"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a cache lookup
pub fn record_lookup(direction: &str, hit: bool) {
    IDENTITY_LOOKUPS_TOTAL
        .with_label_values(&[direction, if hit { "hit" } else { "miss" }])
        .inc();
}

/// Record a backend call
pub fn record_backend_call(tier: &str, outcome: &str) {
    IDENTITY_BACKEND_CALLS_TOTAL
        .with_label_values(&[tier, outcome])
        .inc();
}

/// Record an incidental populate
pub fn record_populate() {
    IDENTITY_POPULATE_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lookup() {
        record_lookup("id_to_name", true);
        record_lookup("id_to_name", false);
        let metrics = render_metrics();
        assert!(metrics.contains("identity_lookups_total"));
    }

    #[test]
    fn test_record_backend_call() {
        record_backend_call("profile_by_id", "found");
        let metrics = render_metrics();
        assert!(metrics.contains("identity_backend_calls_total"));
    }

    #[test]
    fn test_record_populate() {
        let before = IDENTITY_POPULATE_TOTAL.get();
        record_populate();
        assert!(IDENTITY_POPULATE_TOTAL.get() > before);
        assert!(render_metrics().contains("identity_populate_total"));
    }
}
