//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): requests by operation, status
//! - `bridge_request_duration_seconds` (histogram): time to response by operation
//! - `bridge_publish_total` (counter): events handed to the session
//! - `bridge_call_outcomes_total` (counter): call results by outcome (success, error, fault)
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record a completed request.
pub fn record_request(operation: &'static str, status: u16, start_time: Instant) {
    ::metrics::counter!(
        "bridge_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("bridge_request_duration_seconds", "operation" => operation)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_publish() {
    ::metrics::counter!("bridge_publish_total").increment(1);
}

pub fn record_call_outcome(outcome: &'static str) {
    ::metrics::counter!("bridge_call_outcomes_total", "outcome" => outcome).increment(1);
}
