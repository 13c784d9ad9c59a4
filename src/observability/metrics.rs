//! Metrics collection and exposition.
//!
//! # Metrics
//! - `backend_requests_total` (counter): requests by method, status
//! - `backend_request_duration_seconds` (histogram): latency distribution
//! - `backend_responses_signed_total` (counter): signed responses
//! - `backend_signing_failures_total` (counter): by reason
//! - `backend_untrusted_proxy_total` (counter): rejected peers
//! - `backend_environment_refresh_total` (counter): by outcome
//! - `backend_environment_entries` (gauge): cached entries
//! - `backend_trusted_proxies` (gauge): trusted set size
//!
//! Updates are no-ops until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("backend_requests_total", &labels).increment(1);
    histogram!("backend_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_signed() {
    counter!("backend_responses_signed_total").increment(1);
}

pub fn record_signing_failure(reason: &'static str) {
    counter!("backend_signing_failures_total", "reason" => reason).increment(1);
}

pub fn record_untrusted_proxy() {
    counter!("backend_untrusted_proxy_total").increment(1);
}

pub fn record_cache_refresh(success: bool, entries: usize) {
    let outcome = if success { "success" } else { "failure" };
    counter!("backend_environment_refresh_total", "outcome" => outcome).increment(1);
    gauge!("backend_environment_entries").set(entries as f64);
}

pub fn record_trusted_set_size(size: usize) {
    gauge!("backend_trusted_proxies").set(size as f64);
}
