//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by route, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_rate_limited_total` (counter): rejections by scope
//! - `gateway_rate_limit_entries` (gauge): live window entries after a sweep
//! - `gateway_backend_calls_total` (counter): backend outcomes
//! - `gateway_backend_duration_seconds` (histogram): backend latency
//! - `gateway_cache_lookups_total` (counter): hits and misses by cache
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(scope: &str) {
    counter!("gateway_rate_limited_total", "scope" => scope.to_string()).increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    gauge!("gateway_rate_limit_entries").set(count as f64);
}

pub fn record_backend_call(outcome: &'static str) {
    counter!("gateway_backend_calls_total", "outcome" => outcome).increment(1);
}

pub fn record_backend_duration(start: Instant) {
    histogram!("gateway_backend_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("gateway_cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}
