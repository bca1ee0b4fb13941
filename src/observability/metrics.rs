//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by outcome
//! - `router_dispatch_duration_seconds` (histogram): path change to `load`
//! - `router_routes_registered` (gauge): size of the route table
//! - `router_config_reloads_total` (counter): reloads by result
//! - `router_audience_lookups_total` (counter): geolocation lookups by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus endpoint is only started for long-running modes

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(outcome: &'static str, start: Instant) {
    metrics::counter!("router_dispatch_total", "outcome" => outcome).increment(1);
    metrics::histogram!("router_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_routes_registered(count: usize) {
    metrics::gauge!("router_routes_registered").set(count as f64);
}

pub fn record_config_reload(success: bool) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("router_config_reloads_total", "result" => result).increment(1);
}

pub fn record_audience_lookup(success: bool) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("router_audience_lookups_total", "result" => result).increment(1);
}
