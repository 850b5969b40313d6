//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): proxied requests by method, status, backend
//! - `lb_request_duration_seconds` (histogram): time until the backend answered
//! - `lb_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `lb_health_checks_total` (counter): probes by backend and result
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("lb_requests_total", "Requests proxied to a backend");
    describe_histogram!(
        "lb_request_duration_seconds",
        "Latency of proxied requests until the backend responded"
    );
    describe_gauge!("lb_backend_health", "1 if the backend is healthy, 0 otherwise");
    describe_counter!("lb_health_checks_total", "Health probes issued");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the outcome of one proxied request. `backend` is "none" when no
/// backend was selected.
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    metrics::counter!(
        "lb_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);

    metrics::histogram!("lb_request_duration_seconds", "backend" => backend.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a probe result and the resulting health gauge.
pub fn record_health_check(backend: &str, healthy: bool) {
    let result = if healthy { "success" } else { "failure" };
    metrics::counter!(
        "lb_health_checks_total",
        "backend" => backend.to_string(),
        "result" => result
    )
    .increment(1);

    metrics::gauge!("lb_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
