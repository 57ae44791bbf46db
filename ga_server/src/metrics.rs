//! Prometheus metrics for monitoring the arcade server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener when
//! `METRICS_BIND` is set; without an installed recorder every call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ga_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/login", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`. Must be called from
/// within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment login attempts counter, by login step.
pub fn login_attempts_total(step: &'static str, success: bool) {
    metrics::counter!("login_attempts_total",
        "step" => step,
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment registrations counter.
pub fn registrations_total(provider: &'static str) {
    metrics::counter!("registrations_total", "provider" => provider).increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Increment saved game sessions counter.
pub fn game_sessions_saved_total(game: &'static str) {
    metrics::counter!("game_sessions_saved_total", "game" => game).increment(1);
}

/// Increment started tournaments counter.
pub fn tournaments_started_total(game: &'static str) {
    metrics::counter!("tournaments_started_total", "game" => game).increment(1);
}

// ============================================================================
// Presence Metrics
// ============================================================================

/// Record how many users one sweep marked offline.
pub fn presence_swept(count: u64) {
    metrics::counter!("presence_swept_total").increment(count);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(endpoint: &str) {
    metrics::counter!("rate_limit_hits_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}
