//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the routing metrics (route latency, remote errors, fallbacks)
//! - Expose a Prometheus-compatible scrape endpoint
//! - Keep in-process counters for the admin API and tests
//!
//! # Metrics
//! - `listings_route_duration_seconds` (histogram): latency by path, operation
//! - `listings_remote_errors_total` (counter): remote failures by kind
//! - `listings_fallbacks_total` (counter): fallbacks by reason
//! - `listings_circuit_state` (gauge): 0=closed, 1=open, 2=half-open
//!
//! # Design Decisions
//! - Low-overhead updates (atomic increments, no locks)
//! - Label values are closed enums, never free-form strings

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use serde::Serialize;

use crate::backend::RemoteErrorKind;

const ROUTE_DURATION: &str = "listings_route_duration_seconds";
const REMOTE_ERRORS: &str = "listings_remote_errors_total";
const FALLBACKS: &str = "listings_fallbacks_total";

/// Tuned around the 500ms default remote timeout.
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Which backend served an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePath {
    Remote,
    Local,
    Search,
}

impl RoutePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutePath::Remote => "remote",
            RoutePath::Local => "local",
            RoutePath::Search => "search",
        }
    }
}

/// Logical operation performed through the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    Search,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Search => "search",
        }
    }
}

/// Remote failure classification as exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Timeout,
    ConnectionRefused,
    ApplicationError,
    Unknown,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Timeout => "timeout",
            ErrorClass::ConnectionRefused => "connection_refused",
            ErrorClass::ApplicationError => "application_error",
            ErrorClass::Unknown => "unknown",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl From<RemoteErrorKind> for ErrorClass {
    fn from(kind: RemoteErrorKind) -> Self {
        match kind {
            RemoteErrorKind::Timeout => ErrorClass::Timeout,
            RemoteErrorKind::Connection => ErrorClass::ConnectionRefused,
            RemoteErrorKind::NotFound | RemoteErrorKind::Application => {
                ErrorClass::ApplicationError
            }
            RemoteErrorKind::Unknown => ErrorClass::Unknown,
        }
    }
}

/// Why the local backend served an operation routed to remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Breaker rejected the call; the network was never touched.
    CircuitOpen,
    /// The remote call failed or timed out.
    RemoteError,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::CircuitOpen => "circuit_open",
            FallbackReason::RemoteError => "remote_error",
        }
    }
}

/// Receiver of routing observations. Implementations must not block.
pub trait MetricsSink: Send + Sync {
    fn observe_route_duration(&self, path: RoutePath, operation: Operation, seconds: f64);
    fn record_error(&self, class: ErrorClass);
    fn record_fallback(&self, reason: FallbackReason);
}

/// Point-in-time copy of the in-process counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub remote_operations: u64,
    pub local_operations: u64,
    pub search_operations: u64,
    pub errors_timeout: u64,
    pub errors_connection_refused: u64,
    pub errors_application: u64,
    pub errors_unknown: u64,
    pub fallbacks_circuit_open: u64,
    pub fallbacks_remote_error: u64,
}

impl MetricsSnapshot {
    pub fn total_errors(&self) -> u64 {
        self.errors_timeout + self.errors_connection_refused + self.errors_application + self.errors_unknown
    }

    pub fn total_fallbacks(&self) -> u64 {
        self.fallbacks_circuit_open + self.fallbacks_remote_error
    }
}

/// Default sink: atomic counters plus the global `metrics` recorder.
#[derive(Debug, Default)]
pub struct RouteMetrics {
    remote: AtomicU64,
    local: AtomicU64,
    search: AtomicU64,
    errors: [AtomicU64; 4],
    circuit_open: AtomicU64,
    remote_error: AtomicU64,
}

impl RouteMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            remote_operations: load(&self.remote),
            local_operations: load(&self.local),
            search_operations: load(&self.search),
            errors_timeout: load(&self.errors[ErrorClass::Timeout.index()]),
            errors_connection_refused: load(&self.errors[ErrorClass::ConnectionRefused.index()]),
            errors_application: load(&self.errors[ErrorClass::ApplicationError.index()]),
            errors_unknown: load(&self.errors[ErrorClass::Unknown.index()]),
            fallbacks_circuit_open: load(&self.circuit_open),
            fallbacks_remote_error: load(&self.remote_error),
        }
    }
}

impl MetricsSink for RouteMetrics {
    fn observe_route_duration(&self, path: RoutePath, operation: Operation, seconds: f64) {
        let counter = match path {
            RoutePath::Remote => &self.remote,
            RoutePath::Local => &self.local,
            RoutePath::Search => &self.search,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::histogram!(
            ROUTE_DURATION,
            "path" => path.as_str(),
            "operation" => operation.as_str()
        )
        .record(seconds);
    }

    fn record_error(&self, class: ErrorClass) {
        self.errors[class.index()].fetch_add(1, Ordering::Relaxed);
        metrics::counter!(REMOTE_ERRORS, "kind" => class.as_str()).increment(1);
    }

    fn record_fallback(&self, reason: FallbackReason) {
        let counter = match reason {
            FallbackReason::CircuitOpen => &self.circuit_open,
            FallbackReason::RemoteError => &self.remote_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(FALLBACKS, "reason" => reason.as_str()).increment(1);
    }
}

/// Install the Prometheus exporter and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime. Failures are logged; the
/// router keeps working without an exporter.
pub fn init_metrics(addr: SocketAddr) {
    let installed = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(ROUTE_DURATION.to_string()), LATENCY_BUCKETS)
        .and_then(|builder| builder.install());

    match installed {
        Ok(()) => {
            metrics::describe_histogram!(ROUTE_DURATION, "Listing operation latency by path");
            metrics::describe_counter!(REMOTE_ERRORS, "Remote listing service failures by kind");
            metrics::describe_counter!(FALLBACKS, "Operations served locally after routing to remote");
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}
