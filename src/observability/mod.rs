//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceFacade / CircuitBreaker / backends produce:
//!     → logging.rs (structured tracing events, one span per operation)
//!     → metrics.rs (route latency, remote error kinds, fallbacks)
//!
//! Consumers:
//!     → stdout (json or pretty)
//!     → Prometheus scrape endpoint
//!     → admin API counter snapshot
//! ```
//!
//! # Design Decisions
//! - Metrics are side-effects only and can never fail an operation
//! - The facade talks to a `MetricsSink` trait so tests can assert on counts

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{
    init_metrics, ErrorClass, FallbackReason, MetricsSink, MetricsSnapshot, Operation,
    RouteMetrics, RoutePath,
};
