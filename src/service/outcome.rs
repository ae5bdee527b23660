//! Per-operation outcome, produced once per logical operation.

use std::time::Duration;

use crate::observability::{ErrorClass, FallbackReason, MetricsSink, Operation, RoutePath};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationOutcome {
    /// Backend that produced the result (or the last one tried).
    pub path: RoutePath,
    pub attempted_remote: bool,
    pub fallback_triggered: bool,
    pub latency: Duration,
    /// Set only for real remote failures, never for circuit rejections.
    pub error_kind: Option<ErrorClass>,
    pub fallback_reason: Option<FallbackReason>,
}

impl OperationOutcome {
    pub fn local(latency: Duration) -> Self {
        Self {
            path: RoutePath::Local,
            attempted_remote: false,
            fallback_triggered: false,
            latency,
            error_kind: None,
            fallback_reason: None,
        }
    }

    pub fn remote(latency: Duration) -> Self {
        Self {
            path: RoutePath::Remote,
            attempted_remote: true,
            ..Self::local(latency)
        }
    }

    pub fn search(latency: Duration) -> Self {
        Self {
            path: RoutePath::Search,
            ..Self::local(latency)
        }
    }

    /// The remote path was chosen but the operation ended elsewhere.
    pub fn fallback(
        path: RoutePath,
        latency: Duration,
        reason: FallbackReason,
        error_kind: Option<ErrorClass>,
    ) -> Self {
        Self {
            path,
            attempted_remote: true,
            fallback_triggered: true,
            latency,
            error_kind,
            fallback_reason: Some(reason),
        }
    }

    /// Push this outcome into a metrics sink.
    pub fn report(&self, operation: Operation, sink: &dyn MetricsSink) {
        sink.observe_route_duration(self.path, operation, self.latency.as_secs_f64());
        if let Some(class) = self.error_kind {
            sink.record_error(class);
        }
        if let Some(reason) = self.fallback_reason {
            sink.record_fallback(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::RouteMetrics;

    #[test]
    fn test_circuit_rejection_records_no_error() {
        let metrics = RouteMetrics::new();
        OperationOutcome::fallback(
            RoutePath::Local,
            Duration::from_millis(2),
            FallbackReason::CircuitOpen,
            None,
        )
        .report(Operation::Get, &metrics);

        let snap = metrics.snapshot();
        assert_eq!(snap.local_operations, 1);
        assert_eq!(snap.fallbacks_circuit_open, 1);
        assert_eq!(snap.total_errors(), 0);
    }
}
