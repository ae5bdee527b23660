//! Per-request context handed to every facade operation.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::routing::RoutingContext;

/// Caller identity plus the caller's deadline and cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub caller: RoutingContext,
    /// Absolute deadline; the remote wait never outlives it.
    pub deadline: Option<Instant>,
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(caller: RoutingContext) -> Self {
        Self {
            caller,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn for_user(user_id: i64) -> Self {
        Self::new(RoutingContext::for_user(user_id, false))
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the caller's deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| d <= Instant::now())
    }
}
