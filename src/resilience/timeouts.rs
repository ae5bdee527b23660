//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap remote calls with their own deadline
//! - Respect the caller's deadline and cancellation as well
//! - Report which limit fired, so only real remote timeouts count against the backend
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities (`timeout_at`), so paused-clock tests work
//! - The effective deadline is the earlier of the remote timeout and the caller deadline
//! - Cancellation wins over completion when both are ready

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

/// Why a bounded call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    /// The remote call's own deadline elapsed.
    #[error("remote call timed out after {0:?}")]
    RemoteTimeout(Duration),

    /// The caller's deadline elapsed first.
    #[error("caller deadline exceeded")]
    CallerDeadline,

    /// The caller cancelled the operation.
    #[error("operation cancelled by caller")]
    Cancelled,
}

/// Run `fut` bounded by `limit`, the caller's `deadline` and `cancel`.
pub async fn run_bounded<F, T>(
    fut: F,
    limit: Duration,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<T, Interrupted>
where
    F: Future<Output = T>,
{
    let remote_deadline = Instant::now() + limit;
    let caller_first = deadline.is_some_and(|d| d <= remote_deadline);
    let effective = match deadline {
        Some(d) if caller_first => d,
        _ => remote_deadline,
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        res = timeout_at(effective, fut) => match res {
            Ok(value) => Ok(value),
            Err(_) if caller_first => Err(Interrupted::CallerDeadline),
            Err(_) => Err(Interrupted::RemoteTimeout(limit)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_completes_within_limit() {
        let token = CancellationToken::new();
        let res = run_bounded(async { 7 }, Duration::from_millis(100), None, &token).await;
        assert_eq!(res, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_timeout_fires() {
        let token = CancellationToken::new();
        let start = Instant::now();
        let res = run_bounded(
            tokio::time::sleep(Duration::from_secs(5)),
            Duration::from_millis(100),
            None,
            &token,
        )
        .await;
        assert_eq!(res, Err(Interrupted::RemoteTimeout(Duration::from_millis(100))));
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_deadline_fires_first() {
        let token = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        let res = run_bounded(
            tokio::time::sleep(Duration::from_secs(5)),
            Duration::from_millis(100),
            Some(deadline),
            &token,
        )
        .await;
        assert_eq!(res, Err(Interrupted::CallerDeadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let res = run_bounded(
            tokio::time::sleep(Duration::from_secs(5)),
            Duration::from_secs(1),
            None,
            &token,
        )
        .await;
        assert_eq!(res, Err(Interrupted::Cancelled));
    }
}
