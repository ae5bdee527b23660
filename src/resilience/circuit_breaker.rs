//! Circuit breaker for the remote listings backend.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: backend assumed down, calls fail fast
//! - Half-Open: a bounded number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: cooldown elapsed since the circuit opened
//! Half-Open → Closed: consecutive_successes >= success_threshold
//! Half-Open → Open: any trial failure
//! ```
//!
//! # Design Decisions
//! - One mutex guards state, counters and trial slots; admission and the
//!   Open → Half-Open transition happen under the same lock
//! - Admission hands out a [`CircuitPermit`]; dropping it unreported frees
//!   its trial slot without counting as success or failure
//! - Every transition bumps a generation; reports from permits issued in an
//!   earlier generation are ignored
//! - Rejections are not failures and never re-arm the failure counter

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;

/// Circuit breaker states.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

/// Synthetic error returned when the circuit rejects a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circuit '{component}' is open (retry in {retry_after:?})")]
pub struct CircuitOpenError {
    pub component: String,
    pub retry_after: Duration,
}

/// Point-in-time view of the breaker, for admin and logs.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub enabled: bool,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub trials_in_flight: u32,
    pub millis_since_transition: u64,
    pub rejected_total: u64,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    trials_in_flight: u32,
    last_transition: Instant,
    generation: u64,
    rejected_total: u64,
}

/// Circuit breaker shared by every request of one facade.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        tracing::info!(
            component = %name,
            enabled = config.enabled,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            cooldown_secs = config.cooldown_secs,
            "Circuit breaker initialized"
        );
        record_state_gauge(&name, CircuitState::Closed);

        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                trials_in_flight: 0,
                last_transition: Instant::now(),
                generation: 0,
                rejected_total: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. Does not advance Open → Half-Open; only admission does.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Ask for permission to call the protected backend.
    pub fn try_acquire(&self) -> Result<CircuitPermit<'_>, CircuitOpenError> {
        if !self.config.enabled {
            return Ok(CircuitPermit::untracked(self));
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(CircuitPermit::new(self, inner.generation, false)),
            CircuitState::Open => {
                let elapsed = inner.last_transition.elapsed();
                let cooldown = self.config.cooldown();
                if elapsed >= cooldown {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.trials_in_flight = 1;
                    Ok(CircuitPermit::new(self, inner.generation, true))
                } else {
                    inner.rejected_total += 1;
                    Err(self.rejection(cooldown - elapsed))
                }
            }
            CircuitState::HalfOpen => {
                if inner.trials_in_flight < self.config.half_open_max_requests {
                    inner.trials_in_flight += 1;
                    Ok(CircuitPermit::new(self, inner.generation, true))
                } else {
                    inner.rejected_total += 1;
                    Err(self.rejection(Duration::ZERO))
                }
            }
        }
    }

    /// Force the circuit open (operator action).
    pub fn force_open(&self) {
        tracing::warn!(component = %self.name, "Circuit breaker forced open");
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Open);
    }

    /// Force the circuit closed (operator action).
    pub fn force_closed(&self) {
        tracing::warn!(component = %self.name, "Circuit breaker forced closed");
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Closed);
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            name: self.name.clone(),
            enabled: self.config.enabled,
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
            trials_in_flight: inner.trials_in_flight,
            millis_since_transition: inner.last_transition.elapsed().as_millis() as u64,
            rejected_total: inner.rejected_total,
        }
    }

    fn on_success(&self, generation: u64, trial: bool) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        if trial {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }

        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            // No permit is ever issued in an open generation.
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64, trial: bool) {
        let mut inner = self.lock();
        if inner.generation != generation {
            return;
        }
        if trial {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            CircuitState::Open => {}
        }
    }

    fn on_release(&self, generation: u64, trial: bool) {
        if !trial {
            return;
        }
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.consecutive_failures = 0;
        inner.consecutive_successes = 0;
        inner.trials_in_flight = 0;
        inner.last_transition = Instant::now();

        match to {
            CircuitState::Open => tracing::warn!(
                component = %self.name,
                from = ?from,
                cooldown_secs = self.config.cooldown_secs,
                "Circuit breaker opened (failing fast)"
            ),
            CircuitState::HalfOpen => tracing::info!(
                component = %self.name,
                success_threshold = self.config.success_threshold,
                "Circuit breaker half-open (probing recovery)"
            ),
            CircuitState::Closed => tracing::info!(
                component = %self.name,
                from = ?from,
                "Circuit breaker closed"
            ),
        }
        record_state_gauge(&self.name, to);
    }

    fn rejection(&self, retry_after: Duration) -> CircuitOpenError {
        CircuitOpenError {
            component: self.name.clone(),
            retry_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // Counters stay consistent even if a holder panicked; every update is a single step.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_state_gauge(name: &str, state: CircuitState) {
    metrics::gauge!("listings_circuit_state", "component" => name.to_string()).set(state as u8 as f64);
}

/// Permission to make one call through the breaker.
///
/// Report the outcome with [`CircuitPermit::success`] or
/// [`CircuitPermit::failure`]. Dropping the permit without reporting frees
/// its trial slot (e.g. when the caller cancelled mid-call).
#[derive(Debug)]
#[must_use = "report the call outcome through the permit"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    tracked: bool,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64, trial: bool) -> Self {
        Self {
            breaker,
            generation,
            trial,
            tracked: true,
            settled: false,
        }
    }

    fn untracked(breaker: &'a CircuitBreaker) -> Self {
        Self {
            breaker,
            generation: 0,
            trial: false,
            tracked: false,
            settled: false,
        }
    }

    /// Whether this permit is a half-open trial call.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        if self.tracked {
            self.breaker.on_success(self.generation, self.trial);
        }
    }

    pub fn failure(mut self) {
        self.settled = true;
        if self.tracked {
            self.breaker.on_failure(self.generation, self.trial);
        }
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.tracked {
            self.breaker.on_release(self.generation, self.trial);
        }
    }
}
