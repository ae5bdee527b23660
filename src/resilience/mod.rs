//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Remote call:
//!     → circuit_breaker.rs (admit, or reject without touching the network)
//!     → timeouts.rs (enforce remote deadline, caller deadline, cancellation)
//!     → permit reports success / failure back to the breaker
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every remote call has a deadline
//! - No retries: at most one remote attempt per logical operation, the
//!   local backend is the fallback
//! - Circuit breaker prevents paying the remote timeout over and over

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitOpenError, CircuitPermit, CircuitSnapshot, CircuitState};
pub use timeouts::{run_bounded, Interrupted};
