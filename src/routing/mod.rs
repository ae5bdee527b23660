//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RoutingContext (caller id, privileged flag)
//!     → decision.rs (feature flag → admin override → canary list → hash rollout)
//!     → hash.rs (stable FNV-1a bucket)
//!     → Return: RoutingDecision { use_remote, reason, is_canary, hash_value }
//! ```
//!
//! # Design Decisions
//! - Policies are compiled per config snapshot, immutable at runtime
//! - Deterministic: same caller always gets the same backend (session affinity)
//! - Health is orthogonal; the circuit breaker gates the remote call separately

pub mod decision;
pub mod hash;

pub use decision::{RoutingContext, RoutingDecision, RoutingPolicy, RoutingReason};
