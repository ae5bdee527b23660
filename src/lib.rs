//! Dual-path listings router.
//!
//! Routes listing CRUD operations between the legacy local store and the
//! replacement listings service, with canary routing, circuit breaking and
//! transparent fallback to the local path.

pub mod admin;
pub mod backend;
pub mod config;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod search;
pub mod service;

pub use config::schema::RouterConfig;
pub use routing::{RoutingContext, RoutingDecision};
pub use service::{RequestContext, ServiceError, ServiceFacade};
