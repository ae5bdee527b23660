//! Listings service layer.
//!
//! # Data Flow
//! ```text
//! caller (RequestContext)
//!     → facade.rs (decide, breaker, bounded remote call, local fallback)
//!     → outcome.rs (one OperationOutcome per operation → MetricsSink)
//!     → error.rs (ServiceError, the only error type callers see)
//! ```

pub mod context;
pub mod error;
pub mod facade;
pub mod outcome;

pub use crate::observability::Operation;
pub use context::RequestContext;
pub use error::ServiceError;
pub use facade::ServiceFacade;
pub use outcome::OperationOutcome;
