//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, LISTINGS_* env overrides)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → routing snapshot swapped into the ServiceFacade
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → ServiceFacade::reload_routing swaps the routing snapshot atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes replace the whole snapshot
//! - All fields have defaults to allow minimal configs
//! - Circuit breaker thresholds are fixed for the lifetime of a facade

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AdminConfig, CircuitBreakerConfig, LogFormat, ObservabilityConfig, RemoteConfig,
    RouterConfig, RoutingConfig,
};
pub use validation::{validate_config, ValidationError};
