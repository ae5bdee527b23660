//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the listings router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Backend selection policy (feature flag, canary rollout).
    pub routing: RoutingConfig,

    /// Replacement listings service client settings.
    pub remote: RemoteConfig,

    /// Circuit breaker guarding the remote path.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Routing policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Master switch for the remote path.
    pub remote_enabled: bool,

    /// Percentage of callers (0-100) routed to the remote path by hash.
    pub canary_percentage: u32,

    /// Privileged callers always use the remote path.
    pub admin_override: bool,

    /// Callers that always use the remote path.
    pub canary_user_ids: Vec<String>,

    /// Fall back to the local backend when the remote path fails.
    pub fallback_to_local: bool,

    /// Treat a remote "not found" as a failure and retry locally.
    pub fallback_on_not_found: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            canary_percentage: 0,
            admin_override: true,
            canary_user_ids: Vec::new(),
            fallback_to_local: true,
            fallback_on_not_found: false,
        }
    }
}

impl RoutingConfig {
    /// Canary allow-list as a set, with blank entries dropped.
    pub fn canary_set(&self) -> HashSet<String> {
        self.canary_user_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Remote listings service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the listings service (e.g., "http://listings:8080").
    pub base_url: String,

    /// Per-call deadline for remote operations in milliseconds.
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:50053".to_string(),
            timeout_ms: 500,
            connect_timeout_ms: 200,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the circuit breaker. When disabled every call is admitted.
    pub enabled: bool,

    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,

    /// Time spent open before probing again, in seconds.
    pub cooldown_secs: u64,

    /// Maximum concurrent trial calls while half-open.
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            success_threshold: 2,
            cooldown_secs: 30,
            half_open_max_requests: 1,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Placeholder key rejected by validation when the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
