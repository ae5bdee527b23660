//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (percentages, thresholds, timeouts)
//! - Check the remote base URL parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{RouterConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routing.canary_percentage must be within 0..=100 (got {0})")]
    CanaryPercentage(u32),

    #[error("{field} must be at least 1")]
    ZeroThreshold { field: &'static str },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("remote.base_url is not a valid URL: {0}")]
    BaseUrl(String),

    #[error("{field} is not a valid socket address: {value}")]
    Address { field: &'static str, value: String },

    #[error("admin.api_key must be changed when the admin API is enabled")]
    PlaceholderApiKey,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routing.canary_percentage > 100 {
        errors.push(ValidationError::CanaryPercentage(config.routing.canary_percentage));
    }

    let cb = &config.circuit_breaker;
    for (field, value) in [
        ("circuit_breaker.failure_threshold", cb.failure_threshold),
        ("circuit_breaker.success_threshold", cb.success_threshold),
        ("circuit_breaker.half_open_max_requests", cb.half_open_max_requests),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroThreshold { field });
        }
    }

    if config.remote.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "remote.timeout_ms" });
    }
    if config.remote.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "remote.connect_timeout_ms" });
    }

    if let Err(e) = Url::parse(&config.remote.base_url) {
        errors.push(ValidationError::BaseUrl(format!("{} ({})", config.remote.base_url, e)));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.admin.enabled {
        if config.admin.api_key == PLACEHOLDER_API_KEY || config.admin.api_key.is_empty() {
            errors.push(ValidationError::PlaceholderApiKey);
        }
        if config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::Address {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.routing.canary_percentage = 150;
        config.circuit_breaker.failure_threshold = 0;
        config.remote.timeout_ms = 0;
        config.remote.base_url = "not a url".to_string();
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::CanaryPercentage(150)));
        assert!(errors.contains(&ValidationError::ZeroThreshold {
            field: "circuit_breaker.failure_threshold"
        }));
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "remote.timeout_ms" }));
        assert!(errors.contains(&ValidationError::PlaceholderApiKey));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::BaseUrl(_))));
        assert_eq!(errors.len(), 5);
    }
}
