//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RouterConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `LISTINGS_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut RouterConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// Unparseable or out-of-range values are ignored with a warning; the
/// configured value is kept.
pub fn apply_overrides_from<F>(config: &mut RouterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("LISTINGS_REMOTE_ENABLED") {
        match parse_bool(&raw) {
            Some(v) => config.routing.remote_enabled = v,
            None => warn_ignored("LISTINGS_REMOTE_ENABLED", &raw),
        }
    }

    if let Some(raw) = lookup("LISTINGS_CANARY_PERCENT") {
        match raw.trim().parse::<u32>() {
            Ok(v) if v <= 100 => config.routing.canary_percentage = v,
            _ => warn_ignored("LISTINGS_CANARY_PERCENT", &raw),
        }
    }

    if let Some(raw) = lookup("LISTINGS_ADMIN_OVERRIDE") {
        match parse_bool(&raw) {
            Some(v) => config.routing.admin_override = v,
            None => warn_ignored("LISTINGS_ADMIN_OVERRIDE", &raw),
        }
    }

    if let Some(raw) = lookup("LISTINGS_FALLBACK_TO_LOCAL") {
        match parse_bool(&raw) {
            Some(v) => config.routing.fallback_to_local = v,
            None => warn_ignored("LISTINGS_FALLBACK_TO_LOCAL", &raw),
        }
    }

    if let Some(raw) = lookup("LISTINGS_CANARY_USER_IDS") {
        config.routing.canary_user_ids = raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(raw) = lookup("LISTINGS_REMOTE_URL") {
        if url::Url::parse(&raw).is_ok() {
            config.remote.base_url = raw;
        } else {
            warn_ignored("LISTINGS_REMOTE_URL", &raw);
        }
    }

    if let Some(raw) = lookup("LISTINGS_REMOTE_TIMEOUT_MS") {
        match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => config.remote.timeout_ms = v,
            _ => warn_ignored("LISTINGS_REMOTE_TIMEOUT_MS", &raw),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn warn_ignored(key: &str, value: &str) {
    tracing::warn!(key, value, "Ignoring invalid environment override");
}
