//! Backend selection policy.
//!
//! # Responsibilities
//! - Decide per caller whether an operation should try the remote path
//! - Honour the global feature flag, admin override and canary rollout
//!
//! # Design Decisions
//! - Pure function of (config, caller): no I/O, no clocks, no randomness
//! - Same caller + same config always yields the same decision
//! - Backend health is not consulted here; that is the circuit breaker's job

use std::collections::HashSet;

use serde::Serialize;

use crate::config::RoutingConfig;
use crate::routing::hash;

/// Identity of the caller an operation is performed for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingContext {
    pub caller_id: String,
    pub is_privileged: bool,
}

impl RoutingContext {
    pub fn new(caller_id: impl Into<String>, is_privileged: bool) -> Self {
        Self {
            caller_id: caller_id.into(),
            is_privileged,
        }
    }

    /// Context for a numeric user id, the form the auth layer hands us.
    pub fn for_user(user_id: i64, is_privileged: bool) -> Self {
        Self::new(user_id.to_string(), is_privileged)
    }

    /// Unauthenticated caller. Hashes the empty string.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Why a routing decision was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingReason {
    Disabled,
    AdminOverride,
    CanaryUser,
    CanaryHash,
    Default,
}

impl RoutingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingReason::Disabled => "disabled",
            RoutingReason::AdminOverride => "admin-override",
            RoutingReason::CanaryUser => "canary-user",
            RoutingReason::CanaryHash => "canary-hash",
            RoutingReason::Default => "default",
        }
    }
}

/// Outcome of a routing decision. Immutable and safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub use_remote: bool,
    pub reason: RoutingReason,
    pub is_canary: bool,
    pub hash_value: u32,
}

/// Compiled routing policy, built once per configuration snapshot.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    config: RoutingConfig,
    canary_users: HashSet<String>,
}

impl RoutingPolicy {
    pub fn new(config: RoutingConfig) -> Self {
        let canary_users = config.canary_set();
        Self {
            config,
            canary_users,
        }
    }

    /// The configuration this policy was built from.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Decide whether the caller's operation should attempt the remote path.
    pub fn decide(&self, caller_id: &str, is_privileged: bool) -> RoutingDecision {
        let hash_value = hash::stable_hash(caller_id);
        let decision = |use_remote, reason, is_canary| RoutingDecision {
            use_remote,
            reason,
            is_canary,
            hash_value,
        };

        if !self.config.remote_enabled {
            return decision(false, RoutingReason::Disabled, false);
        }

        if is_privileged && self.config.admin_override {
            return decision(true, RoutingReason::AdminOverride, false);
        }

        if self.canary_users.contains(caller_id) {
            return decision(true, RoutingReason::CanaryUser, true);
        }

        let percentage = self.config.canary_percentage;
        if percentage > hash::BUCKETS {
            tracing::warn!(
                canary_percentage = percentage,
                "Canary percentage out of range, routing to local backend"
            );
            return decision(false, RoutingReason::Default, false);
        }

        if hash::bucket(hash_value) < percentage {
            return decision(true, RoutingReason::CanaryHash, true);
        }

        decision(false, RoutingReason::Default, false)
    }

    /// Convenience wrapper over [`RoutingPolicy::decide`].
    pub fn decide_for(&self, ctx: &RoutingContext) -> RoutingDecision {
        self.decide(&ctx.caller_id, ctx.is_privileged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(remote_enabled: bool, canary_percentage: u32, admin_override: bool) -> RoutingPolicy {
        RoutingPolicy::new(RoutingConfig {
            remote_enabled,
            canary_percentage,
            admin_override,
            canary_user_ids: vec!["vip".to_string()],
            ..RoutingConfig::default()
        })
    }

    #[test]
    fn test_disabled_wins_over_everything() {
        let p = policy(false, 100, true);
        for (caller, privileged) in [("vip", true), ("vip", false), ("1", false), ("", true)] {
            let d = p.decide(caller, privileged);
            assert!(!d.use_remote);
            assert_eq!(d.reason, RoutingReason::Disabled);
        }
    }

    #[test]
    fn test_admin_override() {
        let p = policy(true, 0, true);
        let d = p.decide("admin", true);
        assert!(d.use_remote);
        assert_eq!(d.reason, RoutingReason::AdminOverride);
        assert!(!d.is_canary);

        // Same caller without privilege falls through to the rollout rule
        let d = p.decide("admin", false);
        assert!(!d.use_remote);
        assert_eq!(d.reason, RoutingReason::Default);
    }

    #[test]
    fn test_admin_override_disabled() {
        let p = policy(true, 0, false);
        let d = p.decide("admin", true);
        assert!(!d.use_remote);
        assert_ne!(d.reason, RoutingReason::AdminOverride);
    }

    #[test]
    fn test_canary_user_ignores_zero_rollout() {
        let p = policy(true, 0, false);
        let d = p.decide("vip", false);
        assert!(d.use_remote);
        assert!(d.is_canary);
        assert_eq!(d.reason, RoutingReason::CanaryUser);
    }

    #[test]
    fn test_hash_rollout() {
        // Buckets: "1" → 44, "3" → 82
        let p = policy(true, 50, false);

        let d = p.decide("1", false);
        assert!(d.use_remote);
        assert_eq!(d.reason, RoutingReason::CanaryHash);
        assert!(d.is_canary);

        let d = p.decide("3", false);
        assert!(!d.use_remote);
        assert_eq!(d.reason, RoutingReason::Default);
    }

    #[test]
    fn test_rollout_follows_bucket() {
        let p = policy(true, 25, false);
        for i in 0..500 {
            let caller = i.to_string();
            let d = p.decide(&caller, false);
            assert_eq!(d.use_remote, hash::bucket(d.hash_value) < 25);
        }
    }

    #[test]
    fn test_full_and_zero_rollout() {
        let full = policy(true, 100, false);
        let none = policy(true, 0, false);
        for i in 0..200 {
            let caller = format!("user-{}", i);
            assert!(full.decide(&caller, false).use_remote);
            assert!(!none.decide(&caller, false).use_remote);
        }
    }

    #[test]
    fn test_decision_is_deterministic() {
        let a = policy(true, 30, true);
        let b = policy(true, 30, true);
        for i in 0..500 {
            let caller = i.to_string();
            let first = a.decide(&caller, false);
            assert_eq!(first, a.decide(&caller, false));
            // A freshly built policy (as after a restart) agrees
            assert_eq!(first, b.decide(&caller, false));
        }
    }

    #[test]
    fn test_anonymous_caller() {
        // Empty caller hashes to bucket 61
        let ctx = RoutingContext::anonymous();
        assert!(policy(true, 62, false).decide_for(&ctx).use_remote);
        assert!(!policy(true, 61, false).decide_for(&ctx).use_remote);
    }

    #[test]
    fn test_out_of_range_percentage_defaults_to_local() {
        let d = policy(true, 250, false).decide("1", false);
        assert!(!d.use_remote);
        assert_eq!(d.reason, RoutingReason::Default);
    }
}
