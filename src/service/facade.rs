//! Dual-path listings facade.
//!
//! # Responsibilities
//! - Single entry point for listing create/get/update/delete/search
//! - Choose remote or local per operation, guard remote with the breaker
//! - Fall back to the local backend on any remote failure
//! - Emit one outcome per logical operation
//!
//! # Data Flow
//! ```text
//! operation(ctx, ...)
//!     → RoutingPolicy::decide (from the current ArcSwap snapshot)
//!     → CircuitBreaker::try_acquire
//!     → run_bounded(remote call, min(remote timeout, caller deadline))
//!     → on failure: LocalBackend
//!     → OperationOutcome → MetricsSink
//! ```
//!
//! # Design Decisions
//! - At most one remote attempt per logical operation, no retries
//! - Local errors are terminal; there is no fallback from local to remote
//! - The routing snapshot is loaded once per operation and never held as a
//!   guard across an await

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{
    Listing, LocalBackend, LocalError, RemoteBackend, RemoteError, RemoteErrorKind, SourceType,
};
use crate::config::{RouterConfig, RoutingConfig};
use crate::observability::{ErrorClass, FallbackReason, MetricsSink, Operation, RoutePath};
use crate::resilience::{run_bounded, CircuitBreaker, Interrupted};
use crate::routing::{RoutingContext, RoutingDecision, RoutingPolicy};
use crate::search::{SearchIndex, SearchParams, SearchResults};
use crate::service::{OperationOutcome, RequestContext, ServiceError};

/// Breaker component name, used as the gauge label.
const REMOTE_COMPONENT: &str = "listings-remote";

/// Hot-swappable part of the configuration.
#[derive(Debug)]
struct Settings {
    policy: RoutingPolicy,
    remote_timeout: Duration,
}

impl Settings {
    fn from_config(config: &RouterConfig) -> Self {
        Self {
            policy: RoutingPolicy::new(config.routing.clone()),
            remote_timeout: config.remote.timeout(),
        }
    }
}

/// Single entry point for listing operations across the local and remote backends.
pub struct ServiceFacade {
    local: Arc<dyn LocalBackend>,
    remote: Arc<dyn RemoteBackend>,
    search: Arc<dyn SearchIndex>,
    settings: ArcSwap<Settings>,
    breaker: CircuitBreaker,
    metrics: Arc<dyn MetricsSink>,
}

impl ServiceFacade {
    pub fn new(
        local: Arc<dyn LocalBackend>,
        remote: Arc<dyn RemoteBackend>,
        search: Arc<dyn SearchIndex>,
        metrics: Arc<dyn MetricsSink>,
        config: &RouterConfig,
    ) -> Self {
        Self {
            local,
            remote,
            search,
            settings: ArcSwap::from_pointee(Settings::from_config(config)),
            breaker: CircuitBreaker::new(REMOTE_COMPONENT, config.circuit_breaker.clone()),
            metrics,
        }
    }

    pub async fn create(&self, ctx: &RequestContext, listing: &Listing) -> Result<i64, ServiceError> {
        check_write(listing)?;
        self.route(
            Operation::Create,
            ctx,
            listing.source_type,
            |remote| async move { remote.create(listing).await.map(|created| created.id) },
            |local| async move { local.create(listing).await },
        )
        .await
    }

    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: i64,
        source_type: SourceType,
    ) -> Result<Listing, ServiceError> {
        let listing = self
            .route(
                Operation::Get,
                ctx,
                source_type,
                |remote| async move { remote.get(id).await },
                |local| async move { local.get(id).await },
            )
            .await?;

        if listing.source_type != source_type {
            return Err(ServiceError::NotFound(format!(
                "{} listing {} not found",
                source_type, id
            )));
        }
        Ok(listing)
    }

    pub async fn update(&self, ctx: &RequestContext, listing: &Listing) -> Result<(), ServiceError> {
        check_write(listing)?;
        if listing.id <= 0 {
            return Err(ServiceError::Validation("update requires a listing id".into()));
        }
        self.route(
            Operation::Update,
            ctx,
            listing.source_type,
            |remote| async move { remote.update(listing).await.map(|_| ()) },
            |local| async move { local.update(listing).await },
        )
        .await
    }

    /// Delete a listing. The remote path looks up the owner first; both
    /// calls share one breaker permit and one deadline.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: i64,
        source_type: SourceType,
    ) -> Result<(), ServiceError> {
        self.route(
            Operation::Delete,
            ctx,
            source_type,
            |remote| async move {
                match remote.get(id).await {
                    Ok(existing) => remote.delete(id, existing.user_id).await,
                    // Not knowing the owner remotely says nothing about the local store.
                    Err(e) if e.kind == RemoteErrorKind::NotFound => Err(RemoteError::application(
                        format!("owner lookup failed: {}", e.message),
                    )),
                    Err(e) => Err(e),
                }
            },
            |local| async move { local.delete(id).await },
        )
        .await
    }

    /// Search goes straight to the index, never through the dual path.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        params: &SearchParams,
    ) -> Result<SearchResults, ServiceError> {
        let span = operation_span(Operation::Search, ctx, None);
        async move {
            if ctx.is_cancelled() || ctx.is_expired() {
                return Err(ServiceError::Cancelled);
            }
            let started = Instant::now();
            let result = self.search.search(params).await;
            self.finish(Operation::Search, OperationOutcome::search(started.elapsed()));

            result.map_err(|e| {
                tracing::warn!(error = %e, "Search failed");
                ServiceError::from(e)
            })
        }
        .instrument(span)
        .await
    }

    /// Swap in routing settings from a freshly loaded config.
    ///
    /// Breaker thresholds are fixed at construction and are not reloaded.
    pub fn reload_routing(&self, config: &RouterConfig) {
        self.settings.store(Arc::new(Settings::from_config(config)));
        tracing::info!(
            remote_enabled = config.routing.remote_enabled,
            canary_percentage = config.routing.canary_percentage,
            timeout_ms = config.remote.timeout_ms,
            "Routing configuration reloaded"
        );
    }

    /// Apply an in-place edit to the routing config and publish it.
    pub fn update_routing<F>(&self, edit: F) -> RoutingConfig
    where
        F: Fn(&mut RoutingConfig),
    {
        self.settings.rcu(|current| {
            let mut routing = current.policy.config().clone();
            edit(&mut routing);
            Settings {
                policy: RoutingPolicy::new(routing),
                remote_timeout: current.remote_timeout,
            }
        });

        let routing = self.routing_config();
        tracing::info!(
            remote_enabled = routing.remote_enabled,
            canary_percentage = routing.canary_percentage,
            admin_override = routing.admin_override,
            "Routing configuration updated"
        );
        routing
    }

    pub fn routing_config(&self) -> RoutingConfig {
        self.settings.load().policy.config().clone()
    }

    pub fn remote_timeout(&self) -> Duration {
        self.settings.load().remote_timeout
    }

    /// Routing decision for a caller under the current snapshot.
    pub fn decide(&self, caller: &RoutingContext) -> RoutingDecision {
        self.settings.load().policy.decide_for(caller)
    }

    pub fn circuit(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn route<T, RF, RFut, LF, LFut>(
        &self,
        op: Operation,
        ctx: &RequestContext,
        source_type: SourceType,
        remote_call: RF,
        local_call: LF,
    ) -> Result<T, ServiceError>
    where
        RF: FnOnce(Arc<dyn RemoteBackend>) -> RFut,
        RFut: Future<Output = Result<T, RemoteError>>,
        LF: FnOnce(Arc<dyn LocalBackend>) -> LFut,
        LFut: Future<Output = Result<T, LocalError>>,
    {
        let span = operation_span(op, ctx, Some(source_type));
        async move {
            if ctx.is_cancelled() || ctx.is_expired() {
                tracing::debug!("Request cancelled or expired before routing");
                return Err(ServiceError::Cancelled);
            }
            let started = Instant::now();

            if !source_type.is_migrating() {
                let result = local_call(self.local.clone()).await;
                self.finish(op, OperationOutcome::local(started.elapsed()));
                return result.map_err(local_failed);
            }

            let settings = self.settings.load_full();
            let decision = settings.policy.decide_for(&ctx.caller);
            tracing::debug!(
                use_remote = decision.use_remote,
                reason = decision.reason.as_str(),
                hash_value = decision.hash_value,
                "Routing decision"
            );

            if !decision.use_remote {
                let result = local_call(self.local.clone()).await;
                self.finish(op, OperationOutcome::local(started.elapsed()));
                return result.map_err(local_failed);
            }

            let (reason, error_kind) = match self.breaker.try_acquire() {
                Err(open) => {
                    tracing::debug!(
                        retry_after_ms = open.retry_after.as_millis() as u64,
                        "Circuit open, skipping remote"
                    );
                    (FallbackReason::CircuitOpen, None)
                }
                Ok(permit) => {
                    let call = remote_call(self.remote.clone());
                    match run_bounded(call, settings.remote_timeout, ctx.deadline, &ctx.cancel).await {
                        Ok(Ok(value)) => {
                            permit.success();
                            self.finish(op, OperationOutcome::remote(started.elapsed()));
                            return Ok(value);
                        }
                        Ok(Err(e))
                            if e.kind == RemoteErrorKind::NotFound
                                && !settings.policy.config().fallback_on_not_found =>
                        {
                            // The service answered, so the dependency is healthy.
                            permit.success();
                            self.finish(op, OperationOutcome::remote(started.elapsed()));
                            return Err(ServiceError::NotFound(e.to_string()));
                        }
                        Ok(Err(e)) => {
                            permit.failure();
                            tracing::warn!(
                                error_kind = e.kind.as_str(),
                                error = %e.message,
                                "Remote call failed"
                            );
                            (FallbackReason::RemoteError, Some(ErrorClass::from(e.kind)))
                        }
                        Err(Interrupted::RemoteTimeout(limit)) => {
                            permit.failure();
                            tracing::warn!(
                                error_kind = "timeout",
                                timeout_ms = limit.as_millis() as u64,
                                "Remote call timed out"
                            );
                            (FallbackReason::RemoteError, Some(ErrorClass::Timeout))
                        }
                        Err(interrupted) => {
                            drop(permit);
                            tracing::debug!(reason = %interrupted, "Caller gave up during remote call");
                            return Err(ServiceError::Cancelled);
                        }
                    }
                }
            };

            if !settings.policy.config().fallback_to_local {
                let outcome = OperationOutcome {
                    fallback_triggered: false,
                    fallback_reason: None,
                    ..OperationOutcome::fallback(RoutePath::Remote, started.elapsed(), reason, error_kind)
                };
                self.finish(op, outcome);
                return Err(ServiceError::Unavailable(format!(
                    "remote {} failed ({}) and local fallback is disabled",
                    op.as_str(),
                    reason.as_str()
                )));
            }

            tracing::info!(fallback_reason = reason.as_str(), "Falling back to local backend");
            let result = local_call(self.local.clone()).await;
            self.finish(
                op,
                OperationOutcome::fallback(RoutePath::Local, started.elapsed(), reason, error_kind),
            );
            result.map_err(local_failed)
        }
        .instrument(span)
        .await
    }

    fn finish(&self, op: Operation, outcome: OperationOutcome) {
        outcome.report(op, self.metrics.as_ref());
        tracing::debug!(
            path = outcome.path.as_str(),
            fallback = outcome.fallback_triggered,
            latency_ms = outcome.latency.as_millis() as u64,
            "Operation finished"
        );
    }
}

fn operation_span(op: Operation, ctx: &RequestContext, source_type: Option<SourceType>) -> tracing::Span {
    tracing::info_span!(
        "listing_op",
        op_id = %Uuid::new_v4(),
        operation = op.as_str(),
        caller = %ctx.caller.caller_id,
        source_type = source_type.map(|s| s.as_str()),
    )
}

fn local_failed(err: LocalError) -> ServiceError {
    if !matches!(err, LocalError::NotFound(_)) {
        tracing::error!(error = %err, "Local backend failed");
    }
    ServiceError::from(err)
}

fn check_write(listing: &Listing) -> Result<(), ServiceError> {
    if listing.source_type == SourceType::B2c && listing.storefront_id.is_none() {
        return Err(ServiceError::Validation(
            "b2c listings require a storefront_id".into(),
        ));
    }
    Ok(())
}
