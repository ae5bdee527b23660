//! Operator admin API.
//!
//! # Responsibilities
//! - Expose routing, circuit and counter state
//! - Toggle the remote path and canary rollout at runtime
//! - Force the circuit open or closed
//!
//! # Design Decisions
//! - Every route sits behind bearer-key auth
//! - Routing changes go through the facade's snapshot swap, same as reloads

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::observability::RouteMetrics;
use crate::service::ServiceFacade;

#[derive(Clone)]
pub struct AdminState {
    pub facade: Arc<ServiceFacade>,
    pub metrics: Arc<RouteMetrics>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(facade: Arc<ServiceFacade>, metrics: Arc<RouteMetrics>, api_key: &str) -> Self {
        Self {
            facade,
            metrics,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routing", get(get_routing).put(put_routing))
        .route("/admin/decision", get(get_decision))
        .route("/admin/circuit", get(get_circuit))
        .route("/admin/circuit/open", post(open_circuit))
        .route("/admin/circuit/close", post(close_circuit))
        .route("/admin/metrics", get(get_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
