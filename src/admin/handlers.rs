use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::RoutingConfig;
use crate::observability::MetricsSnapshot;
use crate::resilience::{CircuitSnapshot, CircuitState};
use crate::routing::{RoutingContext, RoutingDecision};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub remote_enabled: bool,
    pub canary_percentage: u32,
    pub circuit_state: CircuitState,
    pub remote_timeout_ms: u64,
}

/// Partial routing update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RoutingUpdate {
    pub remote_enabled: Option<bool>,
    pub canary_percentage: Option<u32>,
    pub admin_override: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    #[serde(default)]
    pub caller: String,
    #[serde(default)]
    pub privileged: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let routing = state.facade.routing_config();
    let circuit_state = state.facade.circuit().state();
    let status = match circuit_state {
        CircuitState::Closed => "operational",
        _ => "degraded",
    };

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status,
        remote_enabled: routing.remote_enabled,
        canary_percentage: routing.canary_percentage,
        circuit_state,
        remote_timeout_ms: state.facade.remote_timeout().as_millis() as u64,
    })
}

pub async fn get_routing(State(state): State<AdminState>) -> Json<RoutingConfig> {
    Json(state.facade.routing_config())
}

pub async fn put_routing(
    State(state): State<AdminState>,
    Json(update): Json<RoutingUpdate>,
) -> Result<Json<RoutingConfig>, (StatusCode, String)> {
    if let Some(pct) = update.canary_percentage {
        if pct > 100 {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("canary_percentage must be 0-100, got {}", pct),
            ));
        }
    }

    let routing = state.facade.update_routing(|r| {
        if let Some(enabled) = update.remote_enabled {
            r.remote_enabled = enabled;
        }
        if let Some(pct) = update.canary_percentage {
            r.canary_percentage = pct;
        }
        if let Some(admin_override) = update.admin_override {
            r.admin_override = admin_override;
        }
    });
    Ok(Json(routing))
}

pub async fn get_circuit(State(state): State<AdminState>) -> Json<CircuitSnapshot> {
    Json(state.facade.circuit().snapshot())
}

pub async fn open_circuit(State(state): State<AdminState>) -> Json<CircuitSnapshot> {
    state.facade.circuit().force_open();
    Json(state.facade.circuit().snapshot())
}

pub async fn close_circuit(State(state): State<AdminState>) -> Json<CircuitSnapshot> {
    state.facade.circuit().force_closed();
    Json(state.facade.circuit().snapshot())
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn get_decision(
    State(state): State<AdminState>,
    Query(query): Query<DecisionQuery>,
) -> Json<RoutingDecision> {
    let caller = RoutingContext::new(query.caller, query.privileged);
    Json(state.facade.decide(&caller))
}
