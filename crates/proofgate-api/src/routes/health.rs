//! # Service Counters
//!
//! `GET /health/stats` exposes request counters and broker counters
//! read-only. Liveness and readiness live in [`crate::app`].

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use proofgate_broker::StatsSnapshot;
use serde::Serialize;
use utoipa::ToSchema;

use crate::middleware::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Body of `GET /health/stats`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub http: MetricsSnapshot,
    #[schema(value_type = Object)]
    pub broker: StatsSnapshot,
    pub records_backend: String,
    pub provider_configured: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health/stats", get(stats))
}

/// GET /health/stats
#[utoipa::path(
    get,
    path = "/health/stats",
    responses((status = 200, description = "Counters and table sizes", body = ServiceStats)),
    tag = "health"
)]
pub(crate) async fn stats(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(ServiceStats {
        http: state.metrics.snapshot(),
        broker: state.broker.stats(),
        records_backend: state.records_backend.clone(),
        provider_configured: state.provider_configured,
    })
}
