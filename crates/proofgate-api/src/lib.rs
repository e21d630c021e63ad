//! # proofgate-api: HTTP service for asynchronous identity verification
//!
//! Exposes the [`VerificationBroker`](proofgate_broker::VerificationBroker)
//! over HTTP. The broker owns all correlation state; this crate parses
//! requests, maps errors, and wires the NDI client, Record Store, reaper and
//! shutdown together.
//!
//! ## API Surface
//!
//! | Path | Module |
//! |------|--------|
//! | `/api/proof-request`, `/api/proof-results/*`, `/api/proof-status/*` | [`routes::proof`] |
//! | `/api/issue-credential`, `/api/credential-status/*` | [`routes::credential`] |
//! | `/webhook`, `/api/webhook` | [`routes::webhook`] |
//! | `/health/stats` | [`routes::health`] |
//! | `/openapi.json` | [`openapi`] |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod provider;
pub mod routes;
pub mod shutdown;
pub mod state;

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
///
/// Liveness and readiness probes are mounted outside the middleware so they
/// stay cheap and uncounted.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let metrics = state.metrics.clone();
    let health_state = state.clone();

    let api = Router::new()
        .merge(routes::proof::router())
        .merge(routes::credential::router())
        .merge(routes::webhook::router())
        .merge(routes::health::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .layer(cors)
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(health_state);

    Router::new().merge(health).merge(api)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The broker is in-memory; only the Postgres Record Store,
/// when configured, can make the service unready.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    "ready".into_response()
}
