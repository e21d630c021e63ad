//! # OpenAPI Document
//!
//! Assembles the utoipa-annotated handlers into one document served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// The API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "proofgate API",
        version = "0.1.0",
        description = "Asynchronous identity verification: proof requests, result polling, provider webhooks, credential issuance.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::proof::create_proof_request,
        crate::routes::proof::poll_proof,
        crate::routes::credential::issue_credential,
        crate::routes::credential::poll_credential,
        crate::routes::webhook::receive_callback,
        crate::routes::health::stats,
    ),
    components(schemas(
        crate::routes::proof::CreateProofRequest,
        crate::routes::proof::CreateProofResponse,
        crate::routes::credential::IssueCredentialBody,
        crate::routes::credential::IssueCredentialResponse,
        crate::routes::webhook::WebhookAck,
        crate::routes::health::ServiceStats,
        crate::routes::PollPending,
        crate::routes::PollError,
        crate::middleware::metrics::MetricsSnapshot,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "proofs", description = "Proof requests and polling"),
        (name = "credentials", description = "Credential offers and polling"),
        (name = "webhook", description = "Provider callbacks"),
        (name = "health", description = "Counters"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/proof-request",
            "/api/proof-results/{handle}",
            "/api/issue-credential",
            "/api/credential-status/{handle}",
            "/webhook",
            "/health/stats",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected} in {paths:?}"
            );
        }
    }
}
