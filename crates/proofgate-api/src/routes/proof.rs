//! # Proof Requests
//!
//! - `POST /api/proof-request` dispatches a proof request and returns the
//!   handle to poll with.
//! - `GET /api/proof-results/:handle` (and the `/api/proof-status/:handle`
//!   alias) polls it.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use proofgate_core::{ProofKind, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::routes::{poll_response, require_provider};
use crate::state::AppState;

/// Body of `POST /api/proof-request`. An empty body means `normal`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateProofRequest {
    /// `normal` (foundational ID) or `agent` (CFA credential).
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
}

impl CreateProofRequest {
    fn proof_kind(&self) -> Result<ProofKind, ValidationError> {
        match self.kind.as_deref() {
            None => Ok(ProofKind::default()),
            Some(k) => k.trim().parse(),
        }
    }
}

/// 201 body of `POST /api/proof-request`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProofResponse {
    /// Handle to poll with.
    pub handle: String,
    /// URL for the holder's wallet, usually rendered as a QR code.
    pub provider_qr_or_url: String,
    /// The provider's thread id.
    pub provider_ref: String,
    pub kind: String,
}

/// Build the proof router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/proof-request", post(create_proof_request))
        .route("/api/proof-results/:handle", get(poll_proof))
        .route("/api/proof-status/:handle", get(poll_proof))
}

/// POST /api/proof-request
#[utoipa::path(
    post,
    path = "/api/proof-request",
    request_body = CreateProofRequest,
    responses(
        (status = 201, description = "Proof request dispatched", body = CreateProofResponse),
        (status = 400, description = "Unknown kind or malformed body", body = crate::error::ErrorBody),
        (status = 502, description = "Provider dispatch failed", body = crate::error::ErrorBody),
        (status = 503, description = "Provider not configured", body = crate::error::ErrorBody),
    ),
    tag = "proofs"
)]
pub(crate) async fn create_proof_request(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateProofResponse>), AppError> {
    let req: CreateProofRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateProofRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?
    };
    let kind = req.proof_kind()?;
    require_provider(&state)?;

    let created = state.broker.create_request(kind).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateProofResponse {
            handle: created.handle.to_string(),
            provider_qr_or_url: created.client_url,
            provider_ref: created.provider_ref.to_string(),
            kind: kind.to_string(),
        }),
    ))
}

/// GET /api/proof-results/{handle}
#[utoipa::path(
    get,
    path = "/api/proof-results/{handle}",
    params(("handle" = String, Path, description = "Handle returned by the create call")),
    responses(
        (status = 200, description = "Terminal verification result"),
        (status = 202, description = "Still waiting for the provider", body = crate::routes::PollPending),
        (status = 400, description = "Malformed handle", body = crate::routes::PollError),
        (status = 404, description = "Unknown or expired handle", body = crate::routes::PollError),
    ),
    tag = "proofs"
)]
pub(crate) async fn poll_proof(State(state): State<AppState>, Path(handle): Path<String>) -> Response {
    poll_response(&handle, |h| state.broker.poll(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_defaults_to_normal() {
        assert_eq!(CreateProofRequest::default().proof_kind().unwrap(), ProofKind::Normal);
    }

    #[test]
    fn kind_accepts_type_alias() {
        let req: CreateProofRequest = serde_json::from_str(r#"{"type":"agent"}"#).unwrap();
        assert_eq!(req.proof_kind().unwrap(), ProofKind::Agent);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let req: CreateProofRequest = serde_json::from_str(r#"{"kind":"premium"}"#).unwrap();
        assert!(req.proof_kind().is_err());
    }
}
