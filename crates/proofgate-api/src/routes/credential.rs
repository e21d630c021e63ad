//! # Credential Issuance
//!
//! - `POST /api/issue-credential` sends a credential offer to the holder.
//! - `GET /api/credential-status/:handle` polls for acceptance.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use proofgate_broker::CredentialOffer;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{poll_response, require_provider};
use crate::state::AppState;

/// Body of `POST /api/issue-credential`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialBody {
    /// Attribute values, keyed by schema attribute name.
    #[schema(value_type = Object)]
    pub credential_data: serde_json::Value,
    pub schema_id: String,
    #[serde(alias = "holderDID")]
    pub holder_did: String,
    pub for_relationship: String,
}

impl Validate for IssueCredentialBody {
    fn validate(&self) -> Result<(), String> {
        if !self.credential_data.is_object() {
            return Err("credentialData must be a JSON object".into());
        }
        Ok(())
    }
}

impl From<IssueCredentialBody> for CredentialOffer {
    fn from(body: IssueCredentialBody) -> Self {
        Self {
            credential_data: body.credential_data,
            schema_id: body.schema_id,
            holder_did: body.holder_did,
            for_relationship: body.for_relationship,
        }
    }
}

/// 201 body of `POST /api/issue-credential`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialResponse {
    pub handle: String,
    /// Offer URL, when the provider returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_url: Option<String>,
    pub provider_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_id: Option<String>,
}

/// Build the credential router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/issue-credential", post(issue_credential))
        .route("/api/credential-status/:handle", get(poll_credential))
}

/// POST /api/issue-credential
#[utoipa::path(
    post,
    path = "/api/issue-credential",
    request_body = IssueCredentialBody,
    responses(
        (status = 201, description = "Credential offer sent", body = IssueCredentialResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorBody),
        (status = 502, description = "Provider dispatch failed", body = crate::error::ErrorBody),
        (status = 503, description = "Provider not configured", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn issue_credential(
    State(state): State<AppState>,
    body: Result<Json<IssueCredentialBody>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueCredentialResponse>), AppError> {
    let offer = CredentialOffer::from(extract_validated_json(body)?);
    require_provider(&state)?;

    let created = state.broker.issue_credential(&offer).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueCredentialResponse {
            handle: created.handle.to_string(),
            credential_url: created.client_url,
            provider_ref: created.provider_ref.to_string(),
            revocation_id: created.revocation_id,
        }),
    ))
}

/// GET /api/credential-status/{handle}
#[utoipa::path(
    get,
    path = "/api/credential-status/{handle}",
    params(("handle" = String, Path, description = "Handle returned by the issue call")),
    responses(
        (status = 200, description = "Holder accepted or rejected the offer"),
        (status = 202, description = "Offer outstanding", body = crate::routes::PollPending),
        (status = 400, description = "Malformed handle", body = crate::routes::PollError),
        (status = 404, description = "Unknown or expired handle", body = crate::routes::PollError),
    ),
    tag = "credentials"
)]
pub(crate) async fn poll_credential(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Response {
    poll_response(&handle, |h| state.broker.poll_credential(h))
}
