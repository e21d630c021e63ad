//! # Provider Webhook
//!
//! `POST /webhook` (and `/api/webhook`) receives provider callbacks.
//!
//! | Outcome | Status |
//! |---------|--------|
//! | processed, already processed, or an event type we ignore | 200 |
//! | empty or malformed body | 400 |
//! | thread id we never dispatched | 500, so the provider retries |
//!
//! The body is read as raw bytes: the provider does not always send a JSON
//! content type.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use proofgate_broker::{IngestOutcome, Outcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// 200 body of the webhook.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// `success` or `error`, for processed callbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl From<IngestOutcome> for WebhookAck {
    fn from(outcome: IngestOutcome) -> Self {
        match outcome {
            IngestOutcome::Processed { handle, outcome } => Self {
                message: "Webhook processed successfully".into(),
                handle: Some(handle.to_string()),
                outcome: Some(
                    match outcome {
                        Outcome::Success => "success",
                        Outcome::Error => "error",
                        Outcome::Pending => "pending",
                    }
                    .into(),
                ),
            },
            IngestOutcome::Duplicate { handle } => Self {
                message: "Webhook already processed".into(),
                handle: Some(handle.to_string()),
                outcome: None,
            },
            IngestOutcome::Ignored { kind } => Self {
                message: format!("Event {kind} acknowledged"),
                handle: None,
                outcome: None,
            },
        }
    }
}

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(receive_callback))
        .route("/api/webhook", post(receive_callback))
}

/// POST /webhook
#[utoipa::path(
    post,
    path = "/webhook",
    responses(
        (status = 200, description = "Processed, duplicate, or ignored", body = WebhookAck),
        (status = 400, description = "Empty or malformed callback", body = crate::error::ErrorBody),
        (status = 500, description = "Unknown correlation; retry later", body = crate::error::ErrorBody),
    ),
    tag = "webhook"
)]
pub(crate) async fn receive_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("empty request body".into()));
    }
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("callback is not valid JSON: {e}")))?;

    let outcome = state.broker.ingest(&payload).await?;
    Ok(Json(WebhookAck::from(outcome)))
}
