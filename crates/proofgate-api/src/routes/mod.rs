//! # Route Modules
//!
//! | Module | Paths |
//! |--------|-------|
//! | [`proof`] | `POST /api/proof-request`, `GET /api/proof-results/:handle`, `GET /api/proof-status/:handle` |
//! | [`credential`] | `POST /api/issue-credential`, `GET /api/credential-status/:handle` |
//! | [`webhook`] | `POST /webhook`, `POST /api/webhook` |
//! | [`health`] | `GET /health/stats` |
//!
//! Poll endpoints answer with their own small bodies rather than
//! [`ErrorBody`](crate::error::ErrorBody): polling clients branch on
//! `status`, and 202/404 are ordinary answers, not failures.

pub mod credential;
pub mod health;
pub mod proof;
pub mod webhook;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use proofgate_broker::PollStatus;
use proofgate_core::RequestHandle;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// 202 body while a request is outstanding.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PollPending {
    /// Always `pending`.
    pub status: String,
    pub message: String,
    pub handle: String,
}

/// 400/404 body of a poll.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PollError {
    /// Always `error`.
    pub status: String,
    pub error: String,
}

fn poll_error(status: StatusCode, error: &str) -> Response {
    let body = PollError {
        status: "error".into(),
        error: error.into(),
    };
    (status, Json(body)).into_response()
}

/// Shared poll contract: malformed handle 400, result 200, pending 202,
/// otherwise 404.
pub(crate) fn poll_response<T: Serialize>(
    raw_handle: &str,
    lookup: impl FnOnce(&RequestHandle) -> PollStatus<T>,
) -> Response {
    let handle = match RequestHandle::parse(raw_handle) {
        Ok(h) => h,
        Err(_) => return poll_error(StatusCode::BAD_REQUEST, "invalid handle format"),
    };

    match lookup(&handle) {
        PollStatus::Ready(result) => (StatusCode::OK, Json(result)).into_response(),
        PollStatus::Pending => {
            let body = PollPending {
                status: "pending".into(),
                message: "Verification in progress".into(),
                handle: handle.to_string(),
            };
            (StatusCode::ACCEPTED, Json(body)).into_response()
        }
        PollStatus::NotFound => poll_error(StatusCode::NOT_FOUND, "not found"),
    }
}

/// 503 unless a live provider is wired in.
pub(crate) fn require_provider(state: &AppState) -> Result<(), AppError> {
    if state.provider_configured {
        Ok(())
    } else {
        Err(AppError::ServiceUnavailable(
            "verification provider is not configured (set the NDI_* environment variables)".into(),
        ))
    }
}
