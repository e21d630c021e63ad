//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps broker and core errors to HTTP status codes with a JSON body
//! `{ "error": { "code", "message", "details"? } }`. Internal error text is
//! logged and never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use proofgate_broker::{BrokerError, IngestError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request parsed but violates a rule (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict with current state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The verification provider failed (502). Message is logged, not returned.
    #[error("provider error: {0}")]
    BadGateway(String),

    /// A dependency is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::BadGateway(_) => "The verification provider request failed".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::BadGateway(_) => tracing::error!(error = %self, "provider error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<proofgate_core::ValidationError> for AppError {
    fn from(err: proofgate_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::ProviderDispatchFailure(e) => Self::BadGateway(e.to_string()),
            BrokerError::InvalidRequest(msg) => Self::BadRequest(msg),
            e @ (BrokerError::DuplicateHandle(_) | BrokerError::DuplicateProviderRef(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

/// Unknown correlations answer 500 so the provider retries; a callback can
/// outrun the dispatch that created its correlation.
impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MalformedPayload(msg) => Self::BadRequest(msg),
            e @ IngestError::UnknownCorrelation(_) => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use proofgate_broker::ProviderError;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::BadGateway("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected, "{err}");
        }
    }

    #[test]
    fn broker_errors_map_to_taxonomy() {
        let dispatch = AppError::from(BrokerError::ProviderDispatchFailure(ProviderError(
            "timeout".into(),
        )));
        assert!(matches!(dispatch, AppError::BadGateway(_)));

        let invalid = AppError::from(BrokerError::InvalidRequest("schemaId".into()));
        assert!(matches!(invalid, AppError::BadRequest(_)));

        let malformed = AppError::from(IngestError::MalformedPayload("missing thid".into()));
        assert!(matches!(malformed, AppError::BadRequest(_)));

        let unknown = AppError::from(IngestError::UnknownCorrelation("ndi-1".into()));
        assert!(matches!(unknown, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn into_response_bad_request_shows_message() {
        let (status, body) = response_parts(AppError::BadRequest("missing thid".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "BAD_REQUEST");
        assert!(body.error.message.contains("missing thid"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("correlation for ndi-7".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_bad_gateway_hides_provider_text() {
        let (status, body) =
            response_parts(AppError::BadGateway("401 from https://ndi.internal".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "PROVIDER_ERROR");
        assert!(!body.error.message.contains("ndi.internal"));
    }
}
