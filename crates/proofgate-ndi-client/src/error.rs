//! NDI client error types.

/// Errors from NDI API calls.
#[derive(Debug, thiserror::Error)]
pub enum NdiApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Endpoint label, e.g. `POST /proof-request`.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The provider returned a non-2xx status.
    #[error("NDI {endpoint} returned {status}: {body}")]
    ApiError {
        /// Endpoint label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint label.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// The response decoded but is missing or has an unusable field.
    #[error("unusable response from {endpoint}: {reason}")]
    InvalidResponse {
        /// Endpoint label.
        endpoint: String,
        /// What was wrong.
        reason: String,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
