//! # proofgate-ndi-client: Typed client for the NDI verification provider
//!
//! The provider performs the cryptographic side of verification. This crate
//! only moves requests to it and results back:
//!
//! - **Access tokens** via the OAuth2 client-credentials grant, cached until
//!   shortly before expiry ([`auth`]).
//! - **Proof requests** built from the `normal` / `agent` templates
//!   ([`proof`]).
//! - **Credential offers** ([`credential`]).
//! - **Webhook registration and per-thread subscription** ([`webhook`]).
//!
//! Every call retries transport failures with exponential backoff; non-2xx
//! responses surface as [`NdiApiError::ApiError`] without retry.

pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod proof;
pub(crate) mod retry;
pub mod webhook;

pub use config::{ConfigError, NdiConfig};
pub use credential::{IssueCredentialRequest, IssuedCredential};
pub use error::NdiApiError;
pub use proof::{DispatchedProof, ProofTemplate};

use std::sync::Arc;
use std::time::Duration;

use url::Url;

/// Client for the NDI verification provider. Clones share the HTTP
/// connection pool and the token cache.
#[derive(Debug, Clone)]
pub struct NdiClient {
    http: reqwest::Client,
    config: Arc<NdiConfig>,
    tokens: Arc<auth::TokenCache>,
}

impl NdiClient {
    /// Create a new client from configuration.
    pub fn new(config: NdiConfig) -> Result<Self, NdiApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NdiApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            config: Arc::new(config),
            tokens: Arc::new(auth::TokenCache::default()),
        })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &NdiConfig {
        &self.config
    }
}

/// Append `path` to `base` without doubling or dropping the separator.
pub(crate) fn join_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a non-2xx response into [`NdiApiError::ApiError`].
pub(crate) async fn ensure_success(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, NdiApiError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(NdiApiError::ApiError {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        let base = Url::parse("http://ndi.local/issuer/").unwrap();
        assert_eq!(join_url(&base, "/issue-credential"), "http://ndi.local/issuer/issue-credential");
        let bare = Url::parse("http://ndi.local").unwrap();
        assert_eq!(join_url(&bare, "subscribe"), "http://ndi.local/subscribe");
    }
}
