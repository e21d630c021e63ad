//! # Provider Access Tokens
//!
//! Tokens are obtained from `NDI_AUTH_URL` with the OAuth2
//! client-credentials grant and reused until 60 seconds before they expire.
//! Concurrent callers that find the cache stale wait on one refresh rather
//! than each fetching their own token.

use std::time::{Duration, Instant};

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::NdiApiError;
use crate::NdiClient;

/// Refresh this long before the provider-reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

struct CachedToken {
    value: Zeroizing<String>,
    refresh_at: Instant,
}

/// Single-slot token cache shared by clones of one [`NdiClient`].
#[derive(Default)]
pub struct TokenCache {
    slot: tokio::sync::Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl NdiClient {
    /// A valid bearer token, from cache or freshly fetched.
    pub async fn access_token(&self) -> Result<Zeroizing<String>, NdiApiError> {
        let mut slot = self.tokens.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate_token(&self) {
        *self.tokens.slot.lock().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken, NdiApiError> {
        let endpoint = "POST /oauth/token";
        let url = self.config.auth_url.as_str();
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let resp = crate::retry::retry_send(endpoint, || self.http.post(url).form(&form).send())
            .await
            .map_err(|e| NdiApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let resp = crate::ensure_success(endpoint, resp).await?;

        let body: TokenResponse = resp.json().await.map_err(|e| NdiApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        if body.access_token.is_empty() {
            return Err(NdiApiError::InvalidResponse {
                endpoint: endpoint.into(),
                reason: "empty access_token".into(),
            });
        }

        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        tracing::debug!(expires_in = lifetime.as_secs(), "obtained NDI access token");
        Ok(CachedToken {
            value: Zeroizing::new(body.access_token),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        })
    }
}
