//! # Webhook Registration and Subscription
//!
//! The provider delivers results to one registered webhook URL. Each
//! dispatched thread must additionally be subscribed to that webhook, or its
//! result is never delivered.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `{NDI_WEBHOOK_URL}/register`  | register our callback URL |
//! | POST   | `{NDI_WEBHOOK_URL}/subscribe` | subscribe one thread id |

use proofgate_core::ProviderRef;
use serde::Serialize;
use url::Url;

use crate::error::NdiApiError;
use crate::NdiClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeBody<'a> {
    webhook_id: &'a str,
    thread_id: &'a str,
}

#[derive(Serialize)]
struct WebhookAuth<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'static str,
    data: WebhookAuthData<'a>,
}

#[derive(Serialize)]
struct WebhookAuthData<'a> {
    token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    webhook_id: &'a str,
    #[serde(rename = "webhookURL")]
    webhook_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication: Option<WebhookAuth<'a>>,
}

impl NdiClient {
    /// Subscribe a dispatched thread to our webhook.
    pub async fn subscribe(&self, provider_ref: &ProviderRef) -> Result<(), NdiApiError> {
        let endpoint = "POST /webhook/subscribe";
        let url = crate::join_url(&self.config.webhook_url, "subscribe");
        let token = self.access_token().await?;
        let body = SubscribeBody {
            webhook_id: &self.config.webhook_id,
            thread_id: provider_ref.as_str(),
        };

        let resp = crate::retry::retry_send(endpoint, || {
            self.http
                .post(&url)
                .bearer_auth(token.as_str())
                .json(&body)
                .send()
        })
        .await
        .map_err(|e| NdiApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        crate::ensure_success(endpoint, resp).await?;

        tracing::debug!(provider_ref = %provider_ref, "subscribed thread to webhook");
        Ok(())
    }

    /// Register `callback_url` as our webhook.
    ///
    /// A 409 from the provider means the webhook id is already registered and
    /// is treated as success.
    pub async fn register_webhook(&self, callback_url: &Url) -> Result<(), NdiApiError> {
        let endpoint = "POST /webhook/register";
        let url = crate::join_url(&self.config.webhook_url, "register");
        let token = self.access_token().await?;
        let body = RegisterBody {
            webhook_id: &self.config.webhook_id,
            webhook_url: callback_url.as_str(),
            authentication: self.config.webhook_token.as_ref().map(|t| WebhookAuth {
                kind: "OAuth2",
                version: "v2",
                data: WebhookAuthData { token: t.as_str() },
            }),
        };

        let resp = crate::retry::retry_send(endpoint, || {
            self.http
                .post(&url)
                .bearer_auth(token.as_str())
                .json(&body)
                .send()
        })
        .await
        .map_err(|e| NdiApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        if resp.status() == reqwest::StatusCode::CONFLICT {
            tracing::info!(webhook_id = %self.config.webhook_id, "webhook already registered");
            return Ok(());
        }
        crate::ensure_success(endpoint, resp).await?;

        tracing::info!(
            webhook_id = %self.config.webhook_id,
            callback_url = %callback_url,
            "webhook registered"
        );
        Ok(())
    }
}
