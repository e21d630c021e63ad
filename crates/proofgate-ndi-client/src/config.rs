//! NDI client configuration.
//!
//! All endpoints and credentials come from the environment. The client
//! secret and the webhook token are held in [`Zeroizing`] buffers and never
//! appear in `Debug` output.

use url::Url;
use zeroize::Zeroizing;

/// Default schema restriction for the foundational-ID proof template.
pub const DEFAULT_FOUNDATIONAL_SCHEMA: &str =
    "https://dev-schema.ngotag.com/schemas/c7952a0a-e9b5-4a4b-a714-1e5d0a1ae076";

/// Default schema restriction for the agent-credential proof template.
pub const DEFAULT_AGENT_SCHEMA: &str =
    "https://dev-schema.ngotag.com/schemas/f9727fba-14eb-4653-98e2-f7d81fe5aab5";

/// Default identifier under which our webhook is registered.
pub const DEFAULT_WEBHOOK_ID: &str = "proofgate-webhook";

/// Configuration for the NDI verification provider.
#[derive(Clone)]
pub struct NdiConfig {
    /// OAuth2 token endpoint (client-credentials grant).
    pub auth_url: Url,
    /// Proof-request endpoint.
    pub verifier_url: Url,
    /// Credential issuance base URL.
    pub issuer_url: Url,
    /// Webhook registration and subscription base URL.
    pub webhook_url: Url,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: Zeroizing<String>,
    /// Identifier of our registered webhook.
    pub webhook_id: String,
    /// Token the provider presents when delivering callbacks.
    pub webhook_token: Option<Zeroizing<String>>,
    /// Schema restriction for `normal` proofs.
    pub foundational_schema: String,
    /// Schema restriction for `agent` proofs.
    pub agent_schema: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for NdiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdiConfig")
            .field("auth_url", &self.auth_url)
            .field("verifier_url", &self.verifier_url)
            .field("issuer_url", &self.issuer_url)
            .field("webhook_url", &self.webhook_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("webhook_id", &self.webhook_id)
            .field(
                "webhook_token",
                &self.webhook_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("foundational_schema", &self.foundational_schema)
            .field("agent_schema", &self.agent_schema)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NdiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NDI_AUTH_URL`, `NDI_VERIFIER_URL`, `NDI_ISSUER_URL`, `NDI_WEBHOOK_URL` (required)
    /// - `NDI_CLIENT_ID`, `NDI_CLIENT_SECRET` (required)
    /// - `NDI_WEBHOOK_ID` (default: `proofgate-webhook`)
    /// - `NDI_WEBHOOK_TOKEN` (optional)
    /// - `NDI_FOUNDATIONAL_SCHEMA`, `NDI_AGENT_SCHEMA` (default: built-in schema URLs)
    /// - `NDI_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            auth_url: required_url("NDI_AUTH_URL")?,
            verifier_url: required_url("NDI_VERIFIER_URL")?,
            issuer_url: required_url("NDI_ISSUER_URL")?,
            webhook_url: required_url("NDI_WEBHOOK_URL")?,
            client_id: required("NDI_CLIENT_ID")?,
            client_secret: Zeroizing::new(required("NDI_CLIENT_SECRET")?),
            webhook_id: std::env::var("NDI_WEBHOOK_ID")
                .unwrap_or_else(|_| DEFAULT_WEBHOOK_ID.to_string()),
            webhook_token: std::env::var("NDI_WEBHOOK_TOKEN").ok().map(Zeroizing::new),
            foundational_schema: std::env::var("NDI_FOUNDATIONAL_SCHEMA")
                .unwrap_or_else(|_| DEFAULT_FOUNDATIONAL_SCHEMA.to_string()),
            agent_schema: std::env::var("NDI_AGENT_SCHEMA")
                .unwrap_or_else(|_| DEFAULT_AGENT_SCHEMA.to_string()),
            timeout_secs: std::env::var("NDI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Configuration with every endpoint under one local base URL, for tests
    /// against a mock server.
    ///
    /// Paths: `/oauth/token`, `/verifier/proof-request`, `/issuer`, `/webhook`.
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let join = |path: &str| -> Result<Url, ConfigError> {
            Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
                .map_err(|e| ConfigError::InvalidUrl(path.to_string(), e.to_string()))
        };
        Ok(Self {
            auth_url: join("/oauth/token")?,
            verifier_url: join("/verifier/proof-request")?,
            issuer_url: join("/issuer")?,
            webhook_url: join("/webhook")?,
            client_id: "test-client".to_string(),
            client_secret: Zeroizing::new("test-secret".to_string()),
            webhook_id: DEFAULT_WEBHOOK_ID.to_string(),
            webhook_token: None,
            foundational_schema: DEFAULT_FOUNDATIONAL_SCHEMA.to_string(),
            agent_schema: DEFAULT_AGENT_SCHEMA.to_string(),
            timeout_secs: 5,
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(var.to_string())),
    }
}

fn required_url(var: &str) -> Result<Url, ConfigError> {
    let raw = required(var)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} environment variable is required")]
    Missing(String),
    /// A URL variable does not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = NdiConfig::local_mock("http://127.0.0.1:9000/").unwrap();
        assert_eq!(cfg.auth_url.as_str(), "http://127.0.0.1:9000/oauth/token");
        assert_eq!(cfg.issuer_url.as_str(), "http://127.0.0.1:9000/issuer");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut cfg = NdiConfig::local_mock("http://127.0.0.1:9000").unwrap();
        cfg.webhook_token = Some(Zeroizing::new("hook-secret".to_string()));
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("test-secret"));
        assert!(!debug.contains("hook-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn required_rejects_absent_variable() {
        let err = required("PROOFGATE_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(v) if v == "PROOFGATE_TEST_SURELY_UNSET_VAR"));
    }
}
