//! # Service Configuration
//!
//! Read once at startup from the environment. Provider credentials are
//! loaded separately by [`proofgate_ndi_client::NdiConfig::from_env`] so a
//! missing provider does not stop the service from starting.

use std::time::Duration;

use url::Url;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default CORS origins.
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

/// Default pending/dedup horizon and reaper period, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// HTTP service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind.
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_allowed_origins: Vec<String>,
    /// Age at which pending markers and dedup records are evicted.
    pub pending_ttl: Duration,
    /// Reaper period.
    pub reaper_interval: Duration,
    /// Public base URL; when set, `{base}/webhook` is registered with the
    /// provider at startup.
    pub public_base_url: Option<Url>,
    /// Emit JSON log lines.
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_allowed_origins: split_origins(DEFAULT_CORS_ORIGINS),
            pending_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            reaper_interval: Duration::from_secs(DEFAULT_TTL_SECS),
            public_base_url: None,
            json_logs: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The variable.
        var: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl AppConfig {
    /// Load from the environment. Unset variables take their defaults;
    /// set-but-unparseable variables are errors.
    ///
    /// Variables: `PORT`, `CORS_ALLOWED_ORIGINS`, `PENDING_TTL_SECS`,
    /// `REAPER_INTERVAL_SECS`, `PUBLIC_BASE_URL`, `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or(defaults.cors_allowed_origins);

        let pending_ttl = positive_secs(&lookup, "PENDING_TTL_SECS")?.unwrap_or(defaults.pending_ttl);
        let reaper_interval =
            positive_secs(&lookup, "REAPER_INTERVAL_SECS")?.unwrap_or(defaults.reaper_interval);

        let public_base_url = match lookup("PUBLIC_BASE_URL").filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
                var: "PUBLIC_BASE_URL",
                reason: e.to_string(),
            })?),
            None => None,
        };

        let json_logs = lookup("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            port,
            cors_allowed_origins,
            pending_ttl,
            reaper_interval,
            public_base_url,
            json_logs,
        })
    }

    /// The webhook URL to register, when a public base URL is configured.
    pub fn webhook_callback_url(&self) -> Option<Url> {
        let base = self.public_base_url.as_ref()?;
        let joined = format!("{}/webhook", base.as_str().trim_end_matches('/'));
        Url::parse(&joined).ok()
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn positive_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match parse_var::<u64>(lookup, var)? {
        Some(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".into(),
        }),
        other => Ok(other.map(Duration::from_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.pending_ttl, Duration::from_secs(3600));
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:3000", "http://localhost:3001"]
        );
        assert!(cfg.webhook_callback_url().is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
            ("PENDING_TTL_SECS", "120"),
            ("REAPER_INTERVAL_SECS", "30"),
            ("PUBLIC_BASE_URL", "https://gate.example/"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cors_allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(cfg.pending_ttl, Duration::from_secs(120));
        assert_eq!(cfg.reaper_interval, Duration::from_secs(30));
        assert!(cfg.json_logs);
        assert_eq!(
            cfg.webhook_callback_url().unwrap().as_str(),
            "https://gate.example/webhook"
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("PENDING_TTL_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("PUBLIC_BASE_URL", "not a url")])).is_err());
    }
}
