//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. All correlation state lives inside the
//! [`VerificationBroker`]; this struct only wires it to the HTTP layer.

use std::sync::Arc;

use proofgate_broker::{BrokerConfig, VerificationBroker, VerificationProvider};
use proofgate_core::{SharedClock, SystemClock};
use proofgate_records::{InMemoryRecordStore, RecordStore};
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::provider::UnconfiguredProvider;

/// Handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<VerificationBroker>,
    /// False when no NDI credentials were found; create endpoints answer 503.
    pub provider_configured: bool,
    /// Name of the Record Store backend, for `/health/stats`.
    pub records_backend: String,
    pub config: AppConfig,
    pub metrics: ApiMetrics,
    /// Postgres pool behind the Record Store, probed by readiness.
    pub db_pool: Option<PgPool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("broker", &self.broker)
            .field("provider_configured", &self.provider_configured)
            .field("records_backend", &self.records_backend)
            .field("config", &self.config)
            .field("db_pool", &self.db_pool.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state. `provider = None` wires in [`UnconfiguredProvider`].
    pub fn new(
        config: AppConfig,
        provider: Option<Arc<dyn VerificationProvider>>,
        store: Arc<dyn RecordStore>,
        clock: SharedClock,
    ) -> Self {
        let provider_configured = provider.is_some();
        let provider = provider.unwrap_or_else(|| Arc::new(UnconfiguredProvider));
        let records_backend = store.backend_name().to_string();

        // Durations beyond chrono's range fall back to the default horizon.
        let pending_ttl = chrono::Duration::from_std(config.pending_ttl)
            .unwrap_or_else(|_| BrokerConfig::default().pending_ttl);
        let broker = VerificationBroker::new(provider, store, clock, BrokerConfig { pending_ttl });

        Self {
            broker: Arc::new(broker),
            provider_configured,
            records_backend,
            config,
            metrics: ApiMetrics::new(),
            db_pool: None,
        }
    }

    /// Attach the pool the Record Store runs on.
    pub fn with_db_pool(mut self, pool: Option<PgPool>) -> Self {
        self.db_pool = pool;
        self
    }

    /// Default configuration, no provider, empty in-memory records, system clock.
    pub fn unconfigured() -> Self {
        Self::new(
            AppConfig::default(),
            None,
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(SystemClock),
        )
    }
}
