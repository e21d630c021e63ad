//! # proofgate-api: Binary Entry Point
//!
//! Reads configuration, connects the Record Store and the NDI client,
//! registers the webhook, starts the reaper, and serves HTTP until SIGINT
//! or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use proofgate_api::config::AppConfig;
use proofgate_api::provider::NdiProvider;
use proofgate_api::shutdown::ShutdownController;
use proofgate_api::state::AppState;
use proofgate_broker::{spawn_reaper, VerificationProvider};
use proofgate_core::SystemClock;
use proofgate_ndi_client::{NdiClient, NdiConfig};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(config.json_logs);

    let pool = proofgate_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;
    let store = proofgate_api::db::record_store(pool.clone());

    // Absent NDI configuration is not fatal; create endpoints answer 503.
    let ndi = match NdiConfig::from_env() {
        Ok(ndi_config) => {
            tracing::info!(?ndi_config, "NDI client configured");
            Some(NdiClient::new(ndi_config)?)
        }
        Err(e) => {
            tracing::warn!("NDI client not configured: {e}. Proof and credential requests will return 503.");
            None
        }
    };

    if let (Some(client), Some(callback_url)) = (&ndi, config.webhook_callback_url()) {
        match client.register_webhook(&callback_url).await {
            Ok(()) => tracing::info!(%callback_url, "webhook registered"),
            Err(e) => tracing::error!(%callback_url, error = %e, "webhook registration failed"),
        }
    }

    let provider = ndi.map(|client| Arc::new(NdiProvider::new(client)) as Arc<dyn VerificationProvider>);
    let state = AppState::new(config.clone(), provider, store, Arc::new(SystemClock)).with_db_pool(pool);

    let shutdown = Arc::new(ShutdownController::new());
    let reaper = spawn_reaper(state.broker.clone(), config.reaper_interval, shutdown.subscribe());
    let server_stop = shutdown.signalled();
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { shutdown.wait_for_signal().await });
    }

    let app = proofgate_api::app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("proofgate API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(server_stop)
        .await?;

    // The server can also stop on its own; make sure the reaper follows.
    shutdown.shutdown();
    if let Err(e) = reaper.await {
        tracing::error!(error = %e, "reaper task failed");
    }
    tracing::info!("shutdown complete");
    Ok(())
}
