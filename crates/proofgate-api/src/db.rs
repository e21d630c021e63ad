//! # Record Store Selection
//!
//! The Postgres Record Store is optional. With `DATABASE_URL` set, lookups
//! go to the existing `business_owner` and `cfa` tables. Without it the
//! service runs on an empty in-memory store, where every presentation
//! classifies as unregistered.

use std::sync::Arc;

use proofgate_records::{InMemoryRecordStore, PgRecordStore, RecordStore};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to Postgres.
///
/// Returns `None` if `DATABASE_URL` is not set. Returns `Err` if the URL is
/// set but the connection fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set; using an empty in-memory record store. \
                 Every presentation will classify as unregistered."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");
    Ok(Some(pool))
}

/// The Record Store for a (possibly absent) pool.
pub fn record_store(pool: Option<PgPool>) -> Arc<dyn RecordStore> {
    match pool {
        Some(pool) => Arc::new(PgRecordStore::new(pool)),
        None => Arc::new(InMemoryRecordStore::new()),
    }
}
