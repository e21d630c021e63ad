//! Record Store error types.

/// Errors from a Record Store lookup.
///
/// "Not found" is never an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    /// The database query failed.
    #[error("record store query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded into a record.
    #[error("malformed record in {table}: {reason}")]
    Decode {
        /// Table the row came from.
        table: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The backend is not reachable.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
