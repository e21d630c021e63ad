//! Retry with exponential backoff for NDI HTTP calls.
//!
//! Only transport failures (connect errors, timeouts) are retried. A response
//! with any status code, including 5xx, is returned to the caller as-is.

use std::time::Duration;

/// Retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// First backoff delay; doubles per attempt (200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Send a request built by `f`, retrying on transport errors.
///
/// `f` is called at most `MAX_RETRIES + 1` times.
pub(crate) async fn retry_send<F, Fut>(
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < MAX_RETRIES => {
                let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
                attempt += 1;
                tracing::warn!(
                    endpoint,
                    attempt,
                    max_retries = MAX_RETRIES,
                    "NDI request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
