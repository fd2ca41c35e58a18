//! Shared HTTP plumbing for the provider clients.
//!
//! Both API wrappers use one reqwest client configuration and retry
//! transient failures through `retry_with_backoff`, which sleeps
//! 1, 2, 4, ... seconds between attempts.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::warn;

/// Default timeout for metadata calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the server-side store trigger, which can take longer.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of additional attempts after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff stops doubling past 2^16 seconds (~18 hours).
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Build the HTTP client used by the provider wrappers.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("cat-uploader/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
}

/// Run `op` up to `max_retries + 1` times, sleeping 2^attempt seconds after
/// each failed attempt. Returns the final error once attempts are exhausted;
/// errors stay in the `Result`, nothing unwinds.
pub async fn retry_with_backoff<T, E, F, Fut>(max_retries: u32, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                // Shift clamped so large retry configs cannot overflow it.
                let backoff = Duration::from_secs(1u64 << attempt.min(MAX_BACKOFF_SHIFT));
                warn!(
                    attempt = attempt + 1,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<u32, String> = retry_with_backoff(3, |_| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two failed attempts: slept 1s then 2s.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), String> = retry_with_backoff(3, |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_does_not_sleep() {
        let start = tokio::time::Instant::now();

        let result: Result<&str, String> = retry_with_backoff(3, |_| async { Ok("ok") }).await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn large_retry_counts_do_not_overflow_the_backoff() {
        let attempts = AtomicU32::new(0);

        // Past attempt 63 an unclamped 2^attempt shift would panic in debug
        // builds before the operation could run again.
        let result: Result<(), String> = retry_with_backoff(70, |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 71);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let attempts = AtomicU32::new(0);

        let result: Result<(), String> = retry_with_backoff(0, |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
