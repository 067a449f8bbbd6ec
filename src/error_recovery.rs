//! Retry with exponential backoff for API operations.

use crate::error::AppError;
use rand::Rng;
use std::time::Duration;

/// Retries an async operation with exponential backoff and jitter.
///
/// Only errors for which [`AppError::is_transient`] holds are retried; any
/// other error is returned immediately.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                if attempt < max_attempts {
                    let wait = with_jitter(delay);
                    log::warn!(
                        "Attempt {}/{} failed ({}), retrying after {:?}",
                        attempt,
                        max_attempts,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    delay = std::cmp::min(delay * 2, max_delay);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::InternalError {
        message: "Retry failed with no error".to_string(),
        source: None,
    }))
}

/// Adds up to 25% random jitter so concurrent page syncs don't retry in lockstep.
fn with_jitter(delay: Duration) -> Duration {
    let max_jitter = (delay.as_millis() as u64) / 4;
    if max_jitter == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=max_jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotionErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> AppError {
        AppError::NotionService {
            code: NotionErrorCode::RateLimited,
            message: "slow down".to_string(),
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            },
            3,
            Duration::from_millis(1),
            Duration::from_millis(4),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), AppError> = retry_with_backoff(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::MalformedResponse("bad".to_string()))
            },
            5,
            Duration::from_millis(1),
            Duration::from_millis(4),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        let base = Duration::from_millis(400);
        for _ in 0..20 {
            let wait = with_jitter(base);
            assert!(wait >= base && wait <= base + Duration::from_millis(100));
        }
    }
}
