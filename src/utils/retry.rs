use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::yaya::ApiError;

/// Bounded attempts, fixed delay between them, optional deadline per attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub timeout: Option<Duration>,
    /// Keep going after a non-JSON body instead of giving up at once
    pub retry_invalid_json: bool,
}

impl RetryPolicy {
    pub const fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            timeout: None,
            retry_invalid_json: false,
        }
    }

    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Treat every failure as transient
    pub const fn retry_everything(self) -> Self {
        Self {
            retry_invalid_json: true,
            ..self
        }
    }
}

#[derive(Debug)]
pub enum RetryFailure {
    /// A non-retryable error; later attempts were skipped
    Aborted { attempt: u32, error: ApiError },
    /// Every attempt failed; carries the last error
    Exhausted { attempts: u32, last: ApiError },
}

/// Run `call` until it succeeds, hits a non-retryable error, or runs out of attempts.
///
/// With a timeout set, each attempt races the deadline. The losing upstream future is
/// dropped on the spot, so a late response can neither complete the call nor log.
pub async fn run_with_retry<T, F, Fut>(
    operation: &str,
    policy: RetryPolicy,
    mut call: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!("{} attempt {}/{}", operation, attempt, attempts);

        let outcome = match policy.timeout {
            Some(limit) => match tokio::time::timeout(limit, call()).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(limit)),
            },
            None => call().await,
        };

        let error = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}/{}", operation, attempt, attempts);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        error!("{} failed on attempt {}/{}: {}", operation, attempt, attempts, error);
        if error.is_unauthorized() {
            error!("Authentication failed for {}. Check YAYA_API_KEY and YAYA_API_SECRET.", operation);
        }

        if !error.is_retryable() && !policy.retry_invalid_json {
            return Err(RetryFailure::Aborted { attempt, error });
        }

        if attempt >= attempts {
            warn!("Max retries reached for {}", operation);
            return Err(RetryFailure::Exhausted { attempts, last: error });
        }

        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    const POLICY: RetryPolicy = RetryPolicy::fixed(3, Duration::from_secs(2));

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = run_with_retry("op", POLICY, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(ApiError::ServerError(502, format!("blip {}", n)))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_carries_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = run_with_retry("op", POLICY, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Err(ApiError::HttpError(418, format!("attempt {}", n)))
        })
        .await;

        match result {
            Err(RetryFailure::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.detail(), "attempt 3");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_stops_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = run_with_retry("op", POLICY, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::InvalidJson("<html>".to_string()))
        })
        .await;

        assert!(matches!(result, Err(RetryFailure::Aborted { attempt: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_can_retry_invalid_json() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = run_with_retry("op", POLICY.retry_everything(), move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                Err(ApiError::InvalidJson("<html>".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let start = Instant::now();
        let _: Result<(), _> = run_with_retry("op", POLICY, || async {
            Err(ApiError::RequestError("down".to_string()))
        })
        .await;

        // two gaps of 2s, no delay after the final attempt
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failed_attempt() {
        let policy = POLICY.with_timeout(Duration::from_secs(30));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = run_with_retry("op", policy, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                std::future::pending::<()>().await;
            }
            Ok(n)
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_still_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = run_with_retry("op", POLICY, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Unauthorized("bad key".to_string()))
        })
        .await;

        assert!(matches!(result, Err(RetryFailure::Exhausted { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
