// ABOUTME: Bounded retry with linearly increasing backoff for transient control-plane failures
// ABOUTME: Only connectivity-class provider errors are retried; everything else aborts immediately

use scenebox_sandbox::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Fixed attempt count with a linearly increasing delay between attempts
/// (`base_delay * attempt_number`).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        debug_assert!(attempts >= 1);
        Self {
            attempts,
            base_delay,
        }
    }
}

/// Run `op` until it succeeds, the error is non-retryable, or the attempt
/// budget is exhausted. The last error is surfaced.
pub async fn run_with_retries<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut last_error: Option<ProviderError> = None;

    for attempt in 1..=policy.attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let retryable = e.is_retryable();
                debug!(attempt, retryable, error = %e, "operation attempt failed");
                last_error = Some(e);
                if !retryable || attempt == policy.attempts {
                    break;
                }
                tokio::time::sleep(policy.base_delay * attempt).await;
            }
        }
    }

    Err(last_error.expect("at least one attempt runs"))
}
