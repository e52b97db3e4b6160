//! Bounded retry with fixed backoff (§4.4.1, §5)

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Upper bound on connect/bind attempts. Deliberately far above any
/// expected retry count; a run that needs this many attempts is already
/// failing for a structural reason the run-wide deadline (§5) will catch
/// first.
pub const K_MAX_ATTEMPTS: u32 = 5_000;

/// Fixed interval between attempts.
pub const K_RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Per-attempt timeout; a connect/accept/read that hangs longer than this
/// counts as a failed attempt rather than blocking the retry loop
/// indefinitely.
pub const K_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `attempt` up to `K_MAX_ATTEMPTS` times, `K_RETRY_INTERVAL` apart,
/// each bounded by `K_ATTEMPT_TIMEOUT`. Returns the first `Ok`, or the last
/// error once the attempt budget is exhausted.
pub async fn retry<T, E, F, Fut>(label: &str, mut attempt: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;
    for attempt_no in 1..=K_MAX_ATTEMPTS {
        match tokio::time::timeout(K_ATTEMPT_TIMEOUT, attempt(attempt_no)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => {
                debug!(label, attempt_no, "attempt failed");
                last_error = Some(error);
            }
            Err(_elapsed) => {
                debug!(label, attempt_no, timeout = ?K_ATTEMPT_TIMEOUT, "attempt timed out");
            }
        }
        tokio::time::sleep(K_RETRY_INTERVAL).await;
    }
    Err(RetryExhausted { attempts: K_MAX_ATTEMPTS, last_error })
}

/// The retry budget was exhausted without a successful attempt.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: Option<E>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_a_later_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryExhausted<&str>> = retry("test", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err("not yet") } else { Ok(42) } }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
