use std::time::Duration;

use litreview_common::types::backoff_seconds;

/// Outcome of a single attempt, used to decide whether `with_retry` should
/// try again and how long to wait first.
pub enum AttemptOutcome<T> {
    Ok(T),
    /// Retryable failure. `retry_after` overrides computed backoff when the
    /// upstream gave one (e.g. HTTP `Retry-After`).
    Retry { error: String, retry_after: Option<Duration> },
    /// Non-retryable; stop immediately.
    Fatal(String),
}

/// Per-call bookkeeping returned alongside the adaptor result (§6:
/// `retry_count/status_code/retry_after_seconds`).
#[derive(Debug, Clone, Default)]
pub struct CallStats {
    pub retry_count: u32,
    pub status_code: Option<u16>,
    pub retry_after_seconds: Option<u64>,
}

/// Retry a fallible async operation with jittered exponential backoff,
/// honoring an explicit `Retry-After` when the attempt provides one.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut attempt: F) -> (Result<T, String>, CallStats)
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = AttemptOutcome<T>>,
{
    let mut stats = CallStats::default();
    let mut last_error = "no attempts made".to_string();

    for n in 1..=max_attempts {
        match attempt(n).await {
            AttemptOutcome::Ok(value) => return (Ok(value), stats),
            AttemptOutcome::Fatal(error) => {
                return (Err(error), stats);
            }
            AttemptOutcome::Retry { error, retry_after } => {
                last_error = error;
                stats.retry_count += 1;
                if n == max_attempts {
                    break;
                }
                let wait = retry_after.unwrap_or_else(|| Duration::from_secs(backoff_seconds(n as i32) as u64));
                if let Some(after) = retry_after {
                    stats.retry_after_seconds = Some(after.as_secs());
                }
                tokio::time::sleep(wait).await;
            }
        }
    }

    (Err(last_error), stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_retrying_on_fatal() {
        let (result, stats): (Result<i32, String>, _) =
            with_retry(5, |_| async { AttemptOutcome::Fatal("bad request".into()) }).await;
        assert!(result.is_err());
        assert_eq!(stats.retry_count, 0);
    }

    #[tokio::test]
    async fn succeeds_after_transient_retries() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let (result, stats) = with_retry(3, |n| {
            let attempts = &attempts;
            async move {
                attempts.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                if n < 2 {
                    AttemptOutcome::Retry { error: "timeout".into(), retry_after: Some(Duration::from_millis(1)) }
                } else {
                    AttemptOutcome::Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(stats.retry_count, 1);
    }
}
