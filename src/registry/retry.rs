use std::future::Future;

use tokio::time::{sleep, Duration};

use crate::{config::Config, error::Result};

/// Bounded retry for reads that may lag behind a just-confirmed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: crate::constants::DEFAULT_DISCOVERY_RETRIES,
            delay: Duration::from_millis(crate::constants::DEFAULT_DISCOVERY_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.discovery_retries,
            Duration::from_millis(config.discovery_retry_delay_ms),
        )
    }

    fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Runs `op` until it yields a non-empty list or the attempts run out.
    /// Attempts are sequential and separated by `delay`; the last attempt's
    /// result is returned as-is, error or not.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<Vec<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            let result = op().await;
            let retryable = match &result {
                Ok(items) => items.is_empty(),
                Err(e) => {
                    tracing::warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    true
                }
            };

            if !retryable || attempt >= attempts {
                return result;
            }

            tracing::debug!(
                "Attempt {}/{} returned nothing; retrying in {}ms",
                attempt,
                attempts,
                self.delay.as_millis()
            );
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            attempt += 1;
        }
    }

    /// [`run`](Self::run) with a failed final attempt flattened to empty.
    pub async fn run_or_empty<T, F, Fut>(&self, op: F) -> Vec<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        match self.run(op).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Giving up after {} attempts: {}", self.attempts(), e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_non_empty_attempt() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = policy
            .run(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Ok(Vec::new())
                } else {
                    Ok(vec!["game"])
                }
            })
            .await
            .unwrap();

        assert_eq!(result, vec!["game"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn always_failing_reader_yields_empty_after_all_attempts() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let result: Vec<u8> = policy
            .run_or_empty(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::BlockchainRPC("connection refused".to_string()))
            })
            .await;

        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn last_error_is_preserved_by_run() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let result: Result<Vec<u8>> = policy
            .run(|| async { Err(AppError::BlockchainRPC("down".to_string())) })
            .await;
        assert!(matches!(result, Err(AppError::BlockchainRPC(msg)) if msg == "down"));
    }

    #[tokio::test]
    async fn stops_immediately_on_data() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1])
            })
            .await
            .unwrap();
        assert_eq!(result, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_retries_still_makes_one_attempt() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let result: Vec<u8> = policy
            .run_or_empty(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await;
        assert!(result.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(2000));
        let started = tokio::time::Instant::now();
        let result: Vec<u8> = policy.run_or_empty(|| async { Ok(Vec::new()) }).await;
        assert!(result.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(4000));
    }
}
