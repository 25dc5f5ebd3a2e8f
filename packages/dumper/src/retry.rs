//! Retries of fallible async operations with a fixed delay.

use std::{future::Future, time::Duration};

use futures_timer::Delay;

use crate::error::DumpError;

/// How often and how fast a failing operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct RetryPolicy {
    /// The number of attempts, including the first one
    pub max_attempts: u32,
    /// The delay between two attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy without delay between attempts.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Runs `attempt` until it succeeds, fails with an error that is not
/// [retryable](DumpError::is_retryable) or `policy.max_attempts` attempts failed.
///
/// `attempt` receives the 1-based attempt number.
///
/// # Errors
/// Returns the first non-retryable error, or [`DumpError::ExhaustedRetries`] wrapping the error
/// of the last attempt.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    subject: impl ToString,
    mut attempt: F,
) -> Result<T, DumpError>
where
    F: FnMut(u32) -> Fut + Send,
    Fut: Future<Output = Result<T, DumpError>> + Send,
{
    let subject = subject.to_string();
    let max_attempts = policy.max_attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if n >= max_attempts => {
                return Err(DumpError::ExhaustedRetries {
                    operation,
                    subject,
                    attempts: n,
                    source: Box::new(err),
                })
            }
            Err(err) => {
                tracing::warn!(
                    operation,
                    %subject,
                    attempt = n,
                    max_attempts,
                    %err,
                    "attempt failed, retrying in {}ms",
                    policy.delay.as_millis()
                );
                Delay::new(policy.delay).await;
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let value = retry(RetryPolicy::immediate(3), "op", "subject", |n| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err(DumpError::Transport("flaky".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(3, value);
        assert_eq!(3, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let err = retry(RetryPolicy::immediate(3), "eth_chainId", "node", |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(DumpError::Transport("down".to_string()))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(3, calls.load(Ordering::SeqCst));
        match err {
            DumpError::ExhaustedRetries {
                operation,
                subject,
                attempts,
                source,
            } => {
                assert_eq!("eth_chainId", operation);
                assert_eq!("node", subject);
                assert_eq!(3, attempts);
                assert!(matches!(*source, DumpError::Transport(_)));
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_is_returned_at_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let err = retry(RetryPolicy::immediate(5), "op", "slot 1", |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(DumpError::decode("slot 1", "bad body"))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert!(matches!(err, DumpError::Decode { .. }));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(3, policy.max_attempts);
        assert_eq!(Duration::from_secs(1), policy.delay);
    }
}
