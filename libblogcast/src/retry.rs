//! Retry policy shared by every call site that waits and tries again
//!
//! Keyword file contention uses a fixed delay, the generation API uses
//! exponential backoff. Callers decide which errors are transient.

use std::time::Duration;
use tracing::warn;

/// How long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failed attempt
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base, max },
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }

    /// Run a blocking operation, sleeping the calling thread between attempts.
    ///
    /// `op` receives the 1-based attempt number. Errors for which
    /// `is_transient` returns false are returned immediately.
    pub fn retry<T, E, F, P>(&self, what: &str, mut op: F, is_transient: P) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        what, attempt, self.max_attempts, e, delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Async counterpart of [`RetryPolicy::retry`] using the tokio timer
    pub async fn retry_async<T, E, F, Fut, P>(
        &self,
        what: &str,
        mut op: F,
        is_transient: P,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        what, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_delay_doubles_and_caps() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);
        let calls = Cell::new(0);

        let result: Result<&str, String> = policy.retry(
            "read",
            |attempt| {
                calls.set(calls.get() + 1);
                if attempt < 3 {
                    Err("busy".to_string())
                } else {
                    Ok("done")
                }
            },
            |_| true,
        );

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);
        let calls = Cell::new(0);

        let result: Result<(), String> = policy.retry(
            "read",
            |_| {
                calls.set(calls.get() + 1);
                Err("busy".to_string())
            },
            |_| true,
        );

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_stops_on_permanent_error() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);
        let calls = Cell::new(0);

        let result: Result<(), String> = policy.retry(
            "read",
            |_| {
                calls.set(calls.get() + 1);
                Err("missing".to_string())
            },
            |e| e != "missing",
        );

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_async_succeeds_on_second_attempt() {
        let policy = RetryPolicy::exponential(3, Duration::ZERO, Duration::ZERO);

        let result: Result<u32, String> = policy
            .retry_async(
                "generate",
                |attempt| async move {
                    if attempt == 1 {
                        Err("429".to_string())
                    } else {
                        Ok(attempt)
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result.unwrap(), 2);
    }
}
