//! Bounded exponential backoff.
//!
//! An operation reports each attempt as an [`Attempt`]: success, a
//! transient failure worth retrying, or a fatal failure that ends the loop
//! at once. [`RetryPolicy::execute`] runs at most `max_attempts` attempts and
//! sleeps `base_delay_secs ^ attempt` seconds between them (attempt counted
//! from 1).

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff base in seconds (delays of 2s, 4s, 8s, ...).
pub const DEFAULT_BASE_DELAY_SECS: f64 = 2.0;

/// Result of one attempt of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T, E> {
    Success(T),
    /// Transient failure; the policy may try again.
    Retryable(E),
    /// Permanent failure; returned without further attempts.
    Fatal(E),
}

/// Terminal state of [`RetryPolicy::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Success(T),
    Fatal(E),
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last_error: E },
}

/// Performs the backoff wait. Swapped out in tests to record delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Retry configuration for a fallible operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Base of the exponential delay, in seconds.
    pub base_delay_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_secs: f64) -> Self {
        Self {
            max_attempts,
            base_delay_secs,
        }
    }

    /// Effective attempt limit.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    ///
    /// Non-positive or NaN results yield zero; values too large for a
    /// `Duration` saturate.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay_secs.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Run `op` under this policy, sleeping with tokio between attempts.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        self.execute_with(&TokioSleeper, op).await
    }

    /// Run `op` under this policy using the given [`Sleeper`].
    pub async fn execute_with<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: F,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        let max = self.attempts();
        let mut attempt = 1;
        loop {
            match op().await {
                Attempt::Success(value) => {
                    if attempt > 1 {
                        debug!("Succeeded on attempt {attempt}/{max}");
                    }
                    return RetryOutcome::Success(value);
                }
                Attempt::Fatal(err) => return RetryOutcome::Fatal(err),
                Attempt::Retryable(err) if attempt < max => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "Attempt {attempt}/{max} failed with a retryable error; retrying in {:.1}s",
                        delay.as_secs_f64()
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Retryable(err) => {
                    warn!("Giving up after {attempt} attempt(s)");
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: err,
                    };
                }
            }
        }
    }
}
