//! Retrying calls that fail transiently.
//!
//! A call is re-invoked while it reports a transient failure and the
//! deadline has not passed. Between attempts the caller sleeps according to
//! a bounded [`Backoff`], never past the deadline. Any non-transient failure
//! is returned immediately.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Classifies errors that may succeed on retry.
pub trait Transient {
    /// Returns true if retrying the failed call may succeed.
    fn is_transient(&self) -> bool;
}

/// Outcome of a failed retry loop.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// No attempt succeeded before the deadline.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    /// An attempt failed with a non-transient error.
    #[error(transparent)]
    Failed(E),
}

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Always wait the initial delay.
    Fixed,
    /// Double the delay after each attempt, up to the maximum.
    #[default]
    Exponential,
}

/// Shortest pause between attempts; zero delays are raised to it.
pub const MIN_BACKOFF: Duration = Duration::from_micros(100);

/// Bounded delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// How the delay grows between attempts.
    pub strategy: BackoffStrategy,
    /// Delay after the first failed attempt.
    pub initial: Duration,
    /// Upper bound on any single delay.
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial: Duration::from_millis(1),
            max: Duration::from_millis(50),
        }
    }
}

impl Backoff {
    /// Constant delay between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            initial: delay,
            max: delay,
        }
    }

    /// Delay to wait after the given zero-based attempt.
    ///
    /// Never shorter than [`MIN_BACKOFF`].
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.initial.min(self.max),
            BackoffStrategy::Exponential => self
                .initial
                .saturating_mul(2u32.saturating_pow(attempt))
                .min(self.max),
        };
        delay.max(MIN_BACKOFF)
    }
}

/// Retry behavior: how long to keep trying and how to pace attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time allowed for all attempts.
    pub timeout: Duration,
    /// Pause schedule between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Creates a policy from a timeout and a backoff schedule.
    pub fn new(timeout: Duration, backoff: Backoff) -> Self {
        Self { timeout, backoff }
    }

    /// Builds a policy from a timeout in seconds.
    ///
    /// Zero, negative and NaN timeouts become a zero timeout, which makes no
    /// attempts at all.
    pub fn from_secs_f64(secs: f64, backoff: Backoff) -> Self {
        let timeout = if secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self { timeout, backoff }
    }

    /// Invokes `call` until it succeeds, fails permanently, or the timeout
    /// elapses.
    pub fn run<T, E, F>(&self, mut call: F) -> Result<T, RetryError<E>>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let start = Instant::now();
        let deadline = start.checked_add(self.timeout);
        let expired = |now: Instant| deadline.is_some_and(|d| now >= d);

        let mut attempt = 0u32;
        while !expired(Instant::now()) {
            match call() {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::trace!(attempts = attempt + 1, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() => {
                    tracing::trace!(attempt, error = %e, "Transient failure, retrying");
                }
                Err(e) => return Err(RetryError::Failed(e)),
            }

            let mut pause = self.backoff.delay(attempt);
            if let Some(d) = deadline {
                pause = pause.min(d.saturating_duration_since(Instant::now()));
            }
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
            attempt = attempt.saturating_add(1);
        }

        tracing::debug!(timeout = ?self.timeout, attempts = attempt, "Retry deadline reached");
        Err(RetryError::TimedOut(self.timeout))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Backoff::default())
    }
}
