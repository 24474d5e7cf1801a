//! Retry policy for transient data-source failures.
//!
//! The policy is a plain value: attempt budget, an exponential backoff curve
//! clamped to `[min_delay, max_delay]`, and a classifier deciding which
//! errors are worth another attempt. Keeping it separate from the network
//! code lets the schedule be tested without a provider.

use super::provider::DataError;
use std::time::Duration;
use tracing::debug;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    FailFast,
}

/// Maps an error to a retry decision.
pub type Classifier = fn(&DataError) -> RetryDecision;

/// Default classifier: retry exactly the transient errors.
pub fn retry_transient(err: &DataError) -> RetryDecision {
    if err.is_transient() {
        RetryDecision::Retry
    } else {
        RetryDecision::FailFast
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Scale of the exponential curve: the n-th wait is `multiplier * 2^(n-1)`.
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub classify: Classifier,
}

impl Default for RetryPolicy {
    /// 5 attempts, waits of 4s, 4s, 4s, 8s.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
            classify: retry_transient,
        }
    }
}

impl RetryPolicy {
    /// Same classifier and attempt budget, no waiting. Used by tests and
    /// offline providers.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            classify: retry_transient,
        }
    }

    pub fn with_classifier(mut self, classify: Classifier) -> Self {
        self.classify = classify;
        self
    }

    /// Wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(exp)
            .max(self.min_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget
    /// is spent. The last error is returned unmodified.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, DataError>
    where
        F: FnMut(u32) -> Result<T, DataError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            debug!(target: "foliolab::retry", %label, attempt, "starting attempt");
            match op(attempt) {
                Ok(value) => {
                    debug!(target: "foliolab::retry", %label, attempt, "attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    debug!(target: "foliolab::retry", %label, attempt, error = %err, "attempt failed");
                    if attempt >= max_attempts || (self.classify)(&err) == RetryDecision::FailFast {
                        return Err(err);
                    }
                    let delay = self.delay_after(attempt);
                    debug!(target: "foliolab::retry", %label, ?delay, "backing off");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
