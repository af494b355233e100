//! Bounded retry with exponential backoff for transient store failures.

use std::time::Duration;

use murmur_store::StoreError;
use serde::{Deserialize, Serialize};

use crate::VoteError;

/// Default number of attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
/// Default delay before the first retry (ms).
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 10;
/// Backoff never grows past this (ms).
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// A policy that never sleeps, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, VoteError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(attempt, ?delay, error = %e, "transient store failure, retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(VoteError::StorageExhausted {
                        attempts: attempt,
                        source: e,
                    })
                }
                Err(e) => return Err(VoteError::Store(e)),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(10), Duration::from_millis(200));
        assert_eq!(policy.backoff(80), Duration::from_millis(200));
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut failures = 2;
        let result = RetryPolicy::immediate(3).run(|| {
            if failures > 0 {
                failures -= 1;
                Err(StoreError::Transient("busy".into()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(3).run(|| {
            calls += 1;
            Err(StoreError::Transient("busy".into()))
        });
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(VoteError::StorageExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(5).run(|| {
            calls += 1;
            Err(StoreError::Corruption("bad page".into()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(VoteError::Store(StoreError::Corruption(_)))));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = RetryPolicy::immediate(0).run(|| {
            calls += 1;
            Ok::<_, StoreError>(())
        });
        assert_eq!(calls, 1);
    }
}
