//! Bounded retry with exponential backoff for notification delivery.

use std::time::Duration;

use tracing::{error, warn};

use crate::alert::TripAlert;
use crate::channels::TripNotifier;
use crate::error::Result;

/// Retry policy for transient publish failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy with no delays, for tests.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Returns the backoff delay preceding the given retry (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Decorator that retries transient publish failures with backoff.
///
/// Permanent failures are returned immediately. Once attempts are
/// exhausted the last error is logged prominently and returned to the
/// caller; the caller's committed trip state is never rolled back.
#[derive(Debug)]
pub struct RetryingNotifier<N> {
    inner: N,
    policy: RetryPolicy,
}

impl<N: TripNotifier> RetryingNotifier<N> {
    /// Wraps a channel with the default retry policy.
    #[must_use]
    pub fn new(inner: N) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    /// Wraps a channel with a custom retry policy.
    #[must_use]
    pub const fn with_policy(inner: N, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped channel.
    #[must_use]
    pub const fn inner(&self) -> &N {
        &self.inner
    }
}

impl<N: TripNotifier> TripNotifier for RetryingNotifier<N> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn publish_trip(&self, alert: &TripAlert) -> Result<()> {
        let attempts = self.policy.max_attempts.max(1);

        let mut last_err = None;
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for(attempt - 1);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }

            match self.inner.publish_trip(alert) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    warn!(
                        channel = %self.inner.name(),
                        access_key_id = %alert.access_key_id,
                        attempt = attempt + 1,
                        error = %err,
                        "transient notification failure, will retry"
                    );
                    last_err = Some(err);
                }
                Err(err) => {
                    error!(
                        channel = %self.inner.name(),
                        access_key_id = %alert.access_key_id,
                        attempts = attempt + 1,
                        error = %err,
                        "trip notification failed; trip state remains committed"
                    );
                    return Err(err);
                }
            }
        }

        // The loop always returns before falling through.
        Err(last_err.unwrap_or(crate::error::NotifyError::PublishFailed {
            channel: self.inner.name().to_string(),
            reason: "retry loop exhausted".to_string(),
            transient: false,
        }))
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }
}
