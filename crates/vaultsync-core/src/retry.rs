//! Push failure state and retry eligibility.
//!
//! When a push of a local record is rejected, the executor stores an
//! [`ErrorState`] on the record. On later passes the engine asks a
//! [`RetryPolicy`] whether the push may be attempted again. The engine treats
//! the policy as opaque; [`BackoffPolicy`] is the policy used by default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timestamp::Timestamp;

/// Record of the last failed push attempt for a local record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorState {
    /// Status code reported by the remote service (0 for transport failures).
    pub code: u16,
    /// Human-readable reason, if the service supplied one.
    pub message: Option<String>,
    /// When the failure was recorded.
    pub recorded_at: Timestamp,
    /// The record's effective date at the time of the failure.
    pub revision_date: Timestamp,
    /// Consecutive failures for this revision of the record.
    pub attempts: u32,
}

impl ErrorState {
    /// A first failure for the given record revision.
    pub fn new(code: u16, revision_date: Timestamp, recorded_at: Timestamp) -> Self {
        Self {
            code,
            message: None,
            recorded_at,
            revision_date,
            attempts: 1,
        }
    }

    /// Attach a reason.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Build the error state following a new failure.
    ///
    /// The attempt counter carries over from `previous` only while the
    /// record revision is unchanged; editing the record starts a fresh
    /// backoff sequence.
    pub fn after_failure(
        previous: Option<&ErrorState>,
        code: u16,
        message: Option<String>,
        revision_date: Timestamp,
        recorded_at: Timestamp,
    ) -> Self {
        let attempts = match previous {
            Some(prev) if prev.revision_date == revision_date => prev.attempts.saturating_add(1),
            _ => 1,
        };
        Self {
            code,
            message,
            recorded_at,
            revision_date,
            attempts,
        }
    }

    /// Whether the failure will not go away by retrying the same content.
    ///
    /// Client errors (4xx) are permanent, except request timeout (408) and
    /// rate limiting (429).
    pub fn is_permanent(&self) -> bool {
        matches!(self.code, 400..=499) && !matches!(self.code, 408 | 429)
    }
}

/// Decides whether a previously failed push may be attempted again.
///
/// `reference` is the record's current effective date.
pub trait RetryPolicy {
    /// Returns `true` if the push may be retried this pass.
    fn can_retry(&self, error: &ErrorState, reference: Timestamp) -> bool;
}

impl<F> RetryPolicy for F
where
    F: Fn(&ErrorState, Timestamp) -> bool,
{
    fn can_retry(&self, error: &ErrorState, reference: Timestamp) -> bool {
        self(error, reference)
    }
}

/// Policy that always allows a retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl RetryPolicy for AlwaysRetry {
    fn can_retry(&self, _error: &ErrorState, _reference: Timestamp) -> bool {
        true
    }
}

/// Policy that never allows a retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl RetryPolicy for NeverRetry {
    fn can_retry(&self, _error: &ErrorState, _reference: Timestamp) -> bool {
        false
    }
}

/// Exponential backoff anchored at a fixed "now".
///
/// - A record edited since the failure is always eligible.
/// - Otherwise permanent failures are never retried.
/// - Otherwise the record becomes eligible once
///   `min(initial_delay * multiplier^(attempts - 1), max_delay)` has elapsed
///   since the failure was recorded.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// The instant eligibility is evaluated at.
    pub now: Timestamp,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
    /// Growth factor per consecutive failure.
    pub multiplier: u32,
}

impl BackoffPolicy {
    /// Create a policy evaluated at `now` with default delays.
    pub fn at(now: Timestamp) -> Self {
        Self {
            now,
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60 * 60),
            multiplier: 2,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay required after `attempts` consecutive failures.
    pub fn delay_for_attempts(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let exponent = attempts.saturating_sub(1).min(32);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::at(Timestamp::now())
    }
}

impl RetryPolicy for BackoffPolicy {
    fn can_retry(&self, error: &ErrorState, reference: Timestamp) -> bool {
        if error.revision_date != reference {
            return true;
        }
        if error.is_permanent() {
            return false;
        }
        let wait = self.delay_for_attempts(error.attempts);
        match self.now.duration_since(error.recorded_at) {
            Some(elapsed) => elapsed >= wait,
            None => false,
        }
    }
}
