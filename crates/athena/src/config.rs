use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval between status polls when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ── PollPolicy ───────────────────────────────────────────────────

/// How the runner waits for a query execution to reach a terminal state.
///
/// The default polls every 2 seconds with no deadline and no attempt cap,
/// so a query that never leaves RUNNING is waited on forever. Set
/// `timeout` or `max_attempts` to bound the wait; `backoff_factor > 1.0`
/// grows the interval up to `max_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub interval: Duration,
    /// Multiplier applied to the delay after every poll (1.0 = fixed).
    pub backoff_factor: f64,
    /// Upper bound for the delay when backing off.
    pub max_interval: Duration,
    /// Give up once this much time has elapsed since the first poll.
    pub timeout: Option<Duration>,
    /// Give up after this many status polls.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff_factor: 1.0,
            max_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval polling.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.max_interval = interval;
        self.backoff_factor = 1.0;
        self
    }

    /// Grow the delay by `factor` after every poll, up to `max_interval`.
    /// Factors that are not finite or not above 1.0 keep the interval fixed.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = if factor.is_finite() && factor > 1.0 { factor } else { 1.0 };
        self.max_interval = max_interval.max(self.interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// `true` when neither a deadline nor an attempt cap is set.
    pub fn is_unbounded(&self) -> bool {
        self.timeout.is_none() && self.max_attempts.is_none()
    }

    /// Delay to use after sleeping for `current`.
    ///
    /// A deserialized policy may carry any factor, so NaN and infinite
    /// factors are treated as fixed and overflow saturates at `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return current;
        }
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }

    /// Whether the wait should stop after `attempts` polls and `elapsed` time.
    pub fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        matches!(self.timeout, Some(t) if elapsed >= t)
    }
}
