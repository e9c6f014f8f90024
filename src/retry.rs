//! Retry policy attached to built requests.
//!
//! The policy is a plain configuration value threaded through the builder;
//! there is no process-wide default beyond [`RetryPolicy::lenient`]. The
//! executor owns retry execution, the builder only carries the policy.

use std::time::Duration;

use rand::Rng;

/// Per-request retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first re-attempt.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay between consecutive re-attempts.
    pub backoff_multiplier: f64,
    /// Whether to randomize delays to avoid thundering herds.
    pub use_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::lenient()
    }
}

impl RetryPolicy {
    /// The lenient default: generous 20 s per-attempt timeout, a single
    /// re-attempt, and no backoff escalation. Errors are returned to the
    /// caller rather than retried aggressively.
    pub const fn lenient() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_attempts: 2,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            use_jitter: false,
        }
    }

    /// Set the per-attempt timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total attempt count (minimum 1).
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Set the delay before the first re-attempt.
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Delay to sleep before re-attempt number `attempt` (0-based: 0 is the
    /// delay between the first and second attempt).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(base as u64);

        if self.use_jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }
}

fn add_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as f64;
    if millis == 0.0 {
        return delay;
    }
    let jitter_range = millis * 0.1;
    let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
    Duration::from_millis((millis + jitter).max(0.0) as u64)
}
