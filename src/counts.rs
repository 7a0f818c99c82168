//! Request and outcome tallies for a single breaker generation.

/// Counts of requests and their outcomes since the last generation change.
///
/// The breaker clears these on every state transition, and periodically while
/// closed when an interval is configured. Values handed out by
/// [`CircuitBreaker::counts`](crate::CircuitBreaker::counts) are snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Number of admitted requests.
    pub requests: u32,
    /// Number of recorded successes.
    pub total_successes: u32,
    /// Number of recorded failures.
    pub total_failures: u32,
    /// Successes since the last failure.
    pub consecutive_successes: u32,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

impl Counts {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    pub(crate) fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    pub(crate) fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fraction of admitted requests that failed, or `0.0` before any request.
    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }

        self.total_failures as f64 / self.requests as f64
    }
}
