//! Trip predicates deciding when a closed breaker opens.

use std::sync::Arc;

use crate::counts::Counts;

/// Predicate consulted after every failure recorded while closed.
pub type ReadyToTrip = Arc<dyn Fn(&Counts) -> bool + Send + Sync + 'static>;

/// Consecutive failures the default predicate tolerates before tripping.
pub const DEFAULT_CONSECUTIVE_FAILURES: u32 = 5;

/// Trips once more than [`DEFAULT_CONSECUTIVE_FAILURES`] failures occur in a row.
pub fn default_ready_to_trip(counts: &Counts) -> bool {
    counts.consecutive_failures > DEFAULT_CONSECUTIVE_FAILURES
}

/// Trips once `threshold` failures occur in a row.
pub fn consecutive_failures(threshold: u32) -> impl Fn(&Counts) -> bool + Send + Sync + 'static {
    move |counts: &Counts| counts.consecutive_failures >= threshold
}

/// Trips when at least `min_requests` have been made and the failure ratio
/// reaches `threshold`.
pub fn failure_ratio(
    min_requests: u32,
    threshold: f64,
) -> impl Fn(&Counts) -> bool + Send + Sync + 'static {
    move |counts: &Counts| counts.requests >= min_requests && counts.failure_ratio() >= threshold
}
