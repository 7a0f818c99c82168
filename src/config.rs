//! Configuration for circuit breakers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::counts::Counts;
use crate::hook::StateChangeHook;
use crate::policy::{default_ready_to_trip, ReadyToTrip};
use crate::state::State;

/// Open duration used when the configured timeout is zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Half-open trial capacity used when the configured value is zero.
pub const DEFAULT_MAX_REQUESTS: u32 = 1;

/// Resolved, immutable breaker configuration.
#[derive(Clone)]
pub struct Settings {
    pub(crate) name: String,
    pub(crate) max_requests: u32,
    pub(crate) interval: Duration,
    pub(crate) timeout: Duration,
    pub(crate) success_threshold: u32,
    pub(crate) ready_to_trip: ReadyToTrip,
    pub(crate) on_state_change: StateChangeHook,
}

impl Settings {
    /// Starts a builder for a breaker called `name`.
    pub fn builder(name: impl Into<String>) -> BreakerBuilder {
        BreakerBuilder::new(name)
    }

    /// Breaker name passed to the state-change hook and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum trial calls admitted per half-open period.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Period after which closed-state counts are cleared; zero means never.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long the breaker stays open before admitting trial calls.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consecutive trial successes that close a half-open breaker.
    pub fn success_threshold(&self) -> u32 {
        self.success_threshold
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("max_requests", &self.max_requests)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("success_threshold", &self.success_threshold)
            .field("on_state_change", &self.on_state_change)
            .finish_non_exhaustive()
    }
}

/// Builder for creating circuit breakers with custom configurations.
///
/// Zero values select defaults: one half-open trial call, no closed-state
/// decay, a sixty second open timeout, and a success threshold equal to the
/// trial capacity.
pub struct BreakerBuilder {
    name: String,
    max_requests: u32,
    interval: Duration,
    timeout: Duration,
    success_threshold: u32,
    ready_to_trip: Option<ReadyToTrip>,
    on_state_change: StateChangeHook,
}

impl BreakerBuilder {
    /// Creates a new builder with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_requests: 0,
            interval: Duration::ZERO,
            timeout: Duration::ZERO,
            success_threshold: 0,
            ready_to_trip: None,
            on_state_change: StateChangeHook::none(),
        }
    }

    /// Sets the number of trial calls admitted while half-open.
    pub fn max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Sets the cyclic period after which closed-state counts are cleared.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets how long the breaker stays open.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the consecutive trial successes required to close again.
    ///
    /// Values above the trial capacity are clamped to it, since no more calls
    /// than that are admitted per half-open period.
    pub fn success_threshold(mut self, count: u32) -> Self {
        self.success_threshold = count;
        self
    }

    /// Sets the predicate that decides when a closed breaker trips.
    pub fn ready_to_trip<F>(mut self, f: F) -> Self
    where
        F: Fn(&Counts) -> bool + Send + Sync + 'static,
    {
        self.ready_to_trip = Some(Arc::new(f));
        self
    }

    /// Sets the observer called on every state transition.
    pub fn on_state_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, State, State) + Send + Sync + 'static,
    {
        self.on_state_change = StateChangeHook::new(f);
        self
    }

    /// Resolves defaults into immutable settings.
    pub fn settings(self) -> Settings {
        let max_requests = if self.max_requests == 0 {
            DEFAULT_MAX_REQUESTS
        } else {
            self.max_requests
        };

        let timeout = if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        };

        let success_threshold = match self.success_threshold {
            0 => max_requests,
            n => n.min(max_requests),
        };

        let ready_to_trip: ReadyToTrip = match self.ready_to_trip {
            Some(f) => f,
            None => Arc::new(default_ready_to_trip),
        };

        Settings {
            name: self.name,
            max_requests,
            interval: self.interval,
            timeout,
            success_threshold,
            ready_to_trip,
            on_state_change: self.on_state_change,
        }
    }

    /// Builds a new circuit breaker with the configured settings.
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self.settings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_select_defaults() {
        let settings = BreakerBuilder::new("defaults").settings();
        assert_eq!(settings.name(), "defaults");
        assert_eq!(settings.max_requests(), DEFAULT_MAX_REQUESTS);
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(settings.interval(), Duration::ZERO);
        assert_eq!(settings.success_threshold(), DEFAULT_MAX_REQUESTS);
        assert!(!settings.on_state_change.is_set());
    }

    #[test]
    fn settings_builder_matches_breaker_builder() {
        let settings = Settings::builder("orders")
            .max_requests(4)
            .timeout(Duration::from_secs(5))
            .settings();
        assert_eq!(settings.name(), "orders");
        assert_eq!(settings.max_requests(), 4);
        assert_eq!(settings.timeout(), Duration::from_secs(5));

        let breaker = Settings::builder("orders").build();
        assert_eq!(breaker.name(), "orders");
    }

    #[test]
    fn success_threshold_follows_and_is_capped_by_max_requests() {
        let settings = BreakerBuilder::new("trial").max_requests(3).settings();
        assert_eq!(settings.success_threshold(), 3);

        let settings = BreakerBuilder::new("trial")
            .max_requests(3)
            .success_threshold(2)
            .settings();
        assert_eq!(settings.success_threshold(), 2);

        let settings = BreakerBuilder::new("trial")
            .max_requests(3)
            .success_threshold(10)
            .settings();
        assert_eq!(settings.success_threshold(), 3);
    }
}
