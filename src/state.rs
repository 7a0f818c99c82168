//! Circuit breaker state machine implementation.

use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};

use crate::counts::Counts;

/// Represents the possible states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Circuit is closed and operations are allowed.
    Closed,

    /// Circuit is open and operations are rejected.
    Open,

    /// Circuit is allowing a limited number of operations to test recovery.
    HalfOpen,
}

impl State {
    /// Lowercase name used in logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed state change, reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: State,
    pub(crate) to: State,
    pub(crate) generation: u64,
}

/// State, generation and counters of one breaker.
///
/// Not synchronized on its own; the breaker keeps it behind a mutex and every
/// method here runs inside that critical section.
#[derive(Debug)]
pub(crate) struct StateMachine {
    state: State,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
    interval: Duration,
    timeout: Duration,
}

impl StateMachine {
    /// Creates a closed machine at generation zero.
    pub(crate) fn new(interval: Duration, timeout: Duration, now: Instant) -> Self {
        let mut machine = Self {
            state: State::Closed,
            generation: 0,
            counts: Counts::new(),
            expiry: None,
            interval,
            timeout,
        };
        machine.expiry = machine.expiry_for(State::Closed, now);
        machine
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn counts(&self) -> Counts {
        self.counts
    }

    pub(crate) fn counts_mut(&mut self) -> &mut Counts {
        &mut self.counts
    }

    /// Applies any timer that has elapsed by `now`.
    ///
    /// A closed breaker whose interval ran out starts a fresh generation
    /// without changing state. An open breaker whose timeout ran out moves to
    /// half-open, which is returned as a transition. A missing expiry means
    /// the deadline is past what `Instant` can represent, so it never fires.
    pub(crate) fn refresh(&mut self, now: Instant) -> Option<Transition> {
        match self.state {
            State::Closed => {
                if self.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(now);
                }
                None
            }
            State::Open => {
                if self.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(State::HalfOpen, now)
                } else {
                    None
                }
            }
            State::HalfOpen => None,
        }
    }

    /// Moves to `to`, starting a new generation. Returns `None` if the
    /// machine is already in that state.
    pub(crate) fn set_state(&mut self, to: State, now: Instant) -> Option<Transition> {
        if self.state == to {
            return None;
        }

        let from = self.state;
        self.state = to;
        self.new_generation(now);

        Some(Transition {
            from,
            to,
            generation: self.generation,
        })
    }

    fn new_generation(&mut self, now: Instant) {
        self.generation += 1;
        self.counts.clear();
        self.expiry = self.expiry_for(self.state, now);
    }

    fn expiry_for(&self, state: State, now: Instant) -> Option<Instant> {
        match state {
            State::Closed if self.interval.is_zero() => None,
            State::Closed => now.checked_add(self.interval),
            State::Open => now.checked_add(self.timeout),
            State::HalfOpen => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_bump_generation_and_clear_counts() {
        let now = Instant::now();
        let mut machine = StateMachine::new(Duration::ZERO, Duration::from_secs(1), now);
        machine.counts_mut().on_request();
        machine.counts_mut().on_failure();

        let transition = machine.set_state(State::Open, now);
        assert_eq!(
            transition,
            Some(Transition {
                from: State::Closed,
                to: State::Open,
                generation: 1,
            })
        );
        assert_eq!(machine.counts(), Counts::default());
        assert!(machine.set_state(State::Open, now).is_none());
        assert_eq!(machine.generation(), 1);
    }

    #[test]
    fn open_becomes_half_open_once_timeout_elapses() {
        let now = Instant::now();
        let timeout = Duration::from_millis(100);
        let mut machine = StateMachine::new(Duration::ZERO, timeout, now);
        machine.set_state(State::Open, now);

        assert!(machine.refresh(now + Duration::from_millis(99)).is_none());
        assert_eq!(machine.state(), State::Open);

        let transition = machine.refresh(now + timeout);
        assert_eq!(transition.map(|t| t.to), Some(State::HalfOpen));
        assert_eq!(machine.state(), State::HalfOpen);
    }

    #[test]
    fn unrepresentable_open_deadline_never_elapses() {
        let now = Instant::now();
        let mut machine = StateMachine::new(Duration::ZERO, Duration::MAX, now);
        machine.set_state(State::Open, now);

        assert!(machine.refresh(now + Duration::from_secs(86_400)).is_none());
        assert_eq!(machine.state(), State::Open);
    }

    #[test]
    fn closed_interval_decays_counts_without_transition() {
        let now = Instant::now();
        let interval = Duration::from_secs(10);
        let mut machine = StateMachine::new(interval, Duration::from_secs(1), now);
        machine.counts_mut().on_request();

        assert!(machine.refresh(now + interval).is_none());
        assert_eq!(machine.state(), State::Closed);
        assert_eq!(machine.generation(), 1);
        assert_eq!(machine.counts().requests, 0);
    }

    #[test]
    fn zero_interval_never_decays() {
        let now = Instant::now();
        let mut machine = StateMachine::new(Duration::ZERO, Duration::from_secs(1), now);
        machine.counts_mut().on_request();

        machine.refresh(now + Duration::from_secs(3600));
        assert_eq!(machine.generation(), 0);
        assert_eq!(machine.counts().requests, 1);
    }

    #[test]
    fn state_names() {
        assert_eq!(State::Closed.to_string(), "closed");
        assert_eq!(State::Open.to_string(), "open");
        assert_eq!(State::HalfOpen.to_string(), "half-open");
    }

    proptest::proptest! {
        #[test]
        fn interval_rollover_clears_counts_and_keeps_state(
            interval_ms in 1u64..10_000,
            requests in 0u32..64,
            failures in 0u32..64,
            extra_ms in 0u64..10_000,
        ) {
            let now = Instant::now();
            let interval = Duration::from_millis(interval_ms);
            let mut machine = StateMachine::new(interval, Duration::from_secs(1), now);
            for i in 0..requests {
                machine.counts_mut().on_request();
                if i < failures {
                    machine.counts_mut().on_failure();
                } else {
                    machine.counts_mut().on_success();
                }
            }
            let before = machine.counts();

            let early = now + interval - Duration::from_nanos(1);
            proptest::prop_assert!(machine.refresh(early).is_none());
            proptest::prop_assert_eq!(machine.generation(), 0);
            proptest::prop_assert_eq!(machine.counts(), before);

            let late = now + interval + Duration::from_millis(extra_ms);
            proptest::prop_assert!(machine.refresh(late).is_none());
            proptest::prop_assert_eq!(machine.state(), State::Closed);
            proptest::prop_assert_eq!(machine.generation(), 1);
            proptest::prop_assert_eq!(machine.counts(), Counts::default());

            // The next deadline is measured from the rollover, not from creation.
            proptest::prop_assert!(machine.refresh(late + interval - Duration::from_nanos(1)).is_none());
            proptest::prop_assert_eq!(machine.generation(), 1);
        }
    }
}
