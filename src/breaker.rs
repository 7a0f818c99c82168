//! Core circuit breaker implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::{BreakerBuilder, Settings};
use crate::counts::Counts;
use crate::error::{BreakerError, BreakerResult, Rejected};
use crate::state::{State, StateMachine, Transition};

/// Inner state of the circuit breaker, shared between clones.
struct BreakerInner {
    settings: Settings,
    machine: Mutex<StateMachine>,
}

/// A circuit breaker that can wrap function calls to prevent cascading failures.
///
/// Cloning is cheap and every clone drives the same state, so one breaker can
/// be handed to any number of threads or tasks. The breaker only stores call
/// outcomes; the result and error types are chosen per call.
///
/// ```rust
/// use breakwater::{BreakerError, CircuitBreaker, State};
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::builder("inventory")
///     .timeout(Duration::from_millis(250))
///     .ready_to_trip(|counts| counts.consecutive_failures >= 2)
///     .build();
///
/// for _ in 0..2 {
///     let _ = breaker.call(|| Err::<(), _>("connection refused"));
/// }
/// assert_eq!(breaker.state(), State::Open);
///
/// let rejected = breaker.call(|| Ok::<_, &str>(42));
/// assert!(matches!(rejected, Err(BreakerError::Open)));
/// ```
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<BreakerInner>,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker from resolved settings.
    pub fn new(settings: Settings) -> Self {
        let machine = StateMachine::new(settings.interval, settings.timeout, Instant::now());
        let inner = BreakerInner {
            settings,
            machine: Mutex::new(machine),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Creates a new builder for customizing a circuit breaker.
    pub fn builder(name: impl Into<String>) -> BreakerBuilder {
        BreakerBuilder::new(name)
    }

    /// The breaker's name.
    pub fn name(&self) -> &str {
        &self.inner.settings.name
    }

    /// The settings this breaker was built with.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Gets the current state, applying any elapsed timer first.
    ///
    /// An open breaker whose timeout has passed reports (and becomes)
    /// half-open.
    pub fn state(&self) -> State {
        let mut machine = self.inner.machine.lock();
        self.inner.refresh(&mut machine, Instant::now());
        machine.state()
    }

    /// Snapshot of the counts for the current generation.
    pub fn counts(&self) -> Counts {
        self.inner.machine.lock().counts()
    }

    /// Current generation; it increases on every state change and on every
    /// closed-state interval rollover.
    pub fn generation(&self) -> u64 {
        self.inner.machine.lock().generation()
    }

    /// Executes a function wrapped by the circuit breaker.
    ///
    /// Rejected calls return [`BreakerError::Open`] or
    /// [`BreakerError::TooManyRequests`] without running `f`. Admitted calls
    /// run `f` with no breaker lock held and return its result, with an error
    /// wrapped in [`BreakerError::Operation`]. A panic in `f` is recorded as
    /// a failure and then keeps unwinding.
    pub fn call<F, T, E>(&self, f: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.call_with_classifier(f, Result::is_ok)
    }

    /// Like [`call`](Self::call), but `is_successful` decides whether the
    /// result counts as a success. Useful when some errors, such as a
    /// not-found reply, say nothing about the health of the dependency.
    pub fn call_with_classifier<F, T, E, C>(&self, f: F, is_successful: C) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        C: FnOnce(&Result<T, E>) -> bool,
    {
        let permit = self.allow()?;
        let result = f();
        permit.done(is_successful(&result));

        result.map_err(BreakerError::Operation)
    }

    /// Asks for admission without running anything.
    ///
    /// The returned [`Permit`] must be resolved with
    /// [`success`](Permit::success), [`failure`](Permit::failure) or
    /// [`done`](Permit::done). Dropping it unresolved records a failure.
    pub fn allow(&self) -> Result<Permit, Rejected> {
        let generation = self.inner.before_request()?;
        Ok(Permit {
            inner: Arc::clone(&self.inner),
            generation,
            resolved: false,
        })
    }

    /// Forces the circuit breaker to the open state.
    ///
    /// Returns `false` if it was already open.
    pub fn force_open(&self) -> bool {
        self.inner.force(State::Open)
    }

    /// Forces the circuit breaker to the closed state.
    ///
    /// Returns `false` if it was already closed.
    pub fn force_closed(&self) -> bool {
        self.inner.force(State::Closed)
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.inner.machine.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.inner.settings.name)
            .field("state", &machine.state())
            .field("generation", &machine.generation())
            .field("counts", &machine.counts())
            .finish()
    }
}

impl BreakerInner {
    /// Admission check. Returns the generation the call belongs to.
    fn before_request(&self) -> Result<u64, Rejected> {
        let mut machine = self.machine.lock();
        self.refresh(&mut machine, Instant::now());

        match machine.state() {
            State::Open => {
                trace!(breaker = %self.settings.name, "rejected: circuit open");
                return Err(Rejected::Open);
            }
            State::HalfOpen if machine.counts().requests >= self.settings.max_requests => {
                trace!(breaker = %self.settings.name, "rejected: half-open capacity exhausted");
                return Err(Rejected::TooManyRequests);
            }
            State::Closed | State::HalfOpen => {}
        }

        machine.counts_mut().on_request();
        Ok(machine.generation())
    }

    /// Records an outcome for a call admitted in `generation`.
    fn after_request(&self, generation: u64, success: bool) {
        let mut machine = self.machine.lock();
        let now = Instant::now();
        self.refresh(&mut machine, now);

        if machine.generation() != generation {
            trace!(
                breaker = %self.settings.name,
                admitted = generation,
                current = machine.generation(),
                "discarding outcome from a previous generation"
            );
            return;
        }

        if success {
            self.on_success(&mut machine, now);
        } else {
            self.on_failure(&mut machine, now);
        }
    }

    fn on_success(&self, machine: &mut StateMachine, now: Instant) {
        match machine.state() {
            State::Closed => machine.counts_mut().on_success(),
            State::HalfOpen => {
                machine.counts_mut().on_success();
                if machine.counts().consecutive_successes >= self.settings.success_threshold {
                    self.transition(machine, State::Closed, now);
                }
            }
            State::Open => {}
        }
    }

    fn on_failure(&self, machine: &mut StateMachine, now: Instant) {
        match machine.state() {
            State::Closed => {
                machine.counts_mut().on_failure();
                if (self.settings.ready_to_trip)(&machine.counts()) {
                    self.transition(machine, State::Open, now);
                }
            }
            State::HalfOpen => {
                self.transition(machine, State::Open, now);
            }
            State::Open => {}
        }
    }

    fn force(&self, to: State) -> bool {
        let mut machine = self.machine.lock();
        let now = Instant::now();
        self.refresh(&mut machine, now);
        self.transition(&mut machine, to, now)
    }

    fn refresh(&self, machine: &mut StateMachine, now: Instant) {
        if let Some(transition) = machine.refresh(now) {
            self.notify(transition);
        }
    }

    fn transition(&self, machine: &mut StateMachine, to: State, now: Instant) -> bool {
        match machine.set_state(to, now) {
            Some(transition) => {
                self.notify(transition);
                true
            }
            None => false,
        }
    }

    // Runs with the state lock held so observers see transitions in order.
    fn notify(&self, transition: Transition) {
        debug!(
            breaker = %self.settings.name,
            from = %transition.from,
            to = %transition.to,
            generation = transition.generation,
            "circuit breaker state changed"
        );

        self.settings
            .on_state_change
            .execute(&self.settings.name, transition.from, transition.to);
    }
}

/// Admission token from [`CircuitBreaker::allow`].
///
/// Carries the generation it was issued in; an outcome reported after the
/// breaker has moved on is discarded.
#[must_use = "an unresolved permit is recorded as a failure when dropped"]
pub struct Permit {
    inner: Arc<BreakerInner>,
    generation: u64,
    resolved: bool,
}

impl Permit {
    /// The generation this permit was admitted in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records a successful call.
    pub fn success(self) {
        self.done(true);
    }

    /// Records a failed call.
    pub fn failure(self) {
        self.done(false);
    }

    /// Records the call's outcome.
    pub fn done(mut self, success: bool) {
        self.resolved = true;
        self.inner.after_request(self.generation, success);
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.resolved {
            self.inner.after_request(self.generation, false);
        }
    }
}

impl fmt::Debug for Permit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("breaker", &self.inner.settings.name)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(feature = "async")]
impl CircuitBreaker {
    /// Executes an async function wrapped by the circuit breaker.
    ///
    /// If the returned future is dropped before the operation completes, the
    /// call is recorded as a failure.
    pub async fn call_async<F, Fut, T, E>(&self, f: F) -> BreakerResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let permit = self.allow()?;
        let result = f().await;
        permit.done(result.is_ok());

        result.map_err(BreakerError::Operation)
    }
}
