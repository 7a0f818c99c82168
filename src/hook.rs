//! Observer hook for circuit breaker state changes.

use std::fmt;
use std::sync::Arc;

use crate::state::State;

type HookFn = Arc<dyn Fn(&str, State, State) + Send + Sync + 'static>;

/// Callback invoked with `(name, from, to)` on every state transition.
///
/// The breaker calls it synchronously while holding its state lock, so
/// transitions are observed in the order they happen. The callback must not
/// call back into the breaker that invoked it.
#[derive(Clone, Default)]
pub struct StateChangeHook {
    on_change: Option<HookFn>,
}

impl StateChangeHook {
    /// A hook that does nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps `f` as a hook.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, State, State) + Send + Sync + 'static,
    {
        Self {
            on_change: Some(Arc::new(f)),
        }
    }

    /// Whether a callback is installed.
    pub fn is_set(&self) -> bool {
        self.on_change.is_some()
    }

    pub(crate) fn execute(&self, name: &str, from: State, to: State) {
        if let Some(hook) = self.on_change.as_ref() {
            hook(name, from, to);
        }
    }
}

impl fmt::Debug for StateChangeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChangeHook")
            .field("set", &self.is_set())
            .finish()
    }
}
