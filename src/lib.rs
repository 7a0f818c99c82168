//! # breakwater
//!
//! A circuit breaker that tracks call outcomes per generation, plus a typed
//! execution wrapper for running heterogeneous operations through one shared
//! breaker.
//!
//! ## What is a Circuit Breaker?
//!
//! The Circuit Breaker pattern helps prevent cascading failures in distributed systems
//! by temporarily disabling operations that are likely to fail. It operates in three
//! states:
//!
//! - **Closed**: Normal operation. Calls pass through and outcomes are counted.
//!   When the trip predicate holds, the breaker opens.
//! - **Open**: Calls are rejected immediately until the timeout elapses.
//! - **Half-Open**: A bounded number of trial calls are admitted. Enough
//!   consecutive successes close the breaker; any failure opens it again.
//!
//! Every transition starts a new *generation* and clears the counts. A call
//! that was admitted in an earlier generation cannot affect the counts of the
//! current one, however long it ran.
//!
//! ## Basic Usage
//!
//! ```rust
//! use breakwater::{execute, policy, CircuitBreaker, ErrorKind, State};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("service unavailable")]
//! struct ServiceError;
//!
//! let breaker = CircuitBreaker::builder("payments")
//!     .timeout(Duration::from_millis(250))
//!     .ready_to_trip(policy::consecutive_failures(5))
//!     .on_state_change(|name, from, to| println!("{name}: {from} -> {to}"))
//!     .build();
//!
//! for _ in 0..5 {
//!     let err = execute(&breaker, || Err::<u32, _>(ServiceError)).unwrap_err();
//!     assert_eq!(err.kind(), ErrorKind::OperationFailure);
//! }
//! assert_eq!(breaker.state(), State::Open);
//!
//! let err = execute(&breaker, || Ok::<_, ServiceError>(1)).unwrap_err();
//! assert!(err.kind().is_retryable());
//! ```
//!
//! ## Async Support
//!
//! With the `async` feature enabled, futures go through the same admission
//! protocol:
//!
//! ```rust,ignore
//! let value = breaker.call_async(|| async { fetch().await }).await?;
//! ```
//!
//! ## Logging
//!
//! State changes are emitted as `tracing` events at `debug` level and
//! rejections at `trace` level. The library never installs a subscriber.
//!
//! ## Features
//!
//! - `async` - `call_async` and `execute_async`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod config;
mod counts;
mod error;
mod execute;
mod hook;
pub mod policy;
pub mod prelude;
mod state;

// Re-exports
pub use breaker::{CircuitBreaker, Permit};
pub use config::{BreakerBuilder, Settings, DEFAULT_MAX_REQUESTS, DEFAULT_TIMEOUT};
pub use counts::Counts;
pub use error::{
    BoxError, BreakerError, BreakerResult, ErrorKind, ExecuteError, OperationError, Rejected,
};
pub use execute::execute;
#[cfg(feature = "async")]
pub use execute::execute_async;
pub use hook::StateChangeHook;
pub use state::State;
