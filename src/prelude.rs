//! Re-exports common types for convenient usage.
//!
//! # Example
//! ```rust,no_run
//! use breakwater::prelude::*;
//!
//! let breaker = CircuitBreaker::builder("search").build();
//! let _ = execute(&breaker, || Ok::<_, BoxError>(()));
//! ```

pub use crate::{
    execute, BoxError, BreakerError, CircuitBreaker, Counts, ErrorKind, ExecuteError, State,
};
