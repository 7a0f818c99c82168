//! Typed execution through a shared breaker.
//!
//! [`execute`] lets any fallible operation run through a [`CircuitBreaker`]
//! and hands back the operation's own result type. Failures come back as an
//! [`ExecuteError`], a single concrete error type whatever the operation's
//! error was, so callers can classify it with [`ErrorKind::find`] even after
//! wrapping it in their own errors.
//!
//! [`ErrorKind::find`]: crate::ErrorKind::find

use crate::breaker::CircuitBreaker;
use crate::error::{BoxError, BreakerError, ExecuteError, OperationError};

/// Runs `f` through `breaker` and returns its value unchanged.
///
/// An operation error is wrapped in an [`OperationError`] that keeps the
/// original as its source. Rejections are returned as
/// [`BreakerError::Open`] or [`BreakerError::TooManyRequests`].
///
/// ```rust
/// use breakwater::{execute, CircuitBreaker};
///
/// #[derive(Debug, PartialEq)]
/// struct Response(String);
///
/// let breaker = CircuitBreaker::builder("catalog").build();
/// let res: Response = execute(&breaker, || {
///     Ok::<_, std::io::Error>(Response("7".into()))
/// })
/// .unwrap();
/// assert_eq!(res, Response("7".into()));
/// ```
pub fn execute<F, T, E>(breaker: &CircuitBreaker, f: F) -> Result<T, ExecuteError>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    breaker
        .call(f)
        .map_err(|err: BreakerError<E>| err.map_operation(OperationError::new))
}

/// Async counterpart of [`execute`].
#[cfg(feature = "async")]
pub async fn execute_async<F, Fut, T, E>(breaker: &CircuitBreaker, f: F) -> Result<T, ExecuteError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    breaker
        .call_async(f)
        .await
        .map_err(|err: BreakerError<E>| err.map_operation(OperationError::new))
}
