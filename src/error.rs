//! Error types for the circuit breaker library.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error accepted by [`execute`](crate::execute).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for circuit breaker operations.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

/// Error returned by [`execute`](crate::execute): the breaker's own
/// rejections, or the operation's failure with execution context attached.
pub type ExecuteError = BreakerError<OperationError>;

/// Error type for circuit breaker operations.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit is open, calls are not permitted.
    #[error("circuit breaker is open")]
    Open,

    /// The circuit is half-open and its trial calls are all taken.
    #[error("too many requests")]
    TooManyRequests,

    /// The underlying operation failed.
    #[error(transparent)]
    Operation(E),
}

/// Why [`CircuitBreaker::allow`](crate::CircuitBreaker::allow) refused a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    /// The circuit is open.
    #[error("circuit breaker is open")]
    Open,

    /// The half-open trial capacity is exhausted.
    #[error("too many requests")]
    TooManyRequests,
}

/// Coarse classification of breaker errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected because the breaker is open.
    RejectedOpen,
    /// Rejected because half-open capacity is exhausted.
    RejectedCapacity,
    /// The wrapped operation itself failed.
    OperationFailure,
}

impl ErrorKind {
    /// True for the two rejection kinds, which resolve on their own once the
    /// breaker recovers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RejectedOpen | ErrorKind::RejectedCapacity)
    }

    /// Walks `err` and its `source()` chain and returns the kind of the first
    /// breaker error found.
    ///
    /// Recognizes [`ExecuteError`] and [`Rejected`] nodes. Errors from the
    /// generic [`CircuitBreaker::call`](crate::CircuitBreaker::call) carry the
    /// caller's own error type and are classified with
    /// [`BreakerError::kind`] instead.
    pub fn find(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
        let mut current = Some(err);
        while let Some(err) = current {
            if let Some(execute) = err.downcast_ref::<ExecuteError>() {
                return Some(execute.kind());
            }
            if let Some(rejected) = err.downcast_ref::<Rejected>() {
                return Some(rejected.kind());
            }
            current = err.source();
        }
        None
    }
}

impl<E> BreakerError<E> {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BreakerError::Open => ErrorKind::RejectedOpen,
            BreakerError::TooManyRequests => ErrorKind::RejectedCapacity,
            BreakerError::Operation(_) => ErrorKind::OperationFailure,
        }
    }

    /// True if the breaker refused the call without running it.
    pub fn is_rejected(&self) -> bool {
        !matches!(self, BreakerError::Operation(_))
    }

    /// Returns the operation's error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the operation error, keeping rejections as they are.
    pub fn map_operation<F, O>(self, f: O) -> BreakerError<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            BreakerError::Open => BreakerError::Open,
            BreakerError::TooManyRequests => BreakerError::TooManyRequests,
            BreakerError::Operation(e) => BreakerError::Operation(f(e)),
        }
    }
}

impl Rejected {
    /// Classifies this rejection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Rejected::Open => ErrorKind::RejectedOpen,
            Rejected::TooManyRequests => ErrorKind::RejectedCapacity,
        }
    }
}

impl<E> From<Rejected> for BreakerError<E> {
    fn from(rejected: Rejected) -> Self {
        match rejected {
            Rejected::Open => BreakerError::Open,
            Rejected::TooManyRequests => BreakerError::TooManyRequests,
        }
    }
}

/// An operation failure observed by [`execute`](crate::execute).
#[derive(Debug, Error)]
#[error("error executing circuit breaker func")]
pub struct OperationError {
    #[source]
    source: BoxError,
}

impl OperationError {
    /// Wraps the operation's error.
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Borrows the operation's original error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Returns the operation's original error.
    pub fn into_inner(self) -> BoxError {
        self.source
    }

    /// Attempts to downcast the original error to a concrete type.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.source.downcast_ref::<T>()
    }
}
