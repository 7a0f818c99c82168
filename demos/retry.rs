//! Drives a flaky client through a breaker and marks rejections as retryable.
//!
//! Run with `RUST_LOG=debug cargo run --example retry` to see state changes.

use breakwater::{execute, CircuitBreaker, ErrorKind, ExecuteError};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("retry error")]
    Retry(#[source] ExecuteError),
    #[error(transparent)]
    Fatal(ExecuteError),
}

impl From<ExecuteError> for CallError {
    fn from(err: ExecuteError) -> Self {
        match err.kind() {
            kind if kind.is_retryable() => CallError::Retry(err),
            _ => CallError::Fatal(err),
        }
    }
}

#[derive(Debug, Clone)]
struct Response(String);

#[derive(Debug, thiserror::Error)]
#[error("error getting response")]
struct ClientError;

struct Client;

impl Client {
    fn get(&self, i: usize) -> Result<Response, ClientError> {
        if i < 20 {
            return Err(ClientError);
        }

        Ok(Response(i.to_string()))
    }
}

fn report(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let breaker = CircuitBreaker::builder("test")
        .timeout(Duration::from_millis(250))
        .build();
    let client = Client;

    for i in 0..50 {
        match execute(&breaker, || client.get(i)).map_err(CallError::from) {
            Ok(res) => info!("result {i}: {}", res.0),
            Err(err) => {
                let retryable = ErrorKind::find(&err).is_some_and(|k| k.is_retryable());
                warn!(retryable, "error response {i}: {}", report(&err));
            }
        }

        thread::sleep(Duration::from_millis(100));
    }
}
