use breakwater::{execute, policy, CircuitBreaker};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("benchmark error: {0}")]
struct BenchError(&'static str);

fn successful_operation() -> Result<(), BenchError> {
    Ok(())
}

fn failing_operation() -> Result<(), BenchError> {
    Err(BenchError("simulated failure"))
}

fn bench_circuit_breaker_closed(c: &mut Criterion) {
    let breaker = CircuitBreaker::builder("bench-closed")
        .timeout(Duration::from_secs(30))
        .build();

    c.bench_function("circuit_breaker_closed_success", |b| {
        b.iter(|| black_box(breaker.call(successful_operation)));
    });

    c.bench_function("execute_closed_success", |b| {
        b.iter(|| black_box(execute(&breaker, successful_operation)));
    });
}

fn bench_circuit_breaker_open(c: &mut Criterion) {
    let breaker = CircuitBreaker::builder("bench-open")
        .timeout(Duration::from_secs(3600))
        .build();
    breaker.force_open();

    c.bench_function("circuit_breaker_open_rejection", |b| {
        b.iter(|| black_box(breaker.call(successful_operation)));
    });
}

fn bench_circuit_breaker_transition(c: &mut Criterion) {
    let breaker = CircuitBreaker::builder("bench-transition")
        .ready_to_trip(policy::consecutive_failures(5))
        .timeout(Duration::from_secs(30))
        .build();

    c.bench_function("circuit_breaker_transition", |b| {
        b.iter_custom(|iters| {
            let start = std::time::Instant::now();

            for _ in 0..iters {
                // Force closed to ensure consistent starting point
                breaker.force_closed();

                for _ in 0..5 {
                    let _ = black_box(breaker.call(failing_operation));
                }

                // One open-circuit rejection
                let _ = black_box(breaker.call(successful_operation));
            }

            start.elapsed()
        });
    });
}

fn bench_circuit_breaker_concurrent(c: &mut Criterion) {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let breaker = CircuitBreaker::builder("bench-concurrent")
        .ready_to_trip(policy::consecutive_failures(100))
        .timeout(Duration::from_secs(30))
        .build();

    const THREAD_COUNT: usize = 4;
    const ITERATIONS_PER_THREAD: usize = 1000;

    c.bench_function("circuit_breaker_concurrent", |b| {
        b.iter(|| {
            let barrier = Arc::new(Barrier::new(THREAD_COUNT + 1));
            let mut handles = Vec::with_capacity(THREAD_COUNT);

            for _ in 0..THREAD_COUNT {
                let thread_breaker = breaker.clone();
                let thread_barrier = Arc::clone(&barrier);

                handles.push(thread::spawn(move || {
                    thread_barrier.wait();
                    for _ in 0..ITERATIONS_PER_THREAD {
                        let _ = black_box(thread_breaker.call(successful_operation));
                    }
                }));
            }

            // Start all threads simultaneously
            barrier.wait();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_circuit_breaker_closed,
    bench_circuit_breaker_open,
    bench_circuit_breaker_transition,
    bench_circuit_breaker_concurrent
);
criterion_main!(benches);
