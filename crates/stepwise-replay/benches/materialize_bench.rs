//! Benchmarks for trace materialization
//!
//! Measures performance of:
//! - Direct materialization from the initial state
//! - Incremental stepping through the cached frame
//! - Snapshot lookups

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stepwise_replay::{Accumulator, Materialized};
use stepwise_trace::{Domain, Position, Step, StepKind, Trace, VisualState};

/// A deterministic pseudo-random run of compares and swaps.
fn run(len: usize, steps: usize) -> (Arc<VisualState>, Trace) {
    let values: Vec<i64> = (0..len as i64).rev().collect();
    let mut seed = 0x9e37_79b9_u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % len as u64) as usize
    };
    let kinds = (0..steps)
        .map(|n| {
            let (i, j) = (next(), next());
            if n % 3 == 0 {
                StepKind::Swap { i, j }
            } else {
                StepKind::Compare { i, j }
            }
        })
        .map(Step::new)
        .collect();
    (Arc::new(VisualState::array(values)), Trace::new(kinds))
}

/// Benchmark folding to the last step from scratch
fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    let acc = Accumulator::for_domain(Domain::Array);

    for &steps in &[100usize, 1_000, 10_000] {
        let (initial, trace) = run(64, steps);
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_with_input(BenchmarkId::from_parameter(steps), &trace, |b, trace| {
            b.iter(|| acc.materialize(&initial, trace, black_box(trace.last_position())))
        });
    }
    group.finish();
}

/// Benchmark stepping forward through a whole trace
fn bench_step_through(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_through");
    let acc = Accumulator::for_domain(Domain::Array);

    for &steps in &[100usize, 1_000] {
        let (initial, trace) = run(64, steps);
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_with_input(BenchmarkId::from_parameter(steps), &trace, |b, trace| {
            b.iter(|| {
                let mut frame = Materialized::initial(trace.id(), Arc::clone(&initial));
                for i in 0..trace.len() {
                    if let Ok(next) = acc.seek(&initial, trace, &frame, Position::at(i)) {
                        frame = next;
                    }
                }
                frame
            })
        });
    }
    group.finish();
}

/// Benchmark seeking a trace whose steps all carry snapshots
fn bench_snapshot_seek(c: &mut Criterion) {
    let acc = Accumulator::for_domain(Domain::Array);
    let (initial, plain) = run(64, 1_000);
    let steps = (0..plain.len())
        .filter_map(|i| {
            let state = acc.materialize(&initial, &plain, Position::at(i)).ok()?.state;
            Some(plain.steps()[i].clone().with_snapshot(state))
        })
        .collect();
    let trace = Trace::new(steps);

    c.bench_function("snapshot_seek", |b| {
        b.iter(|| acc.materialize(&initial, &trace, black_box(Position::at(777))))
    });
}

criterion_group!(
    benches,
    bench_materialize,
    bench_step_through,
    bench_snapshot_seek,
);
criterion_main!(benches);
