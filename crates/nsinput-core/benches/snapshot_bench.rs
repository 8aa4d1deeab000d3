//! Criterion benchmarks for [`SnapshotList`] on the delivery path.
//!
//! Measures the cost of taking a snapshot and walking it, which is what every
//! device event pays before reaching its clients, both idle and while a writer
//! keeps republishing the list.
//!
//! Run with:
//! ```bash
//! cargo bench --package nsinput-core --bench snapshot_bench
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nsinput_core::SnapshotList;

fn build_list(n: usize) -> SnapshotList<u64> {
    let list = SnapshotList::new();
    for i in 0..n as u64 {
        list.insert(i);
    }
    list
}

fn bench_snapshot_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_walk");
    for n in [1usize, 8, 64] {
        let list = build_list(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| {
                let sum: u64 = list.snapshot().iter().sum();
                black_box(sum)
            })
        });
    }
    group.finish();
}

fn bench_snapshot_walk_under_churn(c: &mut Criterion) {
    let list = Arc::new(build_list(8));
    let running = Arc::new(AtomicBool::new(true));

    let churn = {
        let list = Arc::clone(&list);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut next = 1_000u64;
            while running.load(Ordering::Relaxed) {
                list.insert(next);
                list.remove_first(|v| *v == next);
                next += 1;
            }
        })
    };

    c.bench_function("snapshot_walk_under_churn", |b| {
        b.iter(|| {
            let sum: u64 = list.snapshot().iter().sum();
            black_box(sum)
        })
    });

    running.store(false, Ordering::Relaxed);
    let _ = churn.join();
}

criterion_group!(benches, bench_snapshot_walk, bench_snapshot_walk_under_churn);
criterion_main!(benches);
