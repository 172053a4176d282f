//! Criterion micro-benchmarks for distributed exchange.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use quark_bench::{init_positions, profile, reference_profile};
use quark_comm::{SerialComm, ThreadedGroup};
use quark_library::{CreateParticles, ExchangeBuf, ExchangeSlice};

/// Benchmark: gather all positions of a 1000-particle serial instance.
fn bench_gather_x_1k(c: &mut Criterion) {
    let mut inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
    let mut out = vec![0.0; 3000];

    c.bench_function("gather_x_1k", |b| {
        b.iter(|| {
            inst.gather("x", 3, ExchangeBuf::Double(&mut out)).unwrap();
            std::hint::black_box(&out);
        });
    });
}

/// Benchmark: gather the integer type column.
fn bench_gather_type_1k(c: &mut Criterion) {
    let mut inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
    let mut out = vec![0; 1000];

    c.bench_function("gather_type_1k", |b| {
        b.iter(|| {
            inst.gather("type", 1, ExchangeBuf::Int(&mut out)).unwrap();
            std::hint::black_box(&out);
        });
    });
}

/// Benchmark: scatter velocities back into a 1000-particle instance.
fn bench_scatter_v_1k(c: &mut Criterion) {
    let mut inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
    let v: Vec<f64> = (0..3000).map(|k| (k % 7) as f64 * 0.1).collect();

    c.bench_function("scatter_v_1k", |b| {
        b.iter(|| {
            inst.scatter("v", 3, ExchangeSlice::Double(&v)).unwrap();
        });
    });
}

/// Benchmark: create 1000 particles into an empty box.
fn bench_create_1k(c: &mut Criterion) {
    let x = init_positions(1000, 10.0, 7);
    let types = vec![1; 1000];

    c.bench_function("create_1k", |b| {
        b.iter_batched(
            || profile(Arc::new(SerialComm::new()), 0, 10.0).unwrap(),
            |mut inst| {
                let kept = inst
                    .create_particles(&CreateParticles {
                        types: &types,
                        x: &x,
                        ..Default::default()
                    })
                    .unwrap();
                std::hint::black_box(kept);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Benchmark: one full gather of positions across 4 threaded ranks,
/// including instance setup.
fn bench_threaded_gather_4(c: &mut Criterion) {
    c.bench_function("threaded_gather_x_4ranks", |b| {
        b.iter(|| {
            let sums = ThreadedGroup::run(4, |comm| {
                let mut inst = profile(Arc::new(comm), 1000, 10.0).unwrap();
                let mut out = vec![0.0; 3000];
                inst.gather("x", 3, ExchangeBuf::Double(&mut out)).unwrap();
                out.iter().sum::<f64>()
            });
            std::hint::black_box(sums);
        });
    });
}

criterion_group!(
    benches,
    bench_gather_x_1k,
    bench_gather_type_1k,
    bench_scatter_v_1k,
    bench_create_1k,
    bench_threaded_gather_4
);
criterion_main!(benches);
