//! Criterion micro-benchmarks for extraction of derived quantities.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use quark_bench::reference_profile;
use quark_comm::SerialComm;
use quark_library::{Instance, Scope, Shape};

fn instance(lines: &[&str]) -> Instance {
    let mut inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
    inst.run_batch(lines);
    assert!(!inst.has_error(), "{:?}", inst.last_error());
    inst
}

/// Benchmark: a compute already current for this timestep.
fn bench_compute_cached(c: &mut Criterion) {
    let mut inst = instance(&["compute ke all ke"]);

    c.bench_function("compute_scalar_cached", |b| {
        b.iter(|| {
            let ke = inst
                .extract_computed("ke", Scope::Global, Shape::Scalar)
                .and_then(|d| d.as_scalar());
            std::hint::black_box(ke);
        });
    });
}

/// Benchmark: a per-particle compute invalidated before every call.
fn bench_compute_refresh(c: &mut Criterion) {
    let mut inst = instance(&["compute kea all ke/atom"]);

    c.bench_function("compute_per_particle_refresh_1k", |b| {
        b.iter(|| {
            if let Some(quark_library::GlobalMut::BigInt(step)) = inst.get_global_mut("ntimestep") {
                *step += 1;
            }
            let sum: Option<f64> = inst
                .extract_computed("kea", Scope::PerParticle, Shape::Vector)
                .and_then(|d| d.as_vector())
                .map(|v| v.iter().sum());
            std::hint::black_box(sum);
        });
    });
}

/// Benchmark: evaluate an atom-style variable over 1000 particles.
fn bench_atom_variable(c: &mut Criterion) {
    let mut inst = instance(&["variable m atom mass*2"]);

    c.bench_function("atom_variable_1k", |b| {
        b.iter(|| {
            let value = inst.extract_expression("m", Some("all"));
            std::hint::black_box(value);
        });
    });
}

/// Benchmark: one thermo keyword evaluated on demand.
fn bench_thermo_temp(c: &mut Criterion) {
    let mut inst = instance(&[]);

    c.bench_function("thermo_temp_1k", |b| {
        b.iter(|| {
            std::hint::black_box(inst.get_thermo("temp"));
        });
    });
}

criterion_group!(
    benches,
    bench_compute_cached,
    bench_compute_refresh,
    bench_atom_variable,
    bench_thermo_temp
);
criterion_main!(benches);
