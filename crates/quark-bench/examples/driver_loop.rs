//! End-to-end embedding loop example.
//!
//! Demonstrates: open an instance → populate it → advance with `run` →
//! gather velocities → rescale them in the driver → scatter them back →
//! read thermo values between segments.
//!
//! Set `RUST_LOG=quark_library=debug` to see the engine's own tracing.

use std::sync::Arc;

use quark_bench::reference_profile;
use quark_comm::SerialComm;
use quark_library::{ExchangeBuf, ExchangeSlice, Scope, Shape};
use tracing_subscriber::EnvFilter;

const TARGET_TEMP: f64 = 0.5;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Quark Driver Loop Example ===\n");

    let mut inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
    inst.run_batch(&[
        "fix integrate all nve",
        "fix push all addforce 0.01 0.0 0.0",
        "compute kea all ke/atom",
    ]);
    assert!(!inst.has_error(), "{:?}", inst.last_error());

    let natoms = inst.natoms() as usize;
    println!("Particles: {natoms}");
    println!("Target temperature: {TARGET_TEMP}\n");

    let mut v = vec![0.0; 3 * natoms];
    for segment in 0..5 {
        inst.run_one("run 20");
        if let Some(failure) = inst.take_error() {
            eprintln!("segment {segment} failed: {}", failure.message);
            return;
        }

        let temp = inst.get_thermo("temp").unwrap_or(0.0);
        let peak = inst
            .extract_computed("kea", Scope::PerParticle, Shape::Vector)
            .and_then(|d| d.as_vector())
            .map(|ke| ke.iter().cloned().fold(0.0, f64::max))
            .unwrap_or(0.0);
        println!("  segment {segment}: T = {temp:.4}, max ke = {peak:.4}");

        // Velocity rescale done by the driver instead of a thermostat fix.
        inst.gather("v", 3, ExchangeBuf::Double(&mut v)).unwrap();
        if temp > 0.0 {
            let scale = (TARGET_TEMP / temp).sqrt();
            v.iter_mut().for_each(|c| *c *= scale);
        }
        inst.scatter("v", 3, ExchangeSlice::Double(&v)).unwrap();
    }

    let temp = inst.get_thermo("temp").unwrap_or(0.0);
    let step = inst.get_thermo("step").unwrap_or(0.0);
    println!("\nAfter rescale: T = {temp:.4} at step {step}");

    inst.close();
    println!("\n=== Done ===");
}
