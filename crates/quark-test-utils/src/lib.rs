//! Test utilities and mock styles for Quark development.
//!
//! Provides scripted instance setup on a serial or threaded group,
//! deterministic particle layouts, and mock compute/fix styles
//! ([`fixtures`]) for exercising the embedding layer.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use quark_comm::{SerialComm, ThreadedGroup};
use quark_core::Communicator;
use quark_library::Instance;
use tracing_subscriber::EnvFilter;

/// Switches that keep instances silent.
pub const QUIET: [&str; 4] = ["-screen", "none", "-log", "none"];

/// A 20 x 10 x 10 periodic box with two types and a tag map. The long
/// axis is split first, so 2 ranks get one half each.
pub const BOX: [&str; 5] = [
    "atom_modify map array",
    "region box block 0 20 0 10 0 10",
    "create_box 2 box",
    "mass 1 1.0",
    "mass 2 2.0",
];

/// Route engine tracing to the test harness, filtered by `RUST_LOG`.
/// Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Open a quiet instance on `comm` and run `setup`, panicking on any
/// recorded failure.
pub fn open(comm: Arc<dyn Communicator>, setup: &[&str]) -> Instance {
    init_tracing();
    let mut inst = Instance::open(&QUIET, comm).expect("instance opens");
    inst.run_batch(setup);
    if let Some(failure) = inst.last_error() {
        panic!("setup failed on rank {}: {failure}", inst.comm_rank());
    }
    inst
}

/// [`open`] on a single-rank group.
pub fn open_serial(setup: &[&str]) -> Instance {
    open(Arc::new(SerialComm::new()), setup)
}

/// Run `body` with one freshly set-up instance per rank of a `size`-rank
/// threaded group. Results are in rank order.
///
/// `body` must enter the same collectives on every rank; a rank that
/// panics mid-collective leaves the others blocked.
pub fn on_ranks<R, F>(size: usize, setup: &[&str], body: F) -> Vec<R>
where
    F: Fn(Instance) -> R + Sync,
    R: Send,
{
    ThreadedGroup::run(size, |comm| body(open(Arc::new(comm), setup)))
}

/// `n` positions (three values each) at the centres of a cubic lattice
/// filling `[lo, hi)`. Cells are visited x fastest.
pub fn lattice(n: usize, lo: [f64; 3], hi: [f64; 3]) -> Vec<f64> {
    let per_side = (1..).find(|k: &usize| k * k * k >= n).unwrap_or(1);
    let cell = [0, 1, 2].map(|d| (hi[d] - lo[d]) / per_side as f64);
    (0..n)
        .flat_map(|i| {
            let index = [i % per_side, (i / per_side) % per_side, i / (per_side * per_side)];
            [0, 1, 2].map(|d| lo[d] + (index[d] as f64 + 0.5) * cell[d])
        })
        .collect()
}

/// Types cycling `1..=ntypes`.
pub fn cycling_types(n: usize, ntypes: i32) -> Vec<i32> {
    (0..n as i32).map(|i| i % ntypes + 1).collect()
}
