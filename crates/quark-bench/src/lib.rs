//! Benchmark profiles for the Quark embedding layer.
//!
//! - [`reference_profile`]: 1000 particles in a 10σ periodic LJ box
//! - [`stress_profile`]: 100 000 particles in a 50σ box
//! - [`init_positions`]: deterministic jittered lattice placement

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use quark_core::Communicator;
use quark_library::{CreateParticles, Instance};

/// Box, types and tag map shared by every profile; `{L}` is the edge.
const SETUP: [&str; 7] = [
    "units lj",
    "atom_modify map array",
    "region box block 0 {L} 0 {L} 0 {L}",
    "create_box 2 box",
    "mass 1 1.0",
    "mass 2 2.0",
    "timestep 0.005",
];

/// Build an instance on `comm` holding `n` particles in a cube of edge
/// `edge`, with velocities cycling through the axes. Collective.
///
/// Returns `None` if the instance could not be opened or populated.
pub fn profile(comm: Arc<dyn Communicator>, n: usize, edge: f64) -> Option<Instance> {
    let mut inst = Instance::open(&["-screen", "none", "-log", "none"], comm)?;
    let edge_text = edge.to_string();
    let script: Vec<String> = SETUP.iter().map(|l| l.replace("{L}", &edge_text)).collect();
    inst.run_batch(script.as_slice());

    let x = init_positions(n, edge, 42);
    let types: Vec<i32> = (0..n).map(|i| (i % 2) as i32 + 1).collect();
    let v: Vec<f64> = (0..3 * n).map(|k| if k % 4 == 0 { 1.0 } else { 0.0 }).collect();
    inst.create_particles(&CreateParticles {
        types: &types,
        x: &x,
        v: Some(&v),
        ..Default::default()
    })
    .ok()?;
    (!inst.has_error()).then_some(inst)
}

/// 1000 particles in a 10σ box.
pub fn reference_profile(comm: Arc<dyn Communicator>) -> Option<Instance> {
    profile(comm, 1000, 10.0)
}

/// 100 000 particles in a 50σ box.
pub fn stress_profile(comm: Arc<dyn Communicator>) -> Option<Instance> {
    profile(comm, 100_000, 50.0)
}

/// `n` positions on the smallest cubic lattice that holds them, each
/// displaced inside its cell by a hash of `seed` and the index.
pub fn init_positions(n: usize, edge: f64, seed: u64) -> Vec<f64> {
    let side = (n as f64).cbrt().ceil().max(1.0) as usize;
    let cell = edge / side as f64;
    let mut x = Vec::with_capacity(3 * n);
    for i in 0..n {
        let lattice = [i % side, (i / side) % side, i / (side * side)];
        let mut h = seed.wrapping_mul(6364136223846793005).wrapping_add(i as u64 * 1442695040888963407);
        for site in lattice {
            h = h.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let jitter = 0.25 + 0.5 * ((h >> 11) as f64 / (1u64 << 53) as f64);
            x.push((site as f64 + jitter) * cell);
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_comm::SerialComm;

    #[test]
    fn positions_stay_in_their_cells() {
        let x = init_positions(27, 3.0, 7);
        assert_eq!(x.len(), 81);
        for (i, p) in x.chunks_exact(3).enumerate() {
            let lattice = [i % 3, (i / 3) % 3, i / 9];
            for d in 0..3 {
                let offset = p[d] - lattice[d] as f64;
                assert!((0.25..0.75).contains(&offset), "particle {i}: {p:?}");
            }
        }
    }

    #[test]
    fn positions_are_deterministic() {
        assert_eq!(init_positions(50, 5.0, 1), init_positions(50, 5.0, 1));
        assert_ne!(init_positions(50, 5.0, 1), init_positions(50, 5.0, 2));
    }

    #[test]
    fn reference_profile_populates() {
        let inst = reference_profile(Arc::new(SerialComm::new())).unwrap();
        assert_eq!(inst.natoms(), 1000);
    }
}
