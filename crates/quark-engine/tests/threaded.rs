//! Collective behaviour across an in-process group.

use std::sync::Arc;

use quark_comm::ThreadedGroup;
use quark_core::{Communicator, EngineError};
use quark_engine::{Engine, EngineConfig};

fn engine(comm: Arc<dyn Communicator>, lines: &[&str]) -> Engine {
    let mut e = Engine::new(EngineConfig::default(), comm).unwrap();
    for line in lines {
        e.execute(line).unwrap();
    }
    e
}

const SETUP: [&str; 4] = [
    "atom_modify map hash",
    "region box block 0 20 0 10 0 10",
    "create_box 1 box",
    "mass 1 2.0",
];

/// One particle per rank, centred in the rank's sub-box.
fn seed(e: &mut Engine, v: [f64; 3]) {
    let rank = e.comm.rank();
    let mut x = [0.0; 3];
    for d in 0..3 {
        x[d] = 0.5 * (e.domain.sublo[d] + e.domain.subhi[d]);
    }
    let mut probe = x;
    assert!(e.domain.ownatom(rank as i64 + 1, &mut probe, None, false));
    let i = e.particles.push(1, x);
    e.particles.tags_mut()[i] = rank as i32 + 1;
    e.particles.v_mut()[i] = v;
    e.particles.natoms = e.comm.sum_i64(e.particles.len() as i64);
    e.particles.map_set();
}

#[test]
fn grid_splits_the_long_axis() {
    let dims = ThreadedGroup::run(2, |comm| {
        let e = engine(Arc::new(comm), &SETUP);
        (e.grid.dims, e.domain.sublo[0], e.domain.subhi[0])
    });
    assert_eq!(dims[0], ([2, 1, 1], 0.0, 10.0));
    assert_eq!(dims[1], ([2, 1, 1], 10.0, 20.0));
}

#[test]
fn reductions_agree_on_every_rank() {
    let results = ThreadedGroup::run(3, |comm| {
        let mut e = engine(Arc::new(comm), &SETUP);
        seed(&mut e, [1.0, 0.0, 0.0]);
        e.execute("variable n equal count(all)").unwrap();
        e.execute("variable m equal mass(all)").unwrap();
        e.execute("compute ke all ke").unwrap();
        e.execute("variable k equal c_ke").unwrap();
        (
            e.evaluate_equal("n").unwrap(),
            e.evaluate_equal("m").unwrap(),
            e.evaluate_equal("k").unwrap(),
            e.particles.tag_consecutive(&*e.comm),
        )
    });
    for r in results {
        assert_eq!(r, (3.0, 6.0, 3.0, true));
    }
}

#[test]
fn run_advances_every_rank() {
    let steps = ThreadedGroup::run(2, |comm| {
        let mut e = engine(Arc::new(comm), &SETUP);
        seed(&mut e, [0.5, 0.0, 0.0]);
        for line in ["thermo 2", "fix move all nve", "run 4"] {
            e.execute(line).unwrap();
        }
        (e.update.ntimestep, e.particles.len())
    });
    assert_eq!(steps, vec![(4, 1), (4, 1)]);
}

#[test]
fn unstable_coordinates_abort_on_each_rank() {
    let errors = ThreadedGroup::run(2, |comm| {
        let mut e = engine(Arc::new(comm), &SETUP);
        seed(&mut e, [f64::INFINITY, 0.0, 0.0]);
        e.execute("fix move all nve").unwrap();
        e.execute("run 1").unwrap_err()
    });
    for err in errors {
        match err {
            EngineError::Aborted { .. } => {}
            other => panic!("expected Aborted, got {other:?}"),
        }
    }
}
