//! End-to-end interpreter scenarios on a single rank.

use std::sync::Arc;

use quark_comm::SerialComm;
use quark_core::{EngineError, Scope, Shape};
use quark_engine::{Engine, EngineConfig};

fn engine(lines: &[&str]) -> Engine {
    let mut e = Engine::new(EngineConfig::default(), Arc::new(SerialComm::new())).unwrap();
    for line in lines {
        e.execute(line).unwrap();
    }
    e
}

/// Append a particle owned by this rank and refresh the global count.
fn place(e: &mut Engine, tag: i32, kind: i32, x: [f64; 3], v: [f64; 3]) {
    let i = e.particles.push(kind, x);
    e.particles.tags_mut()[i] = tag;
    e.particles.v_mut()[i] = v;
    e.particles.natoms = e.comm.sum_i64(e.particles.len() as i64);
    e.particles.map_set();
}

const BOX: [&str; 4] = [
    "atom_modify map array",
    "region box block 0 10 0 10 0 10",
    "create_box 2 box",
    "mass * 1.0",
];

#[test]
fn constant_force_integrates_exactly() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0, 5.0, 5.0], [0.0; 3]);
    for line in ["timestep 0.01", "fix push all addforce 1.0 0.0 0.0", "fix move all nve", "run 10"] {
        e.execute(line).unwrap();
    }
    let v = e.particles.v()[0];
    let x = e.particles.x()[0];
    assert!((v[0] - 0.1).abs() < 1e-12, "v = {v:?}");
    assert!((x[0] - (1.0 + 0.5 * 0.1 * 0.1)).abs() < 1e-12, "x = {x:?}");
    assert_eq!(v[1], 0.0);
}

#[test]
fn setforce_pins_components() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [5.0; 3], [0.0; 3]);
    for line in [
        "fix push all addforce 1.0 1.0 1.0",
        "fix pin all setforce NULL 0.0 NULL",
        "fix move all nve",
        "run 5",
    ] {
        e.execute(line).unwrap();
    }
    let v = e.particles.v()[0];
    assert!(v[0] > 0.0);
    assert_eq!(v[1], 0.0);
    assert!(v[2] > 0.0);
}

#[test]
fn periodic_crossing_updates_image() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [9.95, 5.0, 5.0], [1.0, 0.0, 0.0]);
    for line in ["timestep 0.1", "fix move all nve", "run 1"] {
        e.execute(line).unwrap();
    }
    let x = e.particles.x()[0];
    assert!((x[0] - 0.05).abs() < 1e-9, "x = {x:?}");
    let image = quark_core::image::unpack(e.particles.images()[0]);
    assert_eq!(image, [1, 0, 0]);
}

#[test]
fn non_finite_coordinates_abort_the_rank() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [5.0; 3], [f64::NAN, 0.0, 0.0]);
    e.execute("fix move all nve").unwrap();
    match e.execute("run 1") {
        Err(EngineError::Aborted { message }) => {
            assert_eq!(message, "Non-numeric atom coords - simulation unstable");
        }
        other => panic!("expected Aborted, got {other:?}"),
    }
}

#[test]
fn equal_variables_see_thermo_and_computes() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0; 3], [1.0, 0.0, 0.0]);
    place(&mut e, 2, 2, [2.0; 3], [-1.0, 0.0, 0.0]);
    for line in [
        "variable v equal vol",
        "variable n equal atoms*2",
        "variable k equal c_ke",
        "variable kx equal c_thermo_temp[1]",
        "variable chain equal v_k+v_n",
        "variable cnt equal count(all)",
        "compute ke all ke",
    ] {
        e.execute(line).unwrap();
    }
    assert_eq!(e.evaluate_equal("v").unwrap(), 1000.0);
    assert_eq!(e.evaluate_equal("n").unwrap(), 4.0);
    assert_eq!(e.evaluate_equal("k").unwrap(), 1.0);
    assert_eq!(e.evaluate_equal("kx").unwrap(), 2.0);
    assert_eq!(e.evaluate_equal("chain").unwrap(), 5.0);
    assert_eq!(e.evaluate_equal("cnt").unwrap(), 2.0);
}

#[test]
fn atom_variables_are_masked_by_group() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0; 3], [0.0; 3]);
    place(&mut e, 2, 2, [2.0; 3], [0.0; 3]);
    for line in ["group heavy type 2", "variable twice atom 2*x+id"] {
        e.execute(line).unwrap();
    }
    assert_eq!(e.evaluate_atom("twice", "all").unwrap(), vec![3.0, 6.0]);
    assert_eq!(e.evaluate_atom("twice", "heavy").unwrap(), vec![0.0, 6.0]);
    assert!(e.evaluate_atom("twice", "nobody").is_err());
}

#[test]
fn formula_errors_are_reported() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0; 3], [0.0; 3]);
    for line in [
        "variable zero equal 1/0",
        "variable loop equal v_loop+1",
        "variable peratom atom x",
        "variable mixed equal v_peratom",
        "variable vec equal x",
        "variable bad equal nonsense",
    ] {
        e.execute(line).unwrap();
    }
    let message = |e: &mut Engine, name: &str| e.evaluate_equal(name).unwrap_err().message().to_string();
    assert_eq!(message(&mut e, "zero"), "Divide by 0 in variable formula");
    assert_eq!(message(&mut e, "loop"), "Variable evaluation recursion too deep");
    assert_eq!(message(&mut e, "mixed"), "Atom-style variable in equal-style variable formula");
    assert_eq!(message(&mut e, "vec"), "Atom vector in equal-style variable formula");
    assert!(message(&mut e, "bad").contains("nonsense"));
}

#[test]
fn compute_results_are_cached_per_step() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0; 3], [2.0, 0.0, 0.0]);
    e.execute("compute ke all ke").unwrap();
    assert_eq!(e.evaluate_formula("c_ke"), 2.0);
    e.particles.v_mut()[0] = [0.0; 3];
    assert_eq!(e.evaluate_formula("c_ke"), 2.0);
    let compute = e.computes.get("ke").unwrap();
    assert_eq!(compute.invoked(Scope::Global, Shape::Scalar), Some(0));
    e.execute("reset_timestep 0").unwrap();
    assert_eq!(e.evaluate_formula("c_ke"), 0.0);
}

#[test]
fn store_state_snapshots_on_schedule() {
    let mut e = engine(&BOX);
    place(&mut e, 1, 1, [1.0; 3], [1.0, 0.0, 0.0]);
    for line in ["fix s all store/state 0 x", "fix move all nve", "run 3"] {
        e.execute(line).unwrap();
    }
    let fix = e.fixes.get("s").unwrap();
    let stored = fix.data(Scope::PerParticle, Shape::Vector).and_then(|d| d.as_vector()).unwrap();
    assert_eq!(stored, &[1.0]);
    assert!(fix.data(Scope::PerParticle, Shape::Array).is_none());
    assert!(fix.data(Scope::Global, Shape::Scalar).is_none());
}

#[test]
fn print_substitutes_inside_quotes() {
    let mut e = engine(&[]);
    e.execute("variable a equal 6*7").unwrap();
    e.execute("print \"answer ${a} $a\"").unwrap();
    assert!(e.execute("print \"${missing}\"").is_err());
}

trait FormulaExt {
    fn evaluate_formula(&mut self, text: &str) -> f64;
}

impl FormulaExt for Engine {
    fn evaluate_formula(&mut self, text: &str) -> f64 {
        self.evaluator().formula(text).unwrap()
    }
}
