//! Integration test: gather, scatter and creation across threaded groups.

use proptest::collection::vec;
use proptest::prelude::*;
use quark_library::{CreateParticles, ExchangeBuf, ExchangeError, ExchangeSlice, Instance};
use quark_test_utils::{cycling_types, lattice, on_ranks, open_serial, BOX};

const LO: [f64; 3] = [0.0; 3];
const HI: [f64; 3] = [20.0, 10.0, 10.0];

/// Create `n` lattice particles with tags `1..=n`; returns the count kept
/// by this rank.
fn populate(inst: &mut Instance, n: usize) -> usize {
    let x = lattice(n, LO, HI);
    let types = cycling_types(n, 2);
    let kept = inst
        .create_particles(&CreateParticles {
            types: &types,
            x: &x,
            ..Default::default()
        })
        .expect("creation preconditions hold");
    assert!(!inst.has_error(), "{:?}", inst.last_error());
    kept
}

// ── Creation ───────────────────────────────────────────────────────

#[test]
fn creation_partitions_candidates_across_ranks() {
    let results = on_ranks(2, &BOX, |mut inst| {
        let kept = populate(&mut inst, 16);
        (kept, inst.natoms(), inst.engine().particles.len())
    });
    let total: usize = results.iter().map(|r| r.0).sum();
    assert_eq!(total, 16);
    for (kept, natoms, nlocal) in results {
        assert_eq!(natoms, 16);
        assert_eq!(kept, nlocal);
        assert!(kept > 0, "each half of the box holds lattice sites");
    }
}

#[test]
fn creation_without_box_warns_on_root_only() {
    let results = on_ranks(2, &[], |mut inst| {
        let result = inst.create_particles(&CreateParticles {
            types: &[1],
            x: &[1.0, 1.0, 1.0],
            ..Default::default()
        });
        (result, inst.has_error())
    });
    for (rank, (result, has_error)) in results.into_iter().enumerate() {
        assert_eq!(result, Err(ExchangeError::Precondition { operation: "create_atoms" }));
        assert_eq!(has_error, rank == 0, "rank {rank}");
    }
}

#[test]
fn unowned_candidate_triggers_count_warning_on_root() {
    let setup = [
        "boundary f f f",
        "atom_modify map array",
        "region box block 0 20 0 10 0 10",
        "create_box 1 box",
    ];
    let results = on_ranks(2, &setup, |mut inst| {
        let kept = inst
            .create_particles(&CreateParticles {
                types: &[1, 1],
                x: &[1.0, 1.0, 1.0, 25.0, 1.0, 1.0],
                ..Default::default()
            })
            .expect("lengths and preconditions are fine");
        let message = inst.take_error().map(|f| f.message);
        (kept, inst.natoms(), message)
    });
    assert_eq!(results[0].0 + results[1].0, 1);
    assert_eq!(results[0].1, 1);
    assert_eq!(
        results[0].2.as_deref(),
        Some("Library warning in create_atoms, invalid total atoms 1 2")
    );
    assert_eq!(results[1].2, None);
}

#[test]
fn explicit_ids_and_velocities_are_kept() {
    let mut inst = open_serial(&BOX);
    inst.create_particles(&CreateParticles {
        ids: Some(&[2, 1]),
        types: &[1, 2],
        x: &[1.0, 1.0, 1.0, 3.0, 3.0, 3.0],
        v: Some(&[0.5, 0.0, 0.0, -0.5, 0.0, 0.0]),
        ..Default::default()
    })
    .unwrap();
    let mut v = vec![0.0; 6];
    inst.gather("v", 3, ExchangeBuf::Double(&mut v)).unwrap();
    // Tag 1 is the second candidate.
    assert_eq!(v, vec![-0.5, 0.0, 0.0, 0.5, 0.0, 0.0]);
}

#[test]
fn candidate_beyond_image_range_is_dropped_with_warning() {
    let mut inst = open_serial(&BOX);
    let kept = inst
        .create_particles(&CreateParticles {
            types: &[1],
            x: &[1.0e20, 1.0, 1.0],
            ..Default::default()
        })
        .expect("lengths and preconditions are fine");
    assert_eq!(kept, 0);
    assert_eq!(inst.natoms(), 0);
    assert_eq!(
        inst.take_error().map(|f| f.message).as_deref(),
        Some("Library warning in create_atoms, invalid total atoms 0 1")
    );
}

#[test]
fn reset_box_resplits_the_group() {
    let results = on_ranks(2, &BOX, |mut inst| {
        inst.set_box([0.0; 3], [4.0, 40.0, 4.0], 0.0, 0.0, 0.0);
        assert!(!inst.has_error(), "{:?}", inst.last_error());
        let domain = &inst.engine().domain;
        let sub = (domain.sublo, domain.subhi);
        let x = lattice(27, [0.0; 3], [4.0, 40.0, 4.0]);
        let kept = inst
            .create_particles(&CreateParticles {
                types: &cycling_types(27, 2),
                x: &x,
                ..Default::default()
            })
            .expect("creation preconditions hold");
        (sub, kept, inst.natoms(), inst.has_error())
    });
    assert_eq!(results[0].0, ([0.0, 0.0, 0.0], [4.0, 20.0, 4.0]));
    assert_eq!(results[1].0, ([0.0, 20.0, 0.0], [4.0, 40.0, 4.0]));
    assert_eq!((results[0].1, results[1].1), (9, 18));
    for (_, _, natoms, has_error) in results {
        assert_eq!(natoms, 27);
        assert!(!has_error);
    }
}

// ── Gather ─────────────────────────────────────────────────────────

#[test]
fn every_rank_gathers_the_full_tag_ordered_view() {
    let results = on_ranks(2, &BOX, |mut inst| {
        populate(&mut inst, 10);
        let mut x = vec![0.0; 30];
        inst.gather("x", 3, ExchangeBuf::Double(&mut x)).unwrap();
        let mut types = vec![0; 10];
        inst.gather("type", 1, ExchangeBuf::Int(&mut types)).unwrap();
        (x, types)
    });
    let expected_x = lattice(10, LO, HI);
    let expected_types = cycling_types(10, 2);
    for (x, types) in results {
        assert_eq!(x, expected_x);
        assert_eq!(types, expected_types);
    }
}

#[test]
fn gathered_value_matches_owner() {
    let results = on_ranks(3, &BOX, |mut inst| {
        populate(&mut inst, 12);
        let mut types = vec![0; 12];
        inst.gather("type", 1, ExchangeBuf::Int(&mut types)).unwrap();
        let p = &inst.engine().particles;
        let owned: Vec<(i32, i32)> = p.tags().iter().copied().zip(p.types().iter().copied()).collect();
        (types, owned)
    });
    for (types, owned) in &results {
        for &(tag, kind) in owned {
            assert_eq!(types[tag as usize - 1], kind);
        }
    }
}

#[test]
fn unknown_property_warns_everywhere() {
    let results = on_ranks(2, &BOX, |mut inst| {
        populate(&mut inst, 4);
        let mut out = vec![0.0; 4];
        let result = inst.gather("charm", 1, ExchangeBuf::Double(&mut out));
        (result, inst.take_error().map(|f| f.message))
    });
    for (result, message) in results {
        assert!(matches!(result, Err(ExchangeError::UnknownProperty { .. })));
        assert_eq!(message.as_deref(), Some("gather_atoms: unknown property name"));
    }
}

#[test]
fn layout_mismatch_is_not_captured() {
    let mut inst = open_serial(&BOX);
    populate(&mut inst, 4);
    let mut ints = vec![0; 12];
    let result = inst.gather("x", 3, ExchangeBuf::Int(&mut ints));
    assert!(matches!(result, Err(ExchangeError::Mismatch { width: 3, .. })));
    let mut short = vec![0.0; 11];
    let result = inst.gather("x", 3, ExchangeBuf::Double(&mut short));
    assert_eq!(
        result,
        Err(ExchangeError::ShortBuffer {
            operation: "gather_atoms",
            len: 11,
            needed: 12
        })
    );
    assert!(!inst.has_error());
}

// ── Scatter ────────────────────────────────────────────────────────

#[test]
fn scatter_needs_a_tag_map() {
    let setup = ["region box block 0 20 0 10 0 10", "create_box 1 box"];
    let results = on_ranks(2, &setup, |mut inst| {
        populate(&mut inst, 4);
        let result = inst.scatter("v", 3, ExchangeSlice::Double(&[0.0; 12]));
        (result, inst.has_error())
    });
    for (rank, (result, has_error)) in results.into_iter().enumerate() {
        assert_eq!(result, Err(ExchangeError::Precondition { operation: "scatter_atoms" }));
        assert_eq!(has_error, rank == 0);
    }
}

#[test]
fn scatter_only_touches_owned_particles() {
    let results = on_ranks(2, &BOX, |mut inst| {
        populate(&mut inst, 6);
        let types: Vec<i32> = (1..=6).map(|t| t % 2 + 1).collect();
        inst.scatter("type", 1, ExchangeSlice::Int(&types)).unwrap();
        let p = &inst.engine().particles;
        p.tags().iter().zip(p.types()).all(|(&tag, &kind)| kind == tag % 2 + 1)
    });
    assert_eq!(results, vec![true, true]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn scattered_values_gather_back_unchanged(
        size in 1usize..=4,
        v in vec(-5.0f64..5.0, 24),
    ) {
        let results = on_ranks(size, &BOX, |mut inst| {
            populate(&mut inst, 8);
            inst.scatter("v", 3, ExchangeSlice::Double(&v)).unwrap();
            let mut back = vec![0.0; 24];
            inst.gather("v", 3, ExchangeBuf::Double(&mut back)).unwrap();
            back
        });
        for back in results {
            prop_assert_eq!(&back, &v);
        }
    }
}
