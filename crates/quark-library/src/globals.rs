//! Integer settings and named references to global engine state.
//!
//! Global names resolve through a static descriptor table built once.
//! A reference is borrowed from the instance; unlike per-particle views
//! the underlying storage never moves while the instance lives, which is
//! what lets the C interface hand out stable pointers.

use std::sync::LazyLock;

use indexmap::IndexMap;
use quark_core::id::INTEGER_WIDTHS;
use quark_core::BigInt;

use crate::instance::Instance;

/// Byte width of the engine integer type `name` (`bigint`, `tagint`,
/// `imageint`), or `-1` for any other name.
pub fn get_setting(name: &str) -> i32 {
    INTEGER_WIDTHS
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(-1, |&(_, width)| width as i32)
}

// ── Descriptors ────────────────────────────────────────────────────

/// Element type of a global quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalKind {
    /// `f64`.
    Double,
    /// `i32`.
    Int,
    /// `i64`.
    BigInt,
    /// Text.
    Str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Key {
    Dt,
    BoxLo,
    BoxHi,
    BoxLoDim(usize),
    BoxHiDim(usize),
    Periodicity,
    Xy,
    Xz,
    Yz,
    Natoms,
    Nbonds,
    Nangles,
    Ndihedrals,
    Nimpropers,
    Nlocal,
    Nghost,
    Nmax,
    Ntimestep,
    Units,
    Triclinic,
    QFlag,
    Atime,
    Atimestep,
}

/// How a global name is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalDescriptor {
    key: Key,
    /// Element type.
    pub kind: GlobalKind,
    /// Number of elements.
    pub width: usize,
    /// Whether [`Instance::get_global_mut`] accepts the name.
    pub writable: bool,
}

static GLOBALS: LazyLock<IndexMap<&'static str, GlobalDescriptor>> = LazyLock::new(|| {
    use GlobalKind::{BigInt, Double, Int, Str};
    let entry = |key, kind, width, writable| GlobalDescriptor {
        key,
        kind,
        width,
        writable,
    };
    IndexMap::from([
        ("dt", entry(Key::Dt, Double, 1, true)),
        ("boxlo", entry(Key::BoxLo, Double, 3, false)),
        ("boxhi", entry(Key::BoxHi, Double, 3, false)),
        ("boxxlo", entry(Key::BoxLoDim(0), Double, 1, false)),
        ("boxxhi", entry(Key::BoxHiDim(0), Double, 1, false)),
        ("boxylo", entry(Key::BoxLoDim(1), Double, 1, false)),
        ("boxyhi", entry(Key::BoxHiDim(1), Double, 1, false)),
        ("boxzlo", entry(Key::BoxLoDim(2), Double, 1, false)),
        ("boxzhi", entry(Key::BoxHiDim(2), Double, 1, false)),
        ("periodicity", entry(Key::Periodicity, Int, 3, false)),
        ("xy", entry(Key::Xy, Double, 1, false)),
        ("xz", entry(Key::Xz, Double, 1, false)),
        ("yz", entry(Key::Yz, Double, 1, false)),
        ("natoms", entry(Key::Natoms, BigInt, 1, false)),
        ("nbonds", entry(Key::Nbonds, BigInt, 1, false)),
        ("nangles", entry(Key::Nangles, BigInt, 1, false)),
        ("ndihedrals", entry(Key::Ndihedrals, BigInt, 1, false)),
        ("nimpropers", entry(Key::Nimpropers, BigInt, 1, false)),
        ("nlocal", entry(Key::Nlocal, Int, 1, false)),
        ("nghost", entry(Key::Nghost, Int, 1, false)),
        ("nmax", entry(Key::Nmax, Int, 1, false)),
        ("ntimestep", entry(Key::Ntimestep, BigInt, 1, true)),
        ("units", entry(Key::Units, Str, 1, false)),
        ("triclinic", entry(Key::Triclinic, Int, 1, false)),
        ("q_flag", entry(Key::QFlag, Int, 1, false)),
        ("atime", entry(Key::Atime, Double, 1, true)),
        ("atimestep", entry(Key::Atimestep, BigInt, 1, true)),
    ])
});

/// Describe the global `name`, if it exists.
pub fn global_descriptor(name: &str) -> Option<GlobalDescriptor> {
    GLOBALS.get(name).copied()
}

/// Names accepted by [`Instance::get_global_ref`], in table order.
pub fn global_names() -> impl Iterator<Item = &'static str> {
    GLOBALS.keys().copied()
}

// ── References ─────────────────────────────────────────────────────

/// Borrowed reference to a global quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlobalRef<'a> {
    /// One `f64`.
    Double(&'a f64),
    /// Three `f64`, one per dimension.
    DoubleArray(&'a [f64; 3]),
    /// One `i32`.
    Int(&'a i32),
    /// Three `i32`, one per dimension.
    IntArray(&'a [i32; 3]),
    /// One `i64`.
    BigInt(&'a BigInt),
    /// Text.
    Str(&'a str),
}

impl GlobalRef<'_> {
    /// The value as an `f64` when it is a single number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(f64::from(*v)),
            Self::BigInt(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Mutable reference to a writable global quantity.
#[derive(Debug, PartialEq)]
pub enum GlobalMut<'a> {
    /// One `f64`.
    Double(&'a mut f64),
    /// One `i64`.
    BigInt(&'a mut BigInt),
}

impl Instance {
    /// Borrow the global quantity `name`, or `None` for an unknown name.
    pub fn get_global_ref(&self, name: &str) -> Option<GlobalRef<'_>> {
        let descriptor = global_descriptor(name)?;
        let e = &self.engine;
        let (domain, particles, update) = (&e.domain, &e.particles, &e.update);
        Some(match descriptor.key {
            Key::Dt => GlobalRef::Double(&update.dt),
            Key::BoxLo => GlobalRef::DoubleArray(&domain.boxlo),
            Key::BoxHi => GlobalRef::DoubleArray(&domain.boxhi),
            Key::BoxLoDim(d) => GlobalRef::Double(&domain.boxlo[d]),
            Key::BoxHiDim(d) => GlobalRef::Double(&domain.boxhi[d]),
            Key::Periodicity => GlobalRef::IntArray(&domain.periodicity),
            Key::Xy => GlobalRef::Double(&domain.xy),
            Key::Xz => GlobalRef::Double(&domain.xz),
            Key::Yz => GlobalRef::Double(&domain.yz),
            Key::Natoms => GlobalRef::BigInt(&particles.natoms),
            Key::Nbonds => GlobalRef::BigInt(&particles.nbonds),
            Key::Nangles => GlobalRef::BigInt(&particles.nangles),
            Key::Ndihedrals => GlobalRef::BigInt(&particles.ndihedrals),
            Key::Nimpropers => GlobalRef::BigInt(&particles.nimpropers),
            Key::Nlocal => GlobalRef::Int(&particles.nlocal),
            Key::Nghost => GlobalRef::Int(&particles.nghost),
            Key::Nmax => GlobalRef::Int(&particles.nmax),
            Key::Ntimestep => GlobalRef::BigInt(&update.ntimestep),
            Key::Units => GlobalRef::Str(&update.unit_style),
            Key::Triclinic => GlobalRef::Int(&domain.triclinic),
            Key::QFlag => GlobalRef::Int(&particles.q_flag),
            Key::Atime => GlobalRef::Double(&update.atime),
            Key::Atimestep => GlobalRef::BigInt(&update.atimestep),
        })
    }

    /// Mutably borrow the writable global `name` (`dt`, `ntimestep`,
    /// `atime`, `atimestep`). `None` for any other name.
    ///
    /// Writes bypass the `timestep` and `reset_timestep` commands:
    /// elapsed time is not accumulated and compute markers are kept.
    pub fn get_global_mut(&mut self, name: &str) -> Option<GlobalMut<'_>> {
        let descriptor = global_descriptor(name).filter(|d| d.writable)?;
        let update = &mut self.engine.update;
        match descriptor.key {
            Key::Dt => Some(GlobalMut::Double(&mut update.dt)),
            Key::Ntimestep => Some(GlobalMut::BigInt(&mut update.ntimestep)),
            Key::Atime => Some(GlobalMut::Double(&mut update.atime)),
            Key::Atimestep => Some(GlobalMut::BigInt(&mut update.atimestep)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quark_comm::SerialComm;

    use super::*;

    fn instance() -> Instance {
        Instance::open::<&str>(&[], Arc::new(SerialComm::new())).unwrap()
    }

    #[test]
    fn settings_are_integer_widths() {
        assert_eq!(get_setting("bigint"), 8);
        assert_eq!(get_setting("tagint"), 4);
        assert_eq!(get_setting("imageint"), 4);
        assert_eq!(get_setting("smallint"), -1);
    }

    #[test]
    fn every_name_resolves() {
        let inst = instance();
        let names: Vec<_> = global_names().collect();
        assert_eq!(names.len(), 27);
        for name in names {
            let descriptor = global_descriptor(name).unwrap();
            let reference = inst.get_global_ref(name).unwrap();
            let width = match reference {
                GlobalRef::DoubleArray(_) | GlobalRef::IntArray(_) => 3,
                _ => 1,
            };
            assert_eq!(width, descriptor.width, "{name}");
        }
        assert!(inst.get_global_ref("temperature").is_none());
    }

    #[test]
    fn references_read_live_state() {
        let mut inst = instance();
        inst.run_batch(&["units real", "region b block 0 2 0 3 0 4", "create_box 1 b"]);
        assert!(!inst.has_error());
        assert_eq!(inst.get_global_ref("units"), Some(GlobalRef::Str("real")));
        assert_eq!(inst.get_global_ref("dt").and_then(|r| r.as_f64()), Some(1.0));
        assert_eq!(inst.get_global_ref("boxyhi"), Some(GlobalRef::Double(&3.0)));
        assert_eq!(
            inst.get_global_ref("boxhi"),
            Some(GlobalRef::DoubleArray(&[2.0, 3.0, 4.0]))
        );
        assert_eq!(inst.get_global_ref("periodicity"), Some(GlobalRef::IntArray(&[1, 1, 1])));
        assert_eq!(inst.get_global_ref("natoms"), Some(GlobalRef::BigInt(&0)));
    }

    #[test]
    fn only_writable_names_are_mutable() {
        let mut inst = instance();
        match inst.get_global_mut("ntimestep") {
            Some(GlobalMut::BigInt(step)) => *step = 42,
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(inst.engine().update.ntimestep, 42);
        assert!(inst.get_global_mut("boxlo").is_none());
        assert!(inst.get_global_mut("nope").is_none());
    }
}
