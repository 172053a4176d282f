//! Quark: an embeddable particle simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Quark sub-crates. A driver program that links the engine in-process
//! only needs `quark` as a dependency; C and Fortran drivers link
//! `quark-ffi` instead.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use quark::prelude::*;
//!
//! let mut inst = Instance::open(&["-screen", "none", "-log", "none"], Arc::new(SerialComm::new()))
//!     .unwrap();
//! inst.run_batch(&[
//!     "atom_modify map array",
//!     "region box block 0 4 0 4 0 4",
//!     "create_box 1 box",
//!     "mass 1 1.0",
//!     "fix move all nve",
//! ]);
//! let kept = inst
//!     .create_particles(&CreateParticles {
//!         types: &[1, 1],
//!         x: &[1.0, 1.0, 1.0, 3.0, 3.0, 3.0],
//!         v: Some(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(kept, 2);
//!
//! inst.run_one("run 10");
//! assert!(!inst.has_error());
//!
//! let mut x = vec![0.0; 6];
//! inst.gather("x", 3, ExchangeBuf::Double(&mut x)).unwrap();
//! assert!(x[0] > 1.0);
//! // Kinetic energy per particle in lj units.
//! assert_eq!(inst.get_thermo("ke"), Some(0.5));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `quark-core` | Integer widths, data descriptors, `Communicator`, `EngineError` |
//! | [`comm`] | `quark-comm` | Serial, threaded and process-wide process groups |
//! | [`engine`] | `quark-engine` | Reference engine: commands, computes, fixes, variables |
//! | [`library`] | `quark-library` | `Instance` and the embedding operations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`quark-core`).
///
/// Integer width aliases, [`types::DataRef`] views onto derived data, the
/// [`types::Communicator`] trait and [`types::EngineError`].
pub use quark_core as types;

/// Process groups (`quark-comm`).
///
/// [`comm::SerialComm`] for one rank, [`comm::ThreadedGroup`] to run a
/// group of ranks on threads, [`comm::world()`] for the process default.
pub use quark_comm as comm;

/// Reference engine (`quark-engine`).
///
/// The [`engine::Engine`] behind every instance, plus the
/// [`engine::ComputeStyle`] and [`engine::FixStyle`] extension traits.
pub use quark_engine as engine;

/// Embedding operations (`quark-library`).
///
/// [`library::Instance`] and its lifecycle, command, state, exchange and
/// extraction operations.
pub use quark_library as library;

/// Common imports for typical Quark usage.
///
/// ```rust
/// use quark::prelude::*;
/// ```
pub mod prelude {
    // Process groups
    pub use quark_comm::{world, SerialComm, ThreadedComm, ThreadedGroup};
    pub use quark_core::Communicator;

    // Data descriptors
    pub use quark_core::{DataRef, ElementKind, Scope, Shape};

    // Instance and exchange buffers
    pub use quark_library::{
        CreateParticles, ExchangeBuf, ExchangeError, ExchangeSlice, ExpressionValue, Failure,
        Instance, Severity,
    };

    // Extension points
    pub use quark_engine::{ComputeStyle, FixStyle, StyleArgs};
}
