//! Reference engine collaborators for the Quark embedding layer.
//!
//! Provides a small but complete particle engine behind the contracts the
//! library layer relies on: an [`Engine`] with a line-oriented command
//! interpreter, box geometry with a process grid, a structure-of-arrays
//! particle store with a tag map, named groups, derived-quantity objects
//! ([`compute`]), drivers ([`fix`]), and named variables with a formula
//! evaluator ([`variable`]).
//!
//! The engine has no pair forces and no particle migration. Every rank
//! of a process group drives its own `Engine` through the same command
//! sequence; collective operations reduce through the group's
//! [`Communicator`](quark_core::Communicator).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod commands;
pub mod compute;
pub mod config;
pub mod context;
pub mod decomposition;
pub mod domain;
pub mod engine;
pub mod fix;
pub mod group;
pub mod input;
pub mod output;
pub mod particles;
pub mod property;
pub mod region;
mod run;
pub mod style;
pub mod thermo;
pub mod units;
pub mod update;
pub mod variable;

pub use compute::{Capabilities, Compute, ComputeStyle, Computes};
pub use config::{ConfigError, Echo, EngineConfig};
pub use context::{StepContext, SystemView};
pub use domain::{Boundary, Domain};
pub use engine::{Engine, VERSION};
pub use fix::{Fix, FixStyle, Fixes};
pub use particles::{property_info, MapStyle, ParticleStore, PerParticle, PerParticleMut, PropertyInfo};
pub use style::{StyleArgs, StyleRegistry};
pub use variable::{Evaluator, Value, VariableStyle, Variables};
