//! Embedding interface for the Quark particle engine.
//!
//! An [`Instance`] binds one engine to a process group and exposes the
//! operations a driver program needs:
//!
//! - lifecycle: [`Instance::open`], [`Instance::open_without_group`],
//!   [`Instance::close`];
//! - the command channel: [`Instance::run_one`], [`Instance::run_batch`],
//!   [`Instance::run_text`], [`Instance::run_file`];
//! - state accessors: settings, global references, box geometry,
//!   variables and thermo values;
//! - distributed exchange: [`Instance::gather`], [`Instance::scatter`],
//!   [`Instance::create_particles`];
//! - extraction of computed quantities, driver data and expressions.
//!
//! Every fallible operation captures engine failures into the instance's
//! last-error slot instead of returning them; the driver polls it with
//! [`Instance::has_error`] and [`Instance::take_error`].
//!
//! # Collectives
//!
//! Gather, scatter, particle creation, box resets and anything that
//! evaluates a derived quantity communicate across the group. Every rank
//! must make the same calls in the same order with matching arguments.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boxes;
pub mod capture;
pub mod command;
pub mod exchange;
pub mod extract;
pub mod globals;
pub mod instance;
mod state;

pub use boxes::BoxGeometry;
pub use capture::{Failure, FailureSink, Severity};
pub use command::join_lines;
pub use exchange::{CreateParticles, ExchangeBuf, ExchangeError, ExchangeSlice};
pub use extract::ExpressionValue;
pub use globals::{get_setting, global_descriptor, GlobalDescriptor, GlobalKind, GlobalMut, GlobalRef};
pub use instance::Instance;

pub use quark_core::{DataRef, ElementKind, Scope, Shape};
pub use quark_engine::{PerParticle, PerParticleMut};
