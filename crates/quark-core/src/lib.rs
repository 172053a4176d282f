//! Core types and traits for the Quark embedding layer.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! integer widths shared by the engine and its drivers, packed image
//! flags, the data-shape vocabulary used by derived-quantity extraction,
//! the engine error type, and the [`Communicator`] trait every
//! collective operation is written against.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod comm;
pub mod data;
pub mod error;
pub mod id;
pub mod image;

pub use comm::{Communicator, ReduceOp};
pub use data::{Array2, ArrayView, DataRef, ElementKind, Scope, Shape};
pub use error::{EngineError, EngineResult};
pub use id::{BigInt, ImageInt, TagInt, MAX_SMALL_INT};
