//! Process groups for the Quark embedding layer.
//!
//! - [`SerialComm`]: a group of one. Collectives are copies.
//! - [`ThreadedGroup`] / [`ThreadedComm`]: an in-process group with one
//!   OS thread per rank, used to exercise the distributed protocols
//!   without an external message-passing runtime.
//! - [`world()`]: the process-wide default group, created on first use.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod serial;
pub mod threaded;
pub mod world;

pub use serial::SerialComm;
pub use threaded::{ThreadedComm, ThreadedGroup};
pub use world::{install_world, is_world_initialized, world};
