//! Simulation instances.
//!
//! An [`Instance`] owns one [`Engine`] bound to a process group plus the
//! last-error slot. Every rank of the group creates its own instance with
//! the same arguments.
//!
//! # Ownership model
//!
//! `Instance` is [`Send`] but not [`Sync`]. Operations take `&mut self`
//! and borrowed results (computed buffers, global references,
//! per-particle views) borrow from the instance, so they cannot outlive
//! the next call. Dropping the instance (or calling
//! [`close`](Instance::close)) releases the engine.

use std::sync::Arc;

use quark_comm::world;
use quark_core::{Communicator, EngineError, EngineResult};
use quark_engine::{ComputeStyle, Engine, FixStyle, StyleArgs, SystemView, VERSION};

use crate::capture::{Failure, FailureSink};

// Fails to compile if any field is !Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Instance>();
    }
};

/// One engine bound to a process group, with a last-error slot.
pub struct Instance {
    pub(crate) engine: Engine,
    pub(crate) failure: FailureSink,
}

impl Instance {
    // ── Lifecycle ──────────────────────────────────────────────────

    /// Create an instance on `comm` from command-line style switches.
    ///
    /// `args` does not include a program name. On failure the message is
    /// printed to stderr as `Exception: <message>` and `None` is
    /// returned, since no instance exists to hold the error.
    pub fn open<S: AsRef<str>>(args: &[S], comm: Arc<dyn Communicator>) -> Option<Self> {
        let group = Arc::clone(&comm);
        match Engine::from_args(args, comm) {
            Ok(engine) => Some(Self {
                engine,
                failure: FailureSink::default(),
            }),
            Err(error) => {
                open_failed(&error, &*group);
                None
            }
        }
    }

    /// Create an instance on the process-wide default group, creating
    /// that group first if needed.
    pub fn open_without_group<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        Self::open(args, world())
    }

    /// Release the instance and everything it owns.
    pub fn close(self) {
        tracing::debug!(rank = self.comm_rank(), "instance closed");
    }

    /// Numeric engine version, `YYYYMMDD`.
    pub fn version(&self) -> i32 {
        VERSION
    }

    /// This process's rank in the bound group.
    pub fn comm_rank(&self) -> usize {
        self.engine.comm.rank()
    }

    /// Number of processes in the bound group.
    pub fn comm_size(&self) -> usize {
        self.engine.comm.size()
    }

    /// The engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The engine, mutably. Failures of calls made directly on the
    /// engine are not captured.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    // ── Last error ─────────────────────────────────────────────────

    /// Whether a captured failure is waiting to be read.
    pub fn has_error(&self) -> bool {
        self.failure.has_pending()
    }

    /// The pending failure, left in place.
    pub fn last_error(&self) -> Option<&Failure> {
        self.failure.peek()
    }

    /// Remove and return the pending failure.
    pub fn take_error(&mut self) -> Option<Failure> {
        self.failure.take()
    }

    // ── Styles ─────────────────────────────────────────────────────

    /// Make a compute style available to later `compute` commands.
    pub fn register_compute_style<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn ComputeStyle>>
            + Send
            + Sync
            + 'static,
    {
        self.engine.styles.register_compute(name, factory);
    }

    /// Make a fix style available to later `fix` commands.
    pub fn register_fix_style<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn FixStyle>>
            + Send
            + Sync
            + 'static,
    {
        self.engine.styles.register_fix(name, factory);
    }

    // ── Capture ────────────────────────────────────────────────────

    /// Unwrap `result`, capturing a failure into the last-error slot.
    pub(crate) fn capture<T>(&mut self, result: EngineResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.fail(&error);
                None
            }
        }
    }

    #[cfg(feature = "exceptions")]
    fn fail(&mut self, error: &EngineError) {
        tracing::error!(rank = self.comm_rank(), "{}", error.message());
        self.failure.report(error, self.comm_size());
    }

    #[cfg(not(feature = "exceptions"))]
    fn fail(&mut self, error: &EngineError) {
        eprintln!("ERROR: {}", error.message());
        self.engine.comm.abort(1)
    }

    /// Report a recoverable condition found by the boundary itself.
    ///
    /// With `root_only`, only rank 0 records it; the others stay clean.
    pub(crate) fn warn(&mut self, message: &str, root_only: bool) {
        if root_only && !self.engine.is_root() {
            return;
        }
        self.engine.console.warning(message);
        self.failure.report_recoverable(message);
    }
}

#[cfg(feature = "exceptions")]
fn open_failed(error: &EngineError, _comm: &dyn Communicator) {
    eprintln!("Exception: {}", error.message());
}

#[cfg(not(feature = "exceptions"))]
fn open_failed(error: &EngineError, comm: &dyn Communicator) {
    eprintln!("ERROR: {}", error.message());
    comm.abort(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_comm::SerialComm;

    fn serial() -> Arc<dyn Communicator> {
        Arc::new(SerialComm::new())
    }

    #[test]
    fn open_reports_group_shape() {
        let inst = Instance::open::<&str>(&[], serial()).unwrap();
        assert_eq!(inst.comm_rank(), 0);
        assert_eq!(inst.comm_size(), 1);
        assert_eq!(inst.version(), VERSION);
        assert!(!inst.has_error());
        inst.close();
    }

    #[test]
    fn bad_switch_fails_open() {
        assert!(Instance::open(&["-bogus"], serial()).is_none());
        assert!(Instance::open(&["-echo", "loud"], serial()).is_none());
    }

    #[test]
    fn var_switch_defines_index_variable() {
        let inst = Instance::open(&["-var", "n", "4", "-screen", "none"], serial()).unwrap();
        assert_eq!(inst.engine().variables.text("n"), Some("4"));
    }

    #[test]
    fn capture_records_and_returns_none() {
        let mut inst = Instance::open::<&str>(&[], serial()).unwrap();
        let out: Option<()> = inst.capture(Err(EngineError::one("lonely")));
        assert!(out.is_none());
        let failure = inst.take_error().unwrap();
        assert_eq!(failure.severity, crate::Severity::Recoverable);
        assert_eq!(failure.message, "lonely");
        assert!(!inst.has_error());
    }
}
