//! Single-process group.

use quark_core::{Communicator, ReduceOp};

/// A group containing only the calling process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl SerialComm {
    /// Create a group of one.
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_i32(&self, send: &[i32], recv: &mut [i32], _op: ReduceOp) {
        recv.copy_from_slice(send);
    }

    fn all_reduce_i64(&self, send: &[i64], recv: &mut [i64], _op: ReduceOp) {
        recv.copy_from_slice(send);
    }

    fn all_reduce_f64(&self, send: &[f64], recv: &mut [f64], _op: ReduceOp) {
        recv.copy_from_slice(send);
    }

    fn abort(&self, code: i32) -> ! {
        tracing::error!(code, "serial group aborted");
        std::process::exit(code)
    }
}
