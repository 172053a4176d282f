//! Constant added force.

use quark_core::{Communicator, EngineError, EngineResult, ReduceOp};

use super::{members, FixStyle};
use crate::compute::Capabilities;
use crate::context::StepContext;
use crate::region::number;
use crate::style::StyleArgs;

/// `fix ID group addforce fx fy fz`.
///
/// Publishes a global scalar (the potential energy of the added field
/// relative to the unwrapped origin) and a 3-vector (total force on the
/// group before the addition).
pub struct FixAddForce {
    group_bit: i32,
    value: [f64; 3],
    original: [f64; 4],
    original_all: [f64; 4],
    reduced: bool,
}

impl FixAddForce {
    /// Build from three force components.
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        let [fx, fy, fz] = args.args else {
            return Err(EngineError::all("Illegal fix addforce command"));
        };
        Ok(Self {
            group_bit: args.group_bit,
            value: [number(fx)?, number(fy)?, number(fz)?],
            original: [0.0; 4],
            original_all: [0.0; 4],
            reduced: false,
        })
    }

    fn reduce(&mut self, comm: &dyn Communicator) {
        if !self.reduced {
            comm.all_reduce_f64(&self.original, &mut self.original_all, ReduceOp::Sum);
            self.reduced = true;
        }
    }
}

impl FixStyle for FixAddForce {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scalar: true,
            vector: Some(3),
            ..Capabilities::default()
        }
    }

    fn setup(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.post_force(ctx)
    }

    fn post_force(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.original = [0.0; 4];
        self.reduced = false;
        let domain = ctx.domain;
        let group: Vec<usize> = members(ctx.particles.masks(), self.group_bit).collect();
        let (x, _, f, image, _) = ctx.particles.integrate_view();
        for i in group {
            let unwrap = domain.unmap(&x[i], image[i]);
            self.original[0] -= self.value[0] * unwrap[0]
                + self.value[1] * unwrap[1]
                + self.value[2] * unwrap[2];
            for d in 0..3 {
                self.original[d + 1] += f[i][d];
                f[i][d] += self.value[d];
            }
        }
        Ok(())
    }

    fn compute_scalar(&mut self, comm: &dyn Communicator) -> EngineResult<f64> {
        self.reduce(comm);
        Ok(self.original_all[0])
    }

    fn compute_vector(&mut self, comm: &dyn Communicator, i: usize) -> EngineResult<f64> {
        self.reduce(comm);
        Ok(self.original_all[i + 1])
    }
}
