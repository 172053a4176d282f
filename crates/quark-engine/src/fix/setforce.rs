//! Overwrite force components.

use quark_core::{Communicator, EngineError, EngineResult, ReduceOp};

use super::{members, FixStyle};
use crate::compute::Capabilities;
use crate::context::StepContext;
use crate::region::number;
use crate::style::StyleArgs;

/// `fix ID group setforce fx fy fz`, where `NULL` leaves a component
/// unchanged. Publishes the group's total force before it was set.
pub struct FixSetForce {
    group_bit: i32,
    value: [Option<f64>; 3],
    original: [f64; 3],
    original_all: [f64; 3],
    reduced: bool,
}

impl FixSetForce {
    /// Build from three components or `NULL`s.
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        let [fx, fy, fz] = args.args else {
            return Err(EngineError::all("Illegal fix setforce command"));
        };
        Ok(Self {
            group_bit: args.group_bit,
            value: [component(fx)?, component(fy)?, component(fz)?],
            original: [0.0; 3],
            original_all: [0.0; 3],
            reduced: false,
        })
    }
}

fn component(word: &str) -> EngineResult<Option<f64>> {
    match word {
        "NULL" => Ok(None),
        other => number(other).map(Some),
    }
}

impl FixStyle for FixSetForce {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            vector: Some(3),
            ..Capabilities::default()
        }
    }

    fn setup(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.post_force(ctx)
    }

    fn post_force(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.original = [0.0; 3];
        self.reduced = false;
        let group: Vec<usize> = members(ctx.particles.masks(), self.group_bit).collect();
        let f = ctx.particles.f_mut();
        for i in group {
            for d in 0..3 {
                self.original[d] += f[i][d];
                if let Some(v) = self.value[d] {
                    f[i][d] = v;
                }
            }
        }
        Ok(())
    }

    fn compute_vector(&mut self, comm: &dyn Communicator, i: usize) -> EngineResult<f64> {
        if !self.reduced {
            comm.all_reduce_f64(&self.original, &mut self.original_all, ReduceOp::Sum);
            self.reduced = true;
        }
        Ok(self.original_all[i])
    }
}
