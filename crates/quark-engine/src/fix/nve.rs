//! Constant-energy velocity-Verlet integration.

use quark_core::EngineResult;

use super::{members, FixStyle};
use crate::context::StepContext;
use crate::style::StyleArgs;

/// `fix ID group nve`.
pub struct FixNve {
    group_bit: i32,
}

impl FixNve {
    /// Build from command arguments (none accepted).
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        args.expect_no_extra("fix nve")?;
        Ok(Self {
            group_bit: args.group_bit,
        })
    }

    fn half_kick(&self, ctx: &mut StepContext<'_>, drift: bool) {
        let dt = ctx.update.dt;
        let dtf = 0.5 * dt * ctx.update.units.ftm2v;
        let group: Vec<usize> = members(ctx.particles.masks(), self.group_bit).collect();
        let dtfm: Vec<f64> = group.iter().map(|&i| dtf / ctx.particles.mass_of(i)).collect();
        let (x, v, f, _, _) = ctx.particles.integrate_view();
        for (&i, &k) in group.iter().zip(&dtfm) {
            for d in 0..3 {
                v[i][d] += k * f[i][d];
                if drift {
                    x[i][d] += dt * v[i][d];
                }
            }
        }
    }
}

impl FixStyle for FixNve {
    fn initial_integrate(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.half_kick(ctx, true);
        Ok(())
    }

    fn final_integrate(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        self.half_kick(ctx, false);
        Ok(())
    }
}
