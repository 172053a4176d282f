//! Translational temperature of a group.

use quark_core::{EngineResult, ReduceOp};

use super::ke::local_mv2;
use super::{Capabilities, ComputeStyle};
use crate::context::SystemView;
use crate::style::StyleArgs;

/// `compute ID group temp`: global scalar temperature and a 6-vector of
/// kinetic energy tensor components `(xx, yy, zz, xy, xz, yz)`.
pub struct ComputeTemp {
    group_bit: i32,
}

impl ComputeTemp {
    /// Build from command arguments (none accepted).
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        args.expect_no_extra("compute temp")?;
        Ok(Self {
            group_bit: args.group_bit,
        })
    }

    /// Degrees of freedom: three per particle less the centre-of-mass
    /// motion. Collective.
    pub fn dof(&self, sys: &SystemView<'_>) -> f64 {
        let count = sys.groups.count(self.group_bit, sys.particles, sys.comm) as f64;
        let dim = sys.domain.dimension as f64;
        dim * count - dim
    }
}

impl ComputeStyle for ComputeTemp {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scalar: true,
            vector: Some(6),
            ..Capabilities::default()
        }
    }

    fn compute_scalar(&mut self, sys: &SystemView<'_>) -> EngineResult<f64> {
        let dof = self.dof(sys);
        let total = sys.comm.sum_f64(local_mv2(sys, self.group_bit));
        let units = &sys.update.units;
        let tfactor = if dof > 0.0 {
            units.mvv2e / (dof * units.boltz)
        } else {
            0.0
        };
        Ok(total * tfactor)
    }

    fn compute_vector(&mut self, sys: &SystemView<'_>, out: &mut [f64]) -> EngineResult<()> {
        let p = sys.particles;
        let mut local = [0.0; 6];
        for (i, (v, &mask)) in p.v().iter().zip(p.masks()).enumerate() {
            if mask & self.group_bit == 0 {
                continue;
            }
            let m = p.mass_of(i);
            local[0] += m * v[0] * v[0];
            local[1] += m * v[1] * v[1];
            local[2] += m * v[2] * v[2];
            local[3] += m * v[0] * v[1];
            local[4] += m * v[0] * v[2];
            local[5] += m * v[1] * v[2];
        }
        sys.comm.all_reduce_f64(&local, out, ReduceOp::Sum);
        let mvv2e = sys.update.units.mvv2e;
        out.iter_mut().for_each(|t| *t *= mvv2e);
        Ok(())
    }
}
