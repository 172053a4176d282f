//! Total kinetic energy of a group.

use quark_core::EngineResult;

use super::{Capabilities, ComputeStyle};
use crate::context::SystemView;
use crate::style::StyleArgs;

/// `compute ID group ke`: global scalar.
pub struct ComputeKe {
    group_bit: i32,
}

impl ComputeKe {
    /// Build from command arguments (none accepted).
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        args.expect_no_extra("compute ke")?;
        Ok(Self {
            group_bit: args.group_bit,
        })
    }
}

/// Local sum of `m v^2` over particles in `group_bit`.
pub(crate) fn local_mv2(sys: &SystemView<'_>, group_bit: i32) -> f64 {
    let p = sys.particles;
    p.v()
        .iter()
        .zip(p.masks())
        .enumerate()
        .filter(|(_, (_, &mask))| mask & group_bit != 0)
        .map(|(i, (v, _))| p.mass_of(i) * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
        .sum()
}

impl ComputeStyle for ComputeKe {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scalar: true,
            ..Capabilities::default()
        }
    }

    fn compute_scalar(&mut self, sys: &SystemView<'_>) -> EngineResult<f64> {
        let total = sys.comm.sum_f64(local_mv2(sys, self.group_bit));
        Ok(0.5 * sys.update.units.mvv2e * total)
    }
}
