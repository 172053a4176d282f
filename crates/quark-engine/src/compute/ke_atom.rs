//! Per-particle kinetic energy.

use quark_core::{Array2, EngineResult};

use super::{Capabilities, ComputeStyle};
use crate::context::SystemView;
use crate::style::StyleArgs;

/// `compute ID group ke/atom`: per-particle vector, zero outside the group.
pub struct ComputeKeAtom {
    group_bit: i32,
}

impl ComputeKeAtom {
    /// Build from command arguments (none accepted).
    pub fn new(args: &StyleArgs<'_>) -> EngineResult<Self> {
        args.expect_no_extra("compute ke/atom")?;
        Ok(Self {
            group_bit: args.group_bit,
        })
    }
}

impl ComputeStyle for ComputeKeAtom {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_particle: Some(0),
            ..Capabilities::default()
        }
    }

    fn compute_per_particle(&mut self, sys: &SystemView<'_>, out: &mut Array2) -> EngineResult<()> {
        let p = sys.particles;
        let half_mvv2e = 0.5 * sys.update.units.mvv2e;
        for (i, (v, &mask)) in p.v().iter().zip(p.masks()).enumerate() {
            if mask & self.group_bit != 0 {
                out.row_mut(i)[0] = half_mvv2e * p.mass_of(i) * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]);
            }
        }
        Ok(())
    }
}
