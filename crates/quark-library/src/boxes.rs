//! Box geometry snapshots and box resets.

use crate::instance::Instance;

/// Copy of the box geometry taken by [`Instance::get_box`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxGeometry {
    /// Lower bounds.
    pub lo: [f64; 3],
    /// Upper bounds.
    pub hi: [f64; 3],
    /// `xy` tilt.
    pub xy: f64,
    /// `yz` tilt.
    pub yz: f64,
    /// `xz` tilt.
    pub xz: f64,
    /// 1 for each periodic dimension.
    pub periodicity: [i32; 3],
    /// Whether the box can change during a run.
    pub box_change: bool,
}

impl Instance {
    /// Snapshot the box geometry.
    ///
    /// Derived flags are refreshed first so `box_change` reflects the
    /// current boundary styles and fixes.
    pub fn get_box(&mut self) -> BoxGeometry {
        let engine = &mut self.engine;
        engine.domain.init(engine.fixes.changes_box());
        let d = &engine.domain;
        BoxGeometry {
            lo: d.boxlo,
            hi: d.boxhi,
            xy: d.xy,
            yz: d.yz,
            xz: d.xz,
            periodicity: d.periodicity,
            box_change: d.box_change,
        }
    }

    /// Replace the box bounds and tilts, then re-derive the process grid
    /// and this rank's sub-box. Collective.
    ///
    /// Particles are not moved; coordinates outside the new sub-box stay
    /// where they are until the driver resets them. Without a box, or
    /// with `lo >= hi` in any dimension, nothing changes and a
    /// recoverable error is recorded.
    pub fn set_box(&mut self, lo: [f64; 3], hi: [f64; 3], xy: f64, yz: f64, xz: f64) {
        if !self.engine.domain.box_exist {
            self.warn("Reset_box before simulation box is defined", false);
            return;
        }
        if (0..3).any(|d| !(lo[d].is_finite() && hi[d].is_finite() && lo[d] < hi[d])) {
            self.warn("Reset_box bounds are invalid", false);
            return;
        }

        let domain = &mut self.engine.domain;
        domain.boxlo = lo;
        domain.boxhi = hi;
        domain.xy = xy;
        domain.yz = yz;
        domain.xz = xz;
        domain.set_global_box();
        let result = self.engine.rebuild_grid();
        self.capture(result);
        tracing::debug!(?lo, ?hi, "box reset");
    }
}
