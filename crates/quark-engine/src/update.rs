//! Timestep counters and the active unit system.

use quark_core::{BigInt, EngineError, EngineResult};

use crate::units::UnitStyle;

/// Time-integration bookkeeping.
///
/// Fields are read by reference through the library's global lookup,
/// so they are plain values that are never reallocated.
#[derive(Clone, Debug)]
pub struct Update {
    /// Current timestep size.
    pub dt: f64,
    /// Current timestep number.
    pub ntimestep: BigInt,
    /// First step of the current (or most recent) run.
    pub firststep: BigInt,
    /// Last step of the current (or most recent) run.
    pub laststep: BigInt,
    /// Simulation time accumulated up to `atimestep`.
    pub atime: f64,
    /// Step at which `atime` was last brought up to date.
    pub atimestep: BigInt,
    /// Active unit system.
    pub units: UnitStyle,
    /// `units.name`, kept as an owned string so it can be borrowed.
    pub unit_style: String,
    /// Whether a `dt` was set explicitly (survives a `units` change).
    pub dt_default: bool,
}

impl Default for Update {
    fn default() -> Self {
        let units = UnitStyle::default();
        Self {
            dt: units.dt,
            ntimestep: 0,
            firststep: 0,
            laststep: 0,
            atime: 0.0,
            atimestep: 0,
            units,
            unit_style: units.name.to_string(),
            dt_default: true,
        }
    }
}

impl Update {
    /// Switch unit system. Resets `dt` unless it was set explicitly.
    pub fn set_units(&mut self, name: &str) -> EngineResult<()> {
        let units = UnitStyle::named(name)?;
        self.units = units;
        self.unit_style = units.name.to_string();
        if self.dt_default {
            self.dt = units.dt;
        }
        Ok(())
    }

    /// Fold elapsed steps into `atime` using the current `dt`.
    pub fn update_time(&mut self) {
        self.atime += (self.ntimestep - self.atimestep) as f64 * self.dt;
        self.atimestep = self.ntimestep;
    }

    /// Change the timestep size, accounting elapsed time first.
    pub fn set_dt(&mut self, dt: f64) -> EngineResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(EngineError::all(format!("Illegal timestep size: {dt}")));
        }
        self.update_time();
        self.dt = dt;
        self.dt_default = false;
        Ok(())
    }

    /// Jump the step counter to `step`.
    pub fn reset_timestep(&mut self, step: BigInt) -> EngineResult<()> {
        if step < 0 {
            return Err(EngineError::all("Timestep must be >= 0"));
        }
        self.update_time();
        self.ntimestep = step;
        self.atimestep = step;
        Ok(())
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.atime + (self.ntimestep - self.atimestep) as f64 * self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_dt_accumulates_time() {
        let mut u = Update::default();
        u.ntimestep = 100;
        u.set_dt(0.01).unwrap();
        assert!((u.atime - 0.5).abs() < 1e-12);
        assert_eq!(u.atimestep, 100);
        u.ntimestep = 150;
        assert!((u.time() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn explicit_dt_survives_units_change() {
        let mut u = Update::default();
        u.set_dt(0.002).unwrap();
        u.set_units("metal").unwrap();
        assert_eq!(u.dt, 0.002);
        assert_eq!(u.unit_style, "metal");
    }

    #[test]
    fn units_change_resets_default_dt() {
        let mut u = Update::default();
        u.set_units("real").unwrap();
        assert_eq!(u.dt, 1.0);
    }

    #[test]
    fn negative_reset_fails() {
        let mut u = Update::default();
        assert!(u.reset_timestep(-1).is_err());
        assert!(u.set_dt(0.0).is_err());
    }
}
