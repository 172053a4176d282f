//! Unit styles and the conversion constants the reference kernels use.

use quark_core::{EngineError, EngineResult};

/// A unit system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitStyle {
    /// Style name as given to the `units` command.
    pub name: &'static str,
    /// Boltzmann constant in energy/temperature units.
    pub boltz: f64,
    /// Converts mass*velocity^2 to energy.
    pub mvv2e: f64,
    /// Converts force/mass to velocity/time.
    pub ftm2v: f64,
    /// Converts mass/volume to density units.
    pub mv2d: f64,
    /// Default timestep.
    pub dt: f64,
}

const NA_SCALED: f64 = 0.602_214_129;

const REAL_MV2: f64 = 48.888_212_91 * 48.888_212_91;

/// Every supported unit style.
pub const UNIT_STYLES: [UnitStyle; 8] = [
    UnitStyle {
        name: "lj",
        boltz: 1.0,
        mvv2e: 1.0,
        ftm2v: 1.0,
        mv2d: 1.0,
        dt: 0.005,
    },
    UnitStyle {
        name: "real",
        boltz: 0.001_987_206_7,
        mvv2e: REAL_MV2,
        ftm2v: 1.0 / REAL_MV2,
        mv2d: 1.0 / NA_SCALED,
        dt: 1.0,
    },
    UnitStyle {
        name: "metal",
        boltz: 8.617_343e-5,
        mvv2e: 1.036_426_9e-4,
        ftm2v: 1.0 / 1.036_426_9e-4,
        mv2d: 1.0 / NA_SCALED,
        dt: 0.001,
    },
    UnitStyle {
        name: "si",
        boltz: 1.380_650_4e-23,
        mvv2e: 1.0,
        ftm2v: 1.0,
        mv2d: 1.0,
        dt: 1.0e-8,
    },
    UnitStyle {
        name: "cgs",
        boltz: 1.380_650_4e-16,
        mvv2e: 1.0,
        ftm2v: 1.0,
        mv2d: 1.0,
        dt: 1.0e-8,
    },
    UnitStyle {
        name: "electron",
        boltz: 3.166_815_34e-6,
        mvv2e: 1.066_572_36,
        ftm2v: 0.937_582_899,
        mv2d: 1.0 / NA_SCALED,
        dt: 0.001,
    },
    UnitStyle {
        name: "micro",
        boltz: 1.380_650_4e-8,
        mvv2e: 1.0,
        ftm2v: 1.0,
        mv2d: 1.0e-12,
        dt: 2.0,
    },
    UnitStyle {
        name: "nano",
        boltz: 0.013_806_504,
        mvv2e: 1.0,
        ftm2v: 1.0,
        mv2d: 1.0e-9,
        dt: 0.000_45,
    },
];

impl UnitStyle {
    /// Look up a style by name.
    pub fn named(name: &str) -> EngineResult<Self> {
        UNIT_STYLES
            .iter()
            .find(|u| u.name == name)
            .copied()
            .ok_or_else(|| EngineError::all(format!("Illegal units command: {name}")))
    }
}

impl Default for UnitStyle {
    fn default() -> Self {
        UNIT_STYLES[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lj() {
        assert_eq!(UnitStyle::default().name, "lj");
        assert_eq!(UnitStyle::default().dt, 0.005);
    }

    #[test]
    fn metal_lookup() {
        let u = UnitStyle::named("metal").unwrap();
        assert_eq!(u.dt, 0.001);
        assert!((u.mvv2e * u.ftm2v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_style_fails() {
        assert!(UnitStyle::named("furlongs").is_err());
    }
}
