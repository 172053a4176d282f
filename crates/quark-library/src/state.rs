//! Variable, thermo and per-particle accessors.

use quark_core::MAX_SMALL_INT;
use quark_engine::{PerParticle, PerParticleMut};

use crate::instance::Instance;

impl Instance {
    /// Replace the text of the `string` variable `name`.
    ///
    /// Returns `0` on success and `-1` if `name` does not exist or is not
    /// `string` style.
    pub fn set_string_variable(&mut self, name: &str, value: &str) -> i32 {
        match self.engine.variables.set_string(name, value) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }

    /// Evaluate thermo keyword `name` now. Collective for keywords that
    /// reduce across the group.
    ///
    /// Returns `None` for an unknown keyword, or when evaluation failed
    /// (the failure is captured).
    pub fn get_thermo(&mut self, name: &str) -> Option<f64> {
        let result = self.engine.thermo_keyword(name);
        self.capture(result).flatten()
    }

    /// Global particle count, or 0 when it exceeds the `i32` range.
    pub fn natoms(&self) -> i32 {
        let natoms = self.engine.particles.natoms;
        if natoms > MAX_SMALL_INT {
            0
        } else {
            natoms as i32
        }
    }

    /// Borrow the local values of per-particle property `name`.
    ///
    /// The view is invalidated by anything that adds particles.
    pub fn extract_particle(&self, name: &str) -> Option<PerParticle<'_>> {
        self.engine.particles.extract(name)
    }

    /// Mutably borrow the local values of per-particle property `name`.
    pub fn extract_particle_mut(&mut self, name: &str) -> Option<PerParticleMut<'_>> {
        self.engine.particles.extract_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quark_comm::SerialComm;

    use super::*;

    fn instance(lines: &[&str]) -> Instance {
        let mut inst = Instance::open(&["-screen", "none"], Arc::new(SerialComm::new())).unwrap();
        inst.run_batch(lines);
        assert!(!inst.has_error(), "{:?}", inst.last_error());
        inst
    }

    #[test]
    fn string_variables_only() {
        let mut inst = instance(&["variable s string hello", "variable e equal 1"]);
        assert_eq!(inst.set_string_variable("s", "world"), 0);
        assert_eq!(inst.engine().variables.text("s"), Some("world"));
        assert_eq!(inst.set_string_variable("e", "2"), -1);
        assert_eq!(inst.set_string_variable("missing", "2"), -1);
        assert!(!inst.has_error());
    }

    #[test]
    fn thermo_by_value() {
        let mut inst = instance(&["region b block 0 2 0 2 0 2", "create_box 1 b", "timestep 0.5"]);
        assert_eq!(inst.get_thermo("vol"), Some(8.0));
        assert_eq!(inst.get_thermo("dt"), Some(0.5));
        assert_eq!(inst.get_thermo("atoms"), Some(0.0));
        assert_eq!(inst.get_thermo("flux_capacitor"), None);
        assert!(!inst.has_error());
    }

    #[test]
    fn box_keywords_without_box_are_captured() {
        let mut inst = instance(&[]);
        assert_eq!(inst.get_thermo("vol"), None);
        assert!(inst.has_error());
    }

    #[test]
    fn natoms_saturates_to_zero() {
        let mut inst = instance(&[]);
        inst.engine_mut().particles.natoms = 12;
        assert_eq!(inst.natoms(), 12);
        inst.engine_mut().particles.natoms = MAX_SMALL_INT + 1;
        assert_eq!(inst.natoms(), 0);
    }

    #[test]
    fn charge_needs_charge_style() {
        let inst = instance(&[]);
        assert!(inst.extract_particle("q").is_none());
        assert!(inst.extract_particle("x").is_some());
        let inst = instance(&["atom_style charge"]);
        assert!(matches!(
            inst.extract_particle("q"),
            Some(PerParticle::Double { width: 1, .. })
        ));
    }
}
