//! The `run` command: a velocity-Verlet step loop driven by fixes.
//!
//! Per step: `initial_integrate`, coordinate check and periodic remap,
//! force clear, `post_force`, `final_integrate`, `end_of_step`. There is
//! no pair force; fixes supply every force.

use std::time::Instant;

use quark_core::{BigInt, EngineError, EngineResult};

use crate::context::StepContext;
use crate::engine::Engine;
use crate::system_view;

macro_rules! step_context {
    ($engine:expr) => {
        StepContext {
            comm: &*$engine.comm,
            update: &$engine.update,
            domain: &$engine.domain,
            particles: &mut $engine.particles,
            groups: &$engine.groups,
        }
    };
}

impl Engine {
    /// Advance the system by `nsteps` timesteps.
    pub fn run(&mut self, nsteps: BigInt) -> EngineResult<()> {
        if !self.domain.box_exist {
            return Err(EngineError::all(
                "Run command before simulation box is defined",
            ));
        }
        if !self.particles.all_masses_set() {
            return Err(EngineError::all("Not all per-type masses are set"));
        }
        if self.fixes.is_empty() {
            self.console.warning("No fixes defined, atoms won't move");
        }
        self.init()?;

        self.update.firststep = self.update.ntimestep;
        self.update.laststep = self.update.ntimestep + nsteps;
        let (first, last) = (self.update.firststep, self.update.laststep);
        self.console.message(&format!(
            "Setting up Verlet run ...\n  Unit style    : {}\n  Current step  : {}\n  Time step     : {}",
            self.update.unit_style, first, self.update.dt
        ));

        let start = Instant::now();
        self.particles.f_mut().fill([0.0; 3]);
        self.fixes.each(&mut step_context!(self), |f, c| f.setup(c))?;
        let header = self.thermo.header();
        self.console.message(&header);
        self.thermo_output()?;

        for _ in 0..nsteps {
            self.update.ntimestep += 1;
            self.fixes
                .each(&mut step_context!(self), |f, c| f.initial_integrate(c))?;
            self.remap_particles()?;
            self.particles.f_mut().fill([0.0; 3]);
            self.fixes.each(&mut step_context!(self), |f, c| f.post_force(c))?;
            self.fixes
                .each(&mut step_context!(self), |f, c| f.final_integrate(c))?;
            self.fixes.each(&mut step_context!(self), |f, c| f.end_of_step(c))?;
            let step = self.update.ntimestep;
            if step != last && self.thermo.due(step, first, last) {
                self.thermo_output()?;
            }
        }
        if nsteps > 0 {
            self.thermo_output()?;
        }

        let elapsed = start.elapsed().as_secs_f64();
        self.console.message(&format!(
            "Loop time of {elapsed:.6} on {} procs for {nsteps} steps with {} atoms",
            self.comm.size(),
            self.particles.natoms
        ));
        tracing::info!(steps = nsteps, elapsed, "run complete");
        Ok(())
    }

    /// Check coordinates and wrap them across periodic boundaries.
    fn remap_particles(&mut self) -> EngineResult<()> {
        let domain = &self.domain;
        let (x, _, _, image, _) = self.particles.integrate_view();
        if x.iter().flatten().any(|c| !c.is_finite()) {
            return Err(EngineError::one("Non-numeric atom coords - simulation unstable"));
        }
        for (xi, img) in x.iter_mut().zip(image.iter_mut()) {
            domain.remap(xi, img);
        }
        Ok(())
    }

    fn thermo_output(&mut self) -> EngineResult<()> {
        let sys = system_view!(self);
        let line = self.thermo.line(&sys, &mut self.computes)?;
        self.console.message(&line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quark_comm::SerialComm;

    use crate::config::EngineConfig;
    use crate::engine::Engine;

    fn setup(lines: &[&str]) -> Engine {
        let mut e = Engine::new(EngineConfig::default(), Arc::new(SerialComm::new())).unwrap();
        for line in lines {
            e.execute(line).unwrap();
        }
        e
    }

    #[test]
    fn run_needs_a_box() {
        let mut e = setup(&[]);
        match e.execute("run 1") {
            Err(err) => assert_eq!(err.message(), "Run command before simulation box is defined"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn run_needs_masses() {
        let mut e = setup(&["region box block 0 1 0 1 0 1", "create_box 1 box"]);
        assert!(e.execute("run 1").is_err());
    }

    #[test]
    fn empty_run_advances_counters() {
        let mut e = setup(&[
            "region box block 0 1 0 1 0 1",
            "create_box 1 box",
            "mass 1 1.0",
            "run 5",
        ]);
        assert_eq!(e.update.ntimestep, 5);
        assert_eq!(e.update.firststep, 0);
        assert_eq!(e.update.laststep, 5);
        e.execute("run 0").unwrap();
        assert_eq!(e.update.ntimestep, 5);
    }
}
