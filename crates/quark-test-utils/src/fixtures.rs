//! Mock compute and fix styles.
//!
//! - [`CountingCompute`]: global scalar that counts kernel invocations.
//! - [`FailingCompute`]: global scalar whose kernel fails on one rank or all.
//! - [`TagEchoFix`]: per-particle vector holding each particle's tag,
//!   kept in step with particle creation through `grow`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quark_core::{DataRef, EngineError, EngineResult};
use quark_engine::{Capabilities, ComputeStyle, FixStyle, StyleArgs, SystemView};
use quark_library::Instance;

/// `compute ID group counting VALUE`: returns `VALUE` and bumps a
/// shared counter each time the kernel actually runs.
pub struct CountingCompute {
    value: f64,
    calls: Arc<AtomicUsize>,
}

impl CountingCompute {
    pub fn new(value: f64, calls: Arc<AtomicUsize>) -> Self {
        Self { value, calls }
    }
}

impl ComputeStyle for CountingCompute {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scalar: true,
            ..Capabilities::default()
        }
    }

    fn compute_scalar(&mut self, _sys: &SystemView<'_>) -> EngineResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value)
    }
}

/// `compute ID group failing [RANK]`: the scalar kernel fails on rank
/// `RANK` only (a single-rank failure), or on every rank when no rank
/// is given. Ranks that do not fail return 0.
pub struct FailingCompute {
    rank: Option<usize>,
}

impl FailingCompute {
    pub fn new(rank: Option<usize>) -> Self {
        Self { rank }
    }
}

impl ComputeStyle for FailingCompute {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            scalar: true,
            ..Capabilities::default()
        }
    }

    fn compute_scalar(&mut self, sys: &SystemView<'_>) -> EngineResult<f64> {
        match self.rank {
            None => Err(EngineError::all("Failing compute failed")),
            Some(rank) if rank == sys.comm.rank() => {
                Err(EngineError::one(format!("Failing compute failed on rank {rank}")))
            }
            Some(_) => Ok(0.0),
        }
    }
}

/// `fix ID group tag/echo`: per-particle vector of tags as `f64`.
#[derive(Default)]
pub struct TagEchoFix {
    tags: Vec<f64>,
}

impl TagEchoFix {
    pub fn new(sys: &SystemView<'_>) -> Self {
        let mut fix = Self::default();
        fix.grow(sys.particles.len(), sys);
        fix
    }
}

impl FixStyle for TagEchoFix {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            per_particle: Some(0),
            ..Capabilities::default()
        }
    }

    fn per_particle(&self) -> Option<DataRef<'_>> {
        Some(DataRef::Vector(&self.tags))
    }

    fn grow(&mut self, nlocal: usize, sys: &SystemView<'_>) {
        self.tags = sys.particles.tags()[..nlocal].iter().map(|&t| f64::from(t)).collect();
    }
}

/// Register `counting`, `failing` and `tag/echo` on `inst`. Every
/// `counting` compute shares `calls`.
pub fn register_mocks(inst: &mut Instance, calls: &Arc<AtomicUsize>) {
    let calls = Arc::clone(calls);
    inst.register_compute_style("counting", move |a, _| {
        let value = match a.args {
            [v] => v.parse().map_err(|_| EngineError::all("Illegal compute counting command"))?,
            _ => return Err(EngineError::all("Illegal compute counting command")),
        };
        Ok(Box::new(CountingCompute::new(value, Arc::clone(&calls))))
    });
    inst.register_compute_style("failing", |a, _| {
        let rank = match a.args {
            [] => None,
            [r] => Some(r.parse().map_err(|_| EngineError::all("Illegal compute failing command"))?),
            _ => return Err(EngineError::all("Illegal compute failing command")),
        };
        Ok(Box::new(FailingCompute::new(rank)))
    });
    inst.register_fix_style("tag/echo", |a: &StyleArgs<'_>, sys| {
        a.expect_no_extra("fix tag/echo")?;
        Ok(Box::new(TagEchoFix::new(sys)))
    });
}
