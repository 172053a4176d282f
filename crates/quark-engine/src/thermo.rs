//! Thermodynamic keywords and periodic thermo output.

use std::sync::LazyLock;

use indexmap::IndexMap;
use quark_core::{EngineError, EngineResult, Scope, Shape};

use crate::compute::Computes;
use crate::context::SystemView;

/// ID of the temperature compute every engine creates.
pub const THERMO_TEMP: &str = "thermo_temp";

/// Keywords printed by `run` when no others are configured.
const DEFAULT_KEYWORDS: [&str; 5] = ["step", "temp", "ke", "atoms", "vol"];

#[derive(Clone, Copy, Debug)]
enum Keyword {
    Step,
    Elapsed,
    Elaplong,
    Dt,
    Time,
    Atoms,
    Temp,
    Ke,
    Vol,
    Density,
    Length(usize),
    Lo(usize),
    Hi(usize),
    Xy,
    Xz,
    Yz,
}

impl Keyword {
    fn needs_box(self) -> bool {
        matches!(
            self,
            Self::Vol | Self::Density | Self::Length(_) | Self::Lo(_) | Self::Hi(_) | Self::Xy | Self::Xz | Self::Yz
        )
    }
}

static KEYWORDS: LazyLock<IndexMap<&'static str, Keyword>> = LazyLock::new(|| {
    IndexMap::from([
        ("step", Keyword::Step),
        ("elapsed", Keyword::Elapsed),
        ("elaplong", Keyword::Elaplong),
        ("dt", Keyword::Dt),
        ("time", Keyword::Time),
        ("atoms", Keyword::Atoms),
        ("temp", Keyword::Temp),
        ("ke", Keyword::Ke),
        ("vol", Keyword::Vol),
        ("density", Keyword::Density),
        ("lx", Keyword::Length(0)),
        ("ly", Keyword::Length(1)),
        ("lz", Keyword::Length(2)),
        ("xlo", Keyword::Lo(0)),
        ("xhi", Keyword::Hi(0)),
        ("ylo", Keyword::Lo(1)),
        ("yhi", Keyword::Hi(1)),
        ("zlo", Keyword::Lo(2)),
        ("zhi", Keyword::Hi(2)),
        ("xy", Keyword::Xy),
        ("xz", Keyword::Xz),
        ("yz", Keyword::Yz),
    ])
});

/// Whether `word` names a thermo keyword.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains_key(word)
}

/// Current value of thermo keyword `word`, or `None` if `word` is not a
/// keyword. Collective: `temp`, `ke` and `density` reduce over ranks.
pub fn evaluate(word: &str, sys: &SystemView<'_>, computes: &mut Computes) -> EngineResult<Option<f64>> {
    let Some(&keyword) = KEYWORDS.get(word) else {
        return Ok(None);
    };
    let domain = sys.domain;
    if keyword.needs_box() && !domain.box_exist {
        return Err(EngineError::all(format!(
            "Thermo keyword {word} requires a simulation box"
        )));
    }
    let update = sys.update;
    let value = match keyword {
        Keyword::Step => update.ntimestep as f64,
        Keyword::Elapsed | Keyword::Elaplong => (update.ntimestep - update.firststep) as f64,
        Keyword::Dt => update.dt,
        Keyword::Time => update.time(),
        Keyword::Atoms => sys.particles.natoms as f64,
        Keyword::Temp => temperature(sys, computes)?,
        Keyword::Ke => {
            let total = sys.comm.sum_f64(crate::compute::local_mv2(sys, 1));
            let ke = 0.5 * update.units.mvv2e * total;
            if update.unit_style == "lj" && sys.particles.natoms > 0 {
                ke / sys.particles.natoms as f64
            } else {
                ke
            }
        }
        Keyword::Vol => domain.volume(),
        Keyword::Density => {
            let p = sys.particles;
            let local: f64 = (0..p.len()).map(|i| p.mass_of(i)).sum();
            sys.comm.sum_f64(local) * update.units.mv2d / domain.volume()
        }
        Keyword::Length(d) => domain.prd[d],
        Keyword::Lo(d) => domain.boxlo[d],
        Keyword::Hi(d) => domain.boxhi[d],
        Keyword::Xy => domain.xy,
        Keyword::Xz => domain.xz,
        Keyword::Yz => domain.yz,
    };
    Ok(Some(value))
}

fn temperature(sys: &SystemView<'_>, computes: &mut Computes) -> EngineResult<f64> {
    let compute = computes.get_mut(THERMO_TEMP).ok_or_else(|| {
        EngineError::all(format!("Thermo keyword temp requires compute {THERMO_TEMP}"))
    })?;
    compute.refresh(Scope::Global, Shape::Scalar, sys)?;
    Ok(compute
        .data(Scope::Global, Shape::Scalar)
        .and_then(|d| d.as_scalar())
        .unwrap_or(0.0))
}

// ── Output ─────────────────────────────────────────────────────────

/// Periodic thermo output settings.
#[derive(Clone, Debug)]
pub struct Thermo {
    /// Output interval in steps; 0 prints only the first and last step.
    pub every: i64,
    keywords: Vec<String>,
}

impl Default for Thermo {
    fn default() -> Self {
        Self {
            every: 0,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Thermo {
    /// Whether a line is due at `step` of a run spanning
    /// `first..=last`.
    pub fn due(&self, step: i64, first: i64, last: i64) -> bool {
        step == first || step == last || (self.every > 0 && step % self.every == 0)
    }

    /// Column header.
    pub fn header(&self) -> String {
        self.keywords
            .iter()
            .map(|k| {
                let mut title = k.clone();
                if let Some(first) = title.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("{title:>14}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One output line for the current state. Collective.
    pub fn line(&self, sys: &SystemView<'_>, computes: &mut Computes) -> EngineResult<String> {
        let mut columns = Vec::with_capacity(self.keywords.len());
        for k in &self.keywords {
            let v = evaluate(k, sys, computes)?.unwrap_or(0.0);
            columns.push(if matches!(k.as_str(), "step" | "elapsed" | "elaplong" | "atoms") {
                format!("{:>14}", v as i64)
            } else {
                format!("{v:>14.8}")
            });
        }
        Ok(columns.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table() {
        assert!(is_keyword("temp"));
        assert!(is_keyword("zhi"));
        assert!(!is_keyword("pe"));
    }

    #[test]
    fn due_on_first_last_and_multiples() {
        let thermo = Thermo {
            every: 10,
            ..Thermo::default()
        };
        assert!(thermo.due(3, 3, 25));
        assert!(thermo.due(10, 3, 25));
        assert!(!thermo.due(11, 3, 25));
        assert!(thermo.due(25, 3, 25));
        let quiet = Thermo::default();
        assert!(!quiet.due(10, 0, 20));
    }

    #[test]
    fn header_capitalises() {
        let header = Thermo::default().header();
        assert!(header.contains("Step"));
        assert!(header.contains("Temp"));
    }
}
