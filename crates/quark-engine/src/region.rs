//! Geometric regions used by `create_box` and `group region`.

use quark_core::{EngineError, EngineResult};

/// A named geometric volume.
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    /// Axis-aligned block. Bounds may be infinite (`INF`).
    Block {
        /// Lower corner.
        lo: [f64; 3],
        /// Upper corner.
        hi: [f64; 3],
    },
    /// Parallelepiped with tilt factors.
    Prism {
        /// Lower corner.
        lo: [f64; 3],
        /// Upper corner.
        hi: [f64; 3],
        /// Tilt factors `(xy, xz, yz)`.
        tilt: [f64; 3],
    },
}

impl Region {
    /// Parse `style args...` from a `region` command.
    pub fn parse(style: &str, args: &[&str]) -> EngineResult<Self> {
        match (style, args.len()) {
            ("block", n) if n >= 6 => {
                let (lo, hi) = bounds(args)?;
                Ok(Self::Block { lo, hi })
            }
            ("prism", n) if n >= 9 => {
                let (lo, hi) = bounds(args)?;
                if lo.iter().chain(hi.iter()).any(|v| !v.is_finite()) {
                    return Err(EngineError::all("Cannot use region INF or EDGE when box does not exist"));
                }
                let tilt = [number(args[6])?, number(args[7])?, number(args[8])?];
                Ok(Self::Prism { lo, hi, tilt })
            }
            ("block" | "prism", _) => Err(EngineError::all("Illegal region command")),
            (other, _) => Err(EngineError::all(format!("Unrecognized region style '{other}'"))),
        }
    }

    /// Whether `x` lies inside (boundaries included).
    pub fn contains(&self, x: &[f64; 3]) -> bool {
        match self {
            Self::Block { lo, hi } => (0..3).all(|d| x[d] >= lo[d] && x[d] <= hi[d]),
            Self::Prism { lo, hi, tilt } => {
                let [xy, xz, yz] = *tilt;
                let h = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
                let d = [x[0] - lo[0], x[1] - lo[1], x[2] - lo[2]];
                let c = d[2] / h[2];
                let b = (d[1] - yz * c) / h[1];
                let a = (d[0] - xy * b - xz * c) / h[0];
                [a, b, c].iter().all(|v| (0.0..=1.0).contains(v))
            }
        }
    }
}

fn bounds(args: &[&str]) -> EngineResult<([f64; 3], [f64; 3])> {
    let mut lo = [0.0; 3];
    let mut hi = [0.0; 3];
    for dim in 0..3 {
        lo[dim] = bound(args[2 * dim], f64::NEG_INFINITY)?;
        hi[dim] = bound(args[2 * dim + 1], f64::INFINITY)?;
        if lo[dim] > hi[dim] {
            return Err(EngineError::all("Illegal region block/prism bounds"));
        }
    }
    Ok((lo, hi))
}

fn bound(word: &str, infinite: f64) -> EngineResult<f64> {
    match word {
        "INF" => Ok(infinite),
        "-INF" => Ok(f64::NEG_INFINITY),
        other => number(other),
    }
}

pub(crate) fn number(word: &str) -> EngineResult<f64> {
    word.parse::<f64>()
        .map_err(|_| EngineError::all(format!("Expected floating point parameter instead of '{word}'")))
}
