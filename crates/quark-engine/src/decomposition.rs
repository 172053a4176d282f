//! Factorisation of a process group into a 3-D grid of sub-domains.

use quark_core::{EngineError, EngineResult};

/// Process-grid layout and this rank's position in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcGrid {
    /// Processes along x, y, z.
    pub dims: [usize; 3],
    /// This rank's grid coordinate. x varies fastest with rank.
    pub coord: [usize; 3],
}

impl Default for ProcGrid {
    fn default() -> Self {
        Self {
            dims: [1, 1, 1],
            coord: [0, 0, 0],
        }
    }
}

impl ProcGrid {
    /// Choose `px*py*pz == nprocs` minimising sub-domain surface area for
    /// box lengths `prd`, honouring any fixed entries in `user`.
    pub fn new(
        nprocs: usize,
        rank: usize,
        prd: [f64; 3],
        user: [Option<usize>; 3],
    ) -> EngineResult<Self> {
        if let [Some(px), Some(py), Some(pz)] = user {
            if px * py * pz != nprocs {
                return Err(EngineError::all("Specified processors != physical processors"));
            }
        }

        let mut best: Option<([usize; 3], f64)> = None;
        for px in divisors(nprocs) {
            if user[0].is_some_and(|u| u != px) {
                continue;
            }
            for py in divisors(nprocs / px) {
                if user[1].is_some_and(|u| u != py) {
                    continue;
                }
                let pz = nprocs / px / py;
                if user[2].is_some_and(|u| u != pz) {
                    continue;
                }
                let (fx, fy, fz) = (px as f64, py as f64, pz as f64);
                let surf = prd[0] * prd[1] / (fx * fy)
                    + prd[0] * prd[2] / (fx * fz)
                    + prd[1] * prd[2] / (fy * fz);
                if best.is_none_or(|(_, s)| surf < s) {
                    best = Some(([px, py, pz], surf));
                }
            }
        }

        let dims = best
            .map(|(d, _)| d)
            .ok_or_else(|| EngineError::all("Could not create 3d grid of processors"))?;
        let coord = [
            rank % dims[0],
            (rank / dims[0]) % dims[1],
            rank / (dims[0] * dims[1]),
        ];
        tracing::debug!(?dims, ?coord, "process grid");
        Ok(Self { dims, coord })
    }

    /// Fractional extent `[lo, hi)` of this rank's slab along `dim`.
    pub fn fraction(&self, dim: usize) -> (f64, f64) {
        let n = self.dims[dim] as f64;
        let c = self.coord[dim] as f64;
        (c / n, (c + 1.0) / n)
    }

    /// Whether this rank's slab touches the upper box face along `dim`.
    pub fn at_upper_face(&self, dim: usize) -> bool {
        self.coord[dim] + 1 == self.dims[dim]
    }
}

fn divisors(n: usize) -> impl Iterator<Item = usize> {
    (1..=n).filter(move |d| n % d == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_process_is_one_by_one_by_one() {
        let g = ProcGrid::new(1, 0, [10.0; 3], [None; 3]).unwrap();
        assert_eq!(g.dims, [1, 1, 1]);
        assert_eq!(g.fraction(0), (0.0, 1.0));
    }

    #[test]
    fn long_box_splits_along_long_axis() {
        let g = ProcGrid::new(4, 0, [100.0, 10.0, 10.0], [None; 3]).unwrap();
        assert_eq!(g.dims, [4, 1, 1]);
    }

    #[test]
    fn cube_of_eight_splits_evenly() {
        let g = ProcGrid::new(8, 7, [10.0; 3], [None; 3]).unwrap();
        assert_eq!(g.dims, [2, 2, 2]);
        assert_eq!(g.coord, [1, 1, 1]);
        assert!(g.at_upper_face(2));
    }

    #[test]
    fn user_constraint_is_honoured() {
        let g = ProcGrid::new(4, 3, [100.0, 10.0, 10.0], [Some(1), None, None]).unwrap();
        assert_eq!(g.dims[0], 1);
        assert_eq!(g.dims[1] * g.dims[2], 4);
    }

    #[test]
    fn impossible_constraint_fails() {
        assert!(ProcGrid::new(4, 0, [1.0; 3], [Some(3), None, None]).is_err());
        assert!(ProcGrid::new(4, 0, [1.0; 3], [Some(1), Some(1), Some(1)]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn grid_tiles_the_group(
                nprocs in 1usize..=64,
                lx in 1.0f64..100.0,
                ly in 1.0f64..100.0,
                lz in 1.0f64..100.0,
            ) {
                let mut seen = vec![false; nprocs];
                for rank in 0..nprocs {
                    let g = ProcGrid::new(nprocs, rank, [lx, ly, lz], [None; 3]).unwrap();
                    prop_assert_eq!(g.dims[0] * g.dims[1] * g.dims[2], nprocs);
                    let flat = g.coord[0] + g.dims[0] * (g.coord[1] + g.dims[1] * g.coord[2]);
                    prop_assert_eq!(flat, rank);
                    seen[flat] = true;
                }
                prop_assert!(seen.iter().all(|&s| s));
            }

            #[test]
            fn slabs_partition_the_unit_interval(nprocs in 1usize..=27, rank_seed in 0usize..1000) {
                let rank = rank_seed % nprocs;
                let g = ProcGrid::new(nprocs, rank, [10.0; 3], [None; 3]).unwrap();
                for dim in 0..3 {
                    let (lo, hi) = g.fraction(dim);
                    prop_assert!(lo < hi);
                    prop_assert!((0.0..1.0).contains(&lo));
                    prop_assert_eq!(g.at_upper_face(dim), hi == 1.0);
                }
            }
        }
    }
}
