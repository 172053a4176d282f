//! Simulation box geometry, periodic remapping, and sub-box ownership.
//!
//! Orthogonal boxes work in box coordinates directly. Triclinic boxes
//! map positions to lamda coordinates, in which the box is the unit
//! cube `[0,1)^3`, before wrapping or ownership tests.

use quark_core::image;
use quark_core::{EngineError, EngineResult, ImageInt};

use crate::decomposition::ProcGrid;

// ── Boundary ───────────────────────────────────────────────────────

/// Boundary condition of one box face.
///
/// Discriminants match the numeric boundary codes reported to drivers:
/// shrink-wrapped styles compare greater than one.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// Wraps to the opposite face.
    Periodic = 0,
    /// Fixed, non-periodic.
    Fixed = 1,
    /// Shrink-wrapped to the particle extent.
    Shrink = 2,
    /// Shrink-wrapped with a minimum extent.
    ShrinkMin = 3,
}

impl Boundary {
    fn parse(c: char) -> Option<Self> {
        match c {
            'p' => Some(Self::Periodic),
            'f' => Some(Self::Fixed),
            's' => Some(Self::Shrink),
            'm' => Some(Self::ShrinkMin),
            _ => None,
        }
    }

    /// Whether the face is shrink-wrapped.
    pub fn is_shrink(self) -> bool {
        (self as i32) > 1
    }
}

// ── Domain ─────────────────────────────────────────────────────────

/// Global box and this rank's sub-box.
///
/// Fields are public so the library can hand out stable references to
/// them; they are never reallocated.
#[derive(Clone, Debug)]
pub struct Domain {
    /// Whether `create_box` has run.
    pub box_exist: bool,
    /// Spatial dimension. Always 3.
    pub dimension: usize,
    /// 1 for a triclinic box, 0 otherwise.
    pub triclinic: i32,
    /// 1 where a dimension is periodic.
    pub periodicity: [i32; 3],
    /// `[dim][lo/hi]` face conditions.
    pub boundary: [[Boundary; 2]; 3],
    /// 0: fully periodic, 1: some fixed faces, 2: some shrink-wrapped faces.
    pub nonperiodic: i32,
    /// Whether the box may change during a run.
    pub box_change: bool,
    /// Lower box corner.
    pub boxlo: [f64; 3],
    /// Upper box corner.
    pub boxhi: [f64; 3],
    /// Tilt factor.
    pub xy: f64,
    /// Tilt factor.
    pub xz: f64,
    /// Tilt factor.
    pub yz: f64,
    /// Box lengths.
    pub prd: [f64; 3],
    /// Half box lengths.
    pub prd_half: [f64; 3],
    /// Shape matrix `(xprd, yprd, zprd, yz, xz, xy)`.
    pub h: [f64; 6],
    /// Inverse of `h` in the same packed order.
    pub h_inv: [f64; 6],
    /// Sub-box lower corner, box coordinates (orthogonal boxes).
    pub sublo: [f64; 3],
    /// Sub-box upper corner, box coordinates (orthogonal boxes).
    pub subhi: [f64; 3],
    /// Sub-box lower corner, lamda coordinates (triclinic boxes).
    pub sublo_lamda: [f64; 3],
    /// Sub-box upper corner, lamda coordinates (triclinic boxes).
    pub subhi_lamda: [f64; 3],
    /// Whether this rank's sub-box touches the upper box face per dimension.
    pub sub_upper: [bool; 3],
}

const BOXLO_LAMDA: [f64; 3] = [0.0; 3];
const BOXHI_LAMDA: [f64; 3] = [1.0; 3];

impl Default for Domain {
    fn default() -> Self {
        let mut domain = Self {
            box_exist: false,
            dimension: 3,
            triclinic: 0,
            periodicity: [1; 3],
            boundary: [[Boundary::Periodic; 2]; 3],
            nonperiodic: 0,
            box_change: false,
            boxlo: [-0.5; 3],
            boxhi: [0.5; 3],
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
            prd: [1.0; 3],
            prd_half: [0.5; 3],
            h: [1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            h_inv: [1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            sublo: [-0.5; 3],
            subhi: [0.5; 3],
            sublo_lamda: BOXLO_LAMDA,
            subhi_lamda: BOXHI_LAMDA,
            sub_upper: [true; 3],
        };
        domain.set_global_box();
        domain
    }
}

impl Domain {
    /// Apply a `boundary` command: one word per dimension, each one
    /// letter for both faces or two letters for lo/hi.
    pub fn set_boundary(&mut self, words: &[&str]) -> EngineResult<()> {
        if self.box_exist {
            return Err(EngineError::all(
                "Boundary command after simulation box is defined",
            ));
        }
        if words.len() != 3 {
            return Err(EngineError::all("Illegal boundary command"));
        }
        let mut boundary = [[Boundary::Periodic; 2]; 3];
        for (dim, word) in words.iter().enumerate() {
            let chars: Vec<char> = word.chars().collect();
            let (lo, hi) = match chars.as_slice() {
                [c] => (*c, *c),
                [a, b] => (*a, *b),
                _ => return Err(EngineError::all("Illegal boundary command")),
            };
            let lo = Boundary::parse(lo).ok_or_else(|| EngineError::all("Illegal boundary command"))?;
            let hi = Boundary::parse(hi).ok_or_else(|| EngineError::all("Illegal boundary command"))?;
            if (lo == Boundary::Periodic) != (hi == Boundary::Periodic) {
                return Err(EngineError::all("Both sides of boundary must be periodic"));
            }
            boundary[dim] = [lo, hi];
        }

        self.boundary = boundary;
        self.nonperiodic = 0;
        for (dim, faces) in boundary.iter().enumerate() {
            self.periodicity[dim] = i32::from(faces[0] == Boundary::Periodic);
            for face in faces {
                match face {
                    Boundary::Periodic => {}
                    Boundary::Fixed => self.nonperiodic = self.nonperiodic.max(1),
                    Boundary::Shrink | Boundary::ShrinkMin => self.nonperiodic = 2,
                }
            }
        }
        Ok(())
    }

    /// Check the box bounds before first use.
    pub fn set_initial_box(&self) -> EngineResult<()> {
        for dim in 0..3 {
            let (lo, hi) = (self.boxlo[dim], self.boxhi[dim]);
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(EngineError::all("Box bounds are invalid"));
            }
        }
        if !(self.xy.is_finite() && self.xz.is_finite() && self.yz.is_finite()) {
            return Err(EngineError::all("Box tilt factors are invalid"));
        }
        Ok(())
    }

    /// Derive lengths and shape matrices from the bounds and tilts.
    pub fn set_global_box(&mut self) {
        for dim in 0..3 {
            self.prd[dim] = self.boxhi[dim] - self.boxlo[dim];
            self.prd_half[dim] = 0.5 * self.prd[dim];
            self.h[dim] = self.prd[dim];
            self.h_inv[dim] = 1.0 / self.prd[dim];
        }
        if self.triclinic != 0 {
            let h = &mut self.h;
            h[3] = self.yz;
            h[4] = self.xz;
            h[5] = self.xy;
            self.h_inv[3] = -h[3] / (h[1] * h[2]);
            self.h_inv[4] = (h[3] * h[5] - h[1] * h[4]) / (h[0] * h[1] * h[2]);
            self.h_inv[5] = -h[5] / (h[0] * h[1]);
        } else {
            self.h[3..].fill(0.0);
            self.h_inv[3..].fill(0.0);
        }
    }

    /// Derive this rank's sub-box from `grid`.
    pub fn set_local_box(&mut self, grid: &ProcGrid) {
        for dim in 0..3 {
            let (lo, hi) = grid.fraction(dim);
            self.sub_upper[dim] = grid.at_upper_face(dim);
            if self.triclinic == 0 {
                self.sublo[dim] = self.boxlo[dim] + self.prd[dim] * lo;
                self.subhi[dim] = if self.sub_upper[dim] {
                    self.boxhi[dim]
                } else {
                    self.boxlo[dim] + self.prd[dim] * hi
                };
            } else {
                self.sublo_lamda[dim] = lo;
                self.subhi_lamda[dim] = if self.sub_upper[dim] { 1.0 } else { hi };
            }
        }
    }

    /// Refresh derived flags before their values are reported.
    pub fn init(&mut self, drivers_change_box: bool) {
        self.box_change = self.nonperiodic == 2 || drivers_change_box;
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.prd[0] * self.prd[1] * self.prd[2]
    }

    /// Box coordinates to lamda coordinates.
    pub fn x2lamda(&self, x: &[f64; 3]) -> [f64; 3] {
        let h_inv = &self.h_inv;
        let d = [
            x[0] - self.boxlo[0],
            x[1] - self.boxlo[1],
            x[2] - self.boxlo[2],
        ];
        [
            h_inv[0] * d[0] + h_inv[5] * d[1] + h_inv[4] * d[2],
            h_inv[1] * d[1] + h_inv[3] * d[2],
            h_inv[2] * d[2],
        ]
    }

    /// Lamda coordinates to box coordinates.
    pub fn lamda2x(&self, lamda: &[f64; 3]) -> [f64; 3] {
        let h = &self.h;
        [
            h[0] * lamda[0] + h[5] * lamda[1] + h[4] * lamda[2] + self.boxlo[0],
            h[1] * lamda[1] + h[3] * lamda[2] + self.boxlo[1],
            h[2] * lamda[2] + self.boxlo[2],
        ]
    }

    /// Wrap `x` back into the box across periodic dimensions, counting
    /// each crossing in `image`.
    ///
    /// A dimension needing 512 or more wraps is left unchanged, so the
    /// particle stays outside the box and no rank owns it.
    pub fn remap(&self, x: &mut [f64; 3], image: &mut ImageInt) {
        let (lo, hi, period, mut coord) = if self.triclinic == 0 {
            (self.boxlo, self.boxhi, self.prd, *x)
        } else {
            (BOXLO_LAMDA, BOXHI_LAMDA, [1.0; 3], self.x2lamda(x))
        };

        for dim in 0..3 {
            if self.periodicity[dim] == 0 || !coord[dim].is_finite() {
                continue;
            }
            let wraps = ((coord[dim] - lo[dim]) / period[dim]).floor();
            // Beyond the image range the coordinate stays outside the box.
            if !wraps.is_finite() || wraps.abs() >= f64::from(image::IMGMAX) {
                continue;
            }
            let mut wraps = wraps as i32;
            coord[dim] -= f64::from(wraps) * period[dim];
            if coord[dim] >= hi[dim] {
                coord[dim] -= period[dim];
                wraps += 1;
            }
            coord[dim] = coord[dim].max(lo[dim]);
            if wraps != 0 {
                *image = image::shift(*image, dim, wraps);
            }
        }

        *x = if self.triclinic == 0 {
            coord
        } else {
            self.lamda2x(&coord)
        };
    }

    /// Undo periodic wrapping: the unwrapped position of `x` with `image`.
    pub fn unmap(&self, x: &[f64; 3], image: ImageInt) -> [f64; 3] {
        let [xb, yb, zb] = image::unpack(image).map(f64::from);
        let h = &self.h;
        if self.triclinic == 0 {
            [
                x[0] + xb * self.prd[0],
                x[1] + yb * self.prd[1],
                x[2] + zb * self.prd[2],
            ]
        } else {
            [
                x[0] + h[0] * xb + h[5] * yb + h[4] * zb,
                x[1] + h[1] * yb + h[3] * zb,
                x[2] + h[2] * zb,
            ]
        }
    }

    /// Decide whether this rank owns a particle at `x`.
    ///
    /// `x` is remapped into the box first, updating `image` when given.
    /// With `allow_outside_bound`, a coordinate beyond a shrink-wrapped
    /// face is clamped onto that face and ownership is retested; on the
    /// retest the upper face of the box belongs to the sub-box touching it.
    pub fn ownatom(
        &self,
        tag: i64,
        x: &mut [f64; 3],
        image: Option<&mut ImageInt>,
        allow_outside_bound: bool,
    ) -> bool {
        let mut scratch = image::DEFAULT_IMAGE;
        self.remap(x, image.unwrap_or(&mut scratch));

        let (coord, blo, bhi, slo, shi) = if self.triclinic == 0 {
            (*x, self.boxlo, self.boxhi, self.sublo, self.subhi)
        } else {
            (
                self.x2lamda(x),
                BOXLO_LAMDA,
                BOXHI_LAMDA,
                self.sublo_lamda,
                self.subhi_lamda,
            )
        };

        if (0..3).all(|d| coord[d] >= slo[d] && coord[d] < shi[d]) {
            tracing::trace!(tag, ?coord, "owned");
            return true;
        }
        if !allow_outside_bound {
            return false;
        }

        let mut clamped = coord;
        let mut outside = false;
        for dim in 0..3 {
            if coord[dim] < blo[dim] && self.boundary[dim][0].is_shrink() {
                clamped[dim] = blo[dim];
                outside = true;
            }
            if coord[dim] >= bhi[dim] && self.boundary[dim][1].is_shrink() {
                clamped[dim] = bhi[dim];
                outside = true;
            }
        }
        if !outside {
            return false;
        }

        let mine = (0..3).all(|d| {
            let below_hi = if self.sub_upper[d] {
                clamped[d] <= shi[d]
            } else {
                clamped[d] < shi[d]
            };
            clamped[d] >= slo[d] && below_hi
        });
        tracing::trace!(tag, ?coord, ?clamped, mine, "outside shrink-wrapped bound");
        mine
    }
}
