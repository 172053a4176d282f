//! Distributed data exchange: gather, scatter and particle creation.
//!
//! The engine partitions particles across the ranks of its group; local
//! indices mean nothing outside a rank. These operations reconcile that
//! partition with a single global view ordered by tag:
//!
//! - [`Instance::gather`] assembles `count` values per particle into a
//!   buffer of `count * natoms` values on every rank. Each rank writes
//!   its own particles into a zeroed scratch buffer at `count * (tag - 1)`
//!   and the scratch buffers are summed element-wise. Owners are disjoint
//!   and exhaustive, so the sum is exact.
//! - [`Instance::scatter`] is the inverse: every rank overwrites the
//!   particles it owns from the same global buffer.
//! - [`Instance::create_particles`] offers every candidate to every rank;
//!   the rank whose sub-box contains it keeps it.
//!
//! All three are collectives. Preconditions are checked identically on
//! every rank so the group takes the same path.

use quark_core::{ElementKind, ImageInt, ReduceOp, TagInt, MAX_SMALL_INT};
use quark_engine::{property_info, system_view, PerParticle, PerParticleMut, PropertyInfo};
use thiserror::Error;

use crate::instance::Instance;

const GATHER: &str = "gather_atoms";
const SCATTER: &str = "scatter_atoms";
const CREATE: &str = "create_atoms";

// ── Buffers ────────────────────────────────────────────────────────

/// Destination of a gather. The variant selects the element kind.
#[derive(Debug)]
pub enum ExchangeBuf<'a> {
    /// 32-bit integers.
    Int(&'a mut [i32]),
    /// Doubles.
    Double(&'a mut [f64]),
}

impl ExchangeBuf<'_> {
    /// Element kind.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int(_) => ElementKind::Int,
            Self::Double(_) => ElementKind::Double,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(b) => b.len(),
            Self::Double(b) => b.len(),
        }
    }

    /// Whether the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of a scatter. The variant selects the element kind.
#[derive(Clone, Copy, Debug)]
pub enum ExchangeSlice<'a> {
    /// 32-bit integers.
    Int(&'a [i32]),
    /// Doubles.
    Double(&'a [f64]),
}

impl ExchangeSlice<'_> {
    /// Element kind.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int(_) => ElementKind::Int,
            Self::Double(_) => ElementKind::Double,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(b) => b.len(),
            Self::Double(b) => b.len(),
        }
    }

    /// Whether the slice has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Candidate particles for [`Instance::create_particles`].
///
/// `types` fixes the candidate count `n`. Positions and velocities hold
/// three values per candidate, in candidate order.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateParticles<'a> {
    /// Tags. `None` numbers the candidates `1..=n`.
    pub ids: Option<&'a [TagInt]>,
    /// Particle types, each in `1..=ntypes` of the box.
    pub types: &'a [i32],
    /// Positions.
    pub x: &'a [f64],
    /// Velocities. `None` leaves them zero.
    pub v: Option<&'a [f64]>,
    /// Image flags, updated by any periodic remap. `None` starts every
    /// particle in the primary image.
    pub image: Option<&'a [ImageInt]>,
    /// Let candidates beyond a shrink-wrapped face be kept by the rank
    /// at that face.
    pub allow_outside_bound: bool,
}

impl CreateParticles<'_> {
    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn check_lengths(&self) -> Result<(), ExchangeError> {
        let n = self.len();
        let short = |len: usize, needed: usize| {
            (len < needed).then_some(ExchangeError::ShortBuffer {
                operation: CREATE,
                len,
                needed,
            })
        };
        let checks = [
            short(self.x.len(), 3 * n),
            self.v.and_then(|v| short(v.len(), 3 * n)),
            self.ids.and_then(|ids| short(ids.len(), n)),
            self.image.and_then(|img| short(img.len(), n)),
        ];
        match checks.into_iter().flatten().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Why an exchange did nothing.
///
/// [`Precondition`](Self::Precondition) and
/// [`UnknownProperty`](Self::UnknownProperty) are also recorded in the
/// instance's last-error slot (the first on rank 0 only). The remaining
/// variants are caller mistakes and leave the slot untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Tags disabled or not consecutive, too many particles, no tag map
    /// (scatter), or no box (creation).
    #[error("Library error in {operation}")]
    Precondition {
        /// Failing operation.
        operation: &'static str,
    },
    /// No per-particle property of that name.
    #[error("{operation}: unknown property name {name}")]
    UnknownProperty {
        /// Failing operation.
        operation: &'static str,
        /// Requested name.
        name: String,
    },
    /// Buffer kind or per-particle count does not match the property.
    #[error("{operation}: {name} holds {width} {kind:?} values per particle")]
    Mismatch {
        /// Failing operation.
        operation: &'static str,
        /// Property name.
        name: String,
        /// Element kind of the property.
        kind: ElementKind,
        /// Values per particle of the property.
        width: usize,
    },
    /// Candidate type outside `1..=ntypes`.
    #[error("{operation}: invalid atom type {itype}, box has {ntypes}")]
    InvalidType {
        /// Failing operation.
        operation: &'static str,
        /// Offending type.
        itype: i32,
        /// Types defined by the box.
        ntypes: usize,
    },
    /// Buffer too short for the data.
    #[error("{operation}: buffer holds {len} values, {needed} needed")]
    ShortBuffer {
        /// Failing operation.
        operation: &'static str,
        /// Values supplied.
        len: usize,
        /// Values required.
        needed: usize,
    },
}

// ── Operations ─────────────────────────────────────────────────────

impl Instance {
    /// Gather `count` values per particle of property `name` into `out`,
    /// ordered by tag. Collective.
    ///
    /// `out` must hold at least `count * natoms` values of the property's
    /// kind; `count` must equal the property's width.
    pub fn gather(&mut self, name: &str, count: usize, out: ExchangeBuf<'_>) -> Result<(), ExchangeError> {
        let natoms = self.exchange_natoms(GATHER, false)?;
        let info = self.exchange_property(GATHER, name)?;
        check_layout(GATHER, name, info, count, out.kind(), out.len(), natoms)?;

        let n = count * natoms;
        let particles = &self.engine.particles;
        let comm = &*self.engine.comm;
        let tags = particles.tags();
        match (particles.extract(name), out) {
            (Some(PerParticle::Int { data, .. }), ExchangeBuf::Int(out)) => {
                let scratch = spread(tags, data, count, n);
                comm.all_reduce_i32(&scratch, &mut out[..n], ReduceOp::Sum);
            }
            (Some(PerParticle::Double { data, .. }), ExchangeBuf::Double(out)) => {
                let scratch = spread(tags, data, count, n);
                comm.all_reduce_f64(&scratch, &mut out[..n], ReduceOp::Sum);
            }
            _ => return Err(mismatch(GATHER, name, info)),
        }
        tracing::trace!(name, count, natoms, "gathered");
        Ok(())
    }

    /// Overwrite `count` values per owned particle of property `name`
    /// from `data`, ordered by tag. Collective.
    ///
    /// Requires a tag map in addition to the gather preconditions.
    pub fn scatter(&mut self, name: &str, count: usize, data: ExchangeSlice<'_>) -> Result<(), ExchangeError> {
        let natoms = self.exchange_natoms(SCATTER, true)?;
        let info = self.exchange_property(SCATTER, name)?;
        check_layout(SCATTER, name, info, count, data.kind(), data.len(), natoms)?;

        let particles = &mut self.engine.particles;
        // (global index, local index) for every owned tag.
        let owned: Vec<(usize, usize)> = (1..=natoms)
            .filter_map(|id| particles.map_find(id as TagInt).map(|m| (id - 1, m)))
            .collect();
        match (particles.extract_mut(name), data) {
            (Some(PerParticleMut::Int { data: dst, .. }), ExchangeSlice::Int(src)) => {
                overwrite(dst, src, count, &owned);
            }
            (Some(PerParticleMut::Double { data: dst, .. }), ExchangeSlice::Double(src)) => {
                overwrite(dst, src, count, &owned);
            }
            _ => return Err(mismatch(SCATTER, name, info)),
        }
        tracing::trace!(name, count, owned = owned.len(), "scattered");
        Ok(())
    }

    /// Insert particles, each kept by the rank whose sub-box contains
    /// it. Collective. Returns the number kept by this rank.
    ///
    /// Afterwards the global count is re-summed, fix storage grows to
    /// cover the new particles and the tag map is rebuilt. If the new
    /// global count is not the old one plus `n`, some candidate was
    /// owned by no rank (or by several); rank 0 records a recoverable
    /// warning and the particles that were created stay.
    pub fn create_particles(&mut self, batch: &CreateParticles<'_>) -> Result<usize, ExchangeError> {
        batch.check_lengths()?;
        if !self.engine.domain.box_exist || !self.engine.particles.tag_enable {
            self.warn(&format!("Library error in {CREATE}"), true);
            return Err(ExchangeError::Precondition { operation: CREATE });
        }
        let ntypes = self.engine.particles.ntypes;
        if let Some(&itype) = batch.types.iter().find(|&&t| t < 1 || t as usize > ntypes) {
            return Err(ExchangeError::InvalidType {
                operation: CREATE,
                itype,
                ntypes,
            });
        }

        let engine = &mut self.engine;
        let n = batch.len();
        let natoms_prev = engine.particles.natoms;
        let nlocal_prev = engine.particles.len();

        for i in 0..n {
            let mut x = [batch.x[3 * i], batch.x[3 * i + 1], batch.x[3 * i + 2]];
            let mut image = batch.image.map(|img| img[i]);
            let tag = batch.ids.map_or(-1, |ids| i64::from(ids[i]));
            if !engine
                .domain
                .ownatom(tag, &mut x, image.as_mut(), batch.allow_outside_bound)
            {
                continue;
            }
            let particles = &mut engine.particles;
            let local = particles.push(batch.types[i], x);
            particles.tags_mut()[local] = batch.ids.map_or(i as TagInt + 1, |ids| ids[i]);
            if let Some(v) = batch.v {
                particles.v_mut()[local] = [v[3 * i], v[3 * i + 1], v[3 * i + 2]];
            }
            if let Some(image) = image {
                particles.images_mut()[local] = image;
            }
        }

        let nlocal = engine.particles.len();
        engine.particles.natoms = engine.comm.sum_i64(nlocal as i64);
        let sys = system_view!(engine);
        engine.fixes.grow_all(nlocal, &sys);
        if engine.particles.has_map() {
            engine.particles.map_init();
            engine.particles.map_set();
        }

        let natoms = engine.particles.natoms;
        let expected = natoms_prev + n as i64;
        tracing::debug!(candidates = n, kept = nlocal - nlocal_prev, natoms, "particles created");
        if natoms != expected {
            self.warn(
                &format!("Library warning in {CREATE}, invalid total atoms {natoms} {expected}"),
                true,
            );
        }
        Ok(nlocal - nlocal_prev)
    }

    // ── Preconditions ──────────────────────────────────────────────

    /// Check the exchange preconditions and return the particle count.
    fn exchange_natoms(&mut self, operation: &'static str, need_map: bool) -> Result<usize, ExchangeError> {
        let particles = &self.engine.particles;
        let ok = particles.tag_enable
            && particles.tag_consecutive(&*self.engine.comm)
            && particles.natoms <= MAX_SMALL_INT
            && (!need_map || particles.has_map());
        if ok {
            return Ok(particles.natoms as usize);
        }
        self.warn(&format!("Library error in {operation}"), true);
        Err(ExchangeError::Precondition { operation })
    }

    fn exchange_property(&mut self, operation: &'static str, name: &str) -> Result<PropertyInfo, ExchangeError> {
        let info = property_info(name).filter(|_| self.engine.particles.extract(name).is_some());
        info.ok_or_else(|| {
            self.warn(&format!("{operation}: unknown property name"), false);
            ExchangeError::UnknownProperty {
                operation,
                name: name.to_string(),
            }
        })
    }
}

fn check_layout(
    operation: &'static str,
    name: &str,
    info: PropertyInfo,
    count: usize,
    kind: ElementKind,
    len: usize,
    natoms: usize,
) -> Result<(), ExchangeError> {
    if kind != info.kind || count != info.width {
        return Err(mismatch(operation, name, info));
    }
    let needed = count * natoms;
    if len < needed {
        return Err(ExchangeError::ShortBuffer {
            operation,
            len,
            needed,
        });
    }
    Ok(())
}

fn mismatch(operation: &'static str, name: &str, info: PropertyInfo) -> ExchangeError {
    ExchangeError::Mismatch {
        operation,
        name: name.to_string(),
        kind: info.kind,
        width: info.width,
    }
}

/// Zeroed `n`-value buffer with each local particle's `count` values
/// placed at `count * (tag - 1)`.
fn spread<T: Copy + Default>(tags: &[TagInt], data: &[T], count: usize, n: usize) -> Vec<T> {
    let mut scratch = vec![T::default(); n];
    for (values, &tag) in data.chunks_exact(count).zip(tags) {
        let offset = count * (tag as usize - 1);
        scratch[offset..offset + count].copy_from_slice(values);
    }
    scratch
}

fn overwrite<T: Copy>(dst: &mut [T], src: &[T], count: usize, owned: &[(usize, usize)]) {
    for &(global, local) in owned {
        dst[count * local..count * (local + 1)]
            .copy_from_slice(&src[count * global..count * (global + 1)]);
    }
}
