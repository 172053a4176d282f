//! Derived-quantity objects ("computes").
//!
//! A [`Compute`] wraps one [`ComputeStyle`] kernel together with its
//! result buffers and one "last computed at timestep" marker per
//! supported (scope, shape). Results are recomputed lazily: [`Compute::refresh`]
//! reruns the kernel only if the marker differs from the current step.

mod ke;
mod ke_atom;
mod property_atom;
mod temp;

pub use ke::ComputeKe;
pub use ke_atom::ComputeKeAtom;
pub use property_atom::ComputePropertyAtom;
pub use temp::ComputeTemp;

pub(crate) use ke::local_mv2;

use indexmap::IndexMap;
use quark_core::{Array2, BigInt, DataRef, EngineError, EngineResult, Scope, Shape};

use crate::context::SystemView;

// ── Capabilities ───────────────────────────────────────────────────

/// Which (scope, shape) results an object produces, and their sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Produces a global scalar.
    pub scalar: bool,
    /// Length of the global vector, if produced.
    pub vector: Option<usize>,
    /// `(rows, cols)` of the global array, if produced.
    pub array: Option<(usize, usize)>,
    /// Per-particle result: `Some(0)` for a vector, `Some(n)` for an
    /// `n`-column array.
    pub per_particle: Option<usize>,
    /// Local result: `Some(0)` for a vector, `Some(n)` for an `n`-column
    /// array.
    pub local: Option<usize>,
}

impl Capabilities {
    /// Whether results of `scope` and `shape` are produced.
    pub fn supports(&self, scope: Scope, shape: Shape) -> bool {
        match scope {
            Scope::Global => match shape {
                Shape::Scalar => self.scalar,
                Shape::Vector => self.vector.is_some(),
                Shape::Array => self.array.is_some(),
            },
            Scope::PerParticle => columns_support(self.per_particle, shape),
            Scope::Local => columns_support(self.local, shape),
        }
    }
}

fn columns_support(cols: Option<usize>, shape: Shape) -> bool {
    match (cols, shape) {
        (Some(0), Shape::Vector) => true,
        (Some(n), Shape::Array) => n > 0,
        _ => false,
    }
}

// ── ComputeStyle ───────────────────────────────────────────────────

/// A derived-quantity kernel.
///
/// Each `compute_*` method is called only for results the style
/// declares in [`capabilities`](Self::capabilities). Kernels that reduce
/// over the group are collective and must be entered by every rank.
pub trait ComputeStyle: Send {
    /// Results this style produces.
    fn capabilities(&self) -> Capabilities;

    /// Prepare for use. Called at creation and before every run.
    fn init(&mut self, _sys: &SystemView<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Global scalar.
    fn compute_scalar(&mut self, _sys: &SystemView<'_>) -> EngineResult<f64> {
        Err(unsupported("global scalar"))
    }

    /// Global vector, written into `out` (already sized).
    fn compute_vector(&mut self, _sys: &SystemView<'_>, _out: &mut [f64]) -> EngineResult<()> {
        Err(unsupported("global vector"))
    }

    /// Global array, written into `out` (already sized).
    fn compute_array(&mut self, _sys: &SystemView<'_>, _out: &mut Array2) -> EngineResult<()> {
        Err(unsupported("global array"))
    }

    /// Per-particle values, one row per local particle. `out` is zeroed
    /// and sized `nlocal x max(cols, 1)`.
    fn compute_per_particle(&mut self, _sys: &SystemView<'_>, _out: &mut Array2) -> EngineResult<()> {
        Err(unsupported("per-particle"))
    }

    /// Local values. The style sizes `out` itself.
    fn compute_local(&mut self, _sys: &SystemView<'_>, _out: &mut Array2) -> EngineResult<()> {
        Err(unsupported("local"))
    }
}

fn unsupported(what: &str) -> EngineError {
    EngineError::all(format!("Compute does not calculate a {what} result"))
}

// ── Compute ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
struct Invoked {
    scalar: Option<BigInt>,
    vector: Option<BigInt>,
    array: Option<BigInt>,
    per_particle: Option<BigInt>,
    local: Option<BigInt>,
}

impl Invoked {
    fn slot(&mut self, scope: Scope, shape: Shape) -> &mut Option<BigInt> {
        match (scope, shape) {
            (Scope::Global, Shape::Scalar) => &mut self.scalar,
            (Scope::Global, Shape::Vector) => &mut self.vector,
            (Scope::Global, Shape::Array) => &mut self.array,
            (Scope::PerParticle, _) => &mut self.per_particle,
            (Scope::Local, _) => &mut self.local,
        }
    }
}

/// A registered derived-quantity object.
pub struct Compute {
    id: String,
    group_bit: i32,
    style_name: String,
    style: Box<dyn ComputeStyle>,
    caps: Capabilities,
    invoked: Invoked,
    scalar: f64,
    vector: Vec<f64>,
    array: Array2,
    per_particle: Array2,
    local: Array2,
}

impl Compute {
    /// Wrap a kernel.
    pub fn new(id: &str, group_bit: i32, style_name: &str, style: Box<dyn ComputeStyle>) -> Self {
        let caps = style.capabilities();
        Self {
            id: id.to_string(),
            group_bit,
            style_name: style_name.to_string(),
            style,
            caps,
            invoked: Invoked::default(),
            scalar: 0.0,
            vector: vec![0.0; caps.vector.unwrap_or(0)],
            array: caps
                .array
                .map(|(r, c)| Array2::zeros(r, c))
                .unwrap_or_default(),
            per_particle: Array2::default(),
            local: Array2::default(),
        }
    }

    /// Identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Group mask bit.
    pub fn group_bit(&self) -> i32 {
        self.group_bit
    }

    /// Style name.
    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    /// Declared capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Whether `scope`/`shape` results are produced.
    pub fn supports(&self, scope: Scope, shape: Shape) -> bool {
        self.caps.supports(scope, shape)
    }

    /// Step at which `scope`/`shape` results were last computed.
    pub fn invoked(&self, scope: Scope, shape: Shape) -> Option<BigInt> {
        let mut copy = self.invoked;
        *copy.slot(scope, shape)
    }

    /// Forget every marker so the next access recomputes.
    pub fn reset_invoked(&mut self) {
        self.invoked = Invoked::default();
    }

    /// Prepare the kernel.
    pub fn init(&mut self, sys: &SystemView<'_>) -> EngineResult<()> {
        self.style.init(sys)
    }

    /// Rerun the kernel for `scope`/`shape` unconditionally and stamp the
    /// marker with the current step.
    pub fn recompute(&mut self, scope: Scope, shape: Shape, sys: &SystemView<'_>) -> EngineResult<()> {
        if !self.supports(scope, shape) {
            return Err(EngineError::all(format!(
                "Compute {} does not calculate a {scope} {shape:?}",
                self.id
            )));
        }
        match (scope, shape) {
            (Scope::Global, Shape::Scalar) => self.scalar = self.style.compute_scalar(sys)?,
            (Scope::Global, Shape::Vector) => self.style.compute_vector(sys, &mut self.vector)?,
            (Scope::Global, Shape::Array) => self.style.compute_array(sys, &mut self.array)?,
            (Scope::PerParticle, _) => {
                let cols = self.caps.per_particle.unwrap_or(0).max(1);
                self.per_particle.reset(sys.particles.len(), cols);
                self.style.compute_per_particle(sys, &mut self.per_particle)?;
            }
            (Scope::Local, _) => self.style.compute_local(sys, &mut self.local)?,
        }
        *self.invoked.slot(scope, shape) = Some(sys.update.ntimestep);
        Ok(())
    }

    /// Recompute `scope`/`shape` results unless they are current.
    pub fn refresh(&mut self, scope: Scope, shape: Shape, sys: &SystemView<'_>) -> EngineResult<()> {
        if self.invoked(scope, shape) != Some(sys.update.ntimestep) {
            self.recompute(scope, shape, sys)?;
        }
        Ok(())
    }

    /// Borrow the stored `scope`/`shape` result without recomputing.
    pub fn data(&self, scope: Scope, shape: Shape) -> Option<DataRef<'_>> {
        if !self.supports(scope, shape) {
            return None;
        }
        let buffer = match scope {
            Scope::Global => {
                return Some(match shape {
                    Shape::Scalar => DataRef::Scalar(&self.scalar),
                    Shape::Vector => DataRef::Vector(&self.vector),
                    Shape::Array => DataRef::Array(self.array.view()),
                })
            }
            Scope::PerParticle => &self.per_particle,
            Scope::Local => &self.local,
        };
        Some(match shape {
            Shape::Vector => DataRef::Vector(buffer.view().as_slice()),
            _ => DataRef::Array(buffer.view()),
        })
    }
}

// ── Computes ───────────────────────────────────────────────────────

/// Compute registry keyed by ID, in creation order.
#[derive(Default)]
pub struct Computes {
    items: IndexMap<String, Compute>,
}

impl Computes {
    /// Look up by ID.
    pub fn get(&self, id: &str) -> Option<&Compute> {
        self.items.get(id)
    }

    /// Look up by ID, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Compute> {
        self.items.get_mut(id)
    }

    /// Register a compute. IDs must be unique.
    pub fn insert(&mut self, compute: Compute) -> EngineResult<()> {
        if self.items.contains_key(compute.id()) {
            return Err(EngineError::all(format!("Reuse of compute ID '{}'", compute.id())));
        }
        self.items.insert(compute.id().to_string(), compute);
        Ok(())
    }

    /// Delete a compute.
    pub fn remove(&mut self, id: &str) -> EngineResult<()> {
        self.items
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::all(format!("Could not find compute ID {id} to delete")))
    }

    /// Number of computes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no computes exist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Initialise every compute.
    pub fn init_all(&mut self, sys: &SystemView<'_>) -> EngineResult<()> {
        self.items.values_mut().try_for_each(|c| c.init(sys))
    }

    /// Clear every compute's markers.
    pub fn reset_invoked_all(&mut self) {
        self.items.values_mut().for_each(Compute::reset_invoked);
    }
}
