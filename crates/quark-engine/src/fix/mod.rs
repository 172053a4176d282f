//! Time-integration drivers ("fixes").
//!
//! A fix hooks into the run loop at fixed points of every step and may
//! also publish results: global values computed on demand, or
//! per-particle/local buffers it maintains itself.

mod addforce;
mod nve;
mod setforce;
mod store_state;

pub use addforce::FixAddForce;
pub use nve::FixNve;
pub use setforce::FixSetForce;
pub use store_state::FixStoreState;

use indexmap::IndexMap;
use quark_core::{Communicator, DataRef, EngineError, EngineResult, Scope, Shape};

use crate::compute::Capabilities;
use crate::context::{StepContext, SystemView};

// ── FixStyle ───────────────────────────────────────────────────────

/// A driver kernel. Every hook defaults to doing nothing.
pub trait FixStyle: Send {
    /// Results this fix publishes.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Whether the fix changes the box during a run.
    fn changes_box(&self) -> bool {
        false
    }

    /// Prepare for a run.
    fn init(&mut self, _sys: &SystemView<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Called once before the first step of a run, after forces are zeroed.
    fn setup(&mut self, _ctx: &mut StepContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// First half of the step.
    fn initial_integrate(&mut self, _ctx: &mut StepContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// After forces are computed.
    fn post_force(&mut self, _ctx: &mut StepContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Second half of the step.
    fn final_integrate(&mut self, _ctx: &mut StepContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// After the step completes.
    fn end_of_step(&mut self, _ctx: &mut StepContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Global scalar. Collective.
    fn compute_scalar(&mut self, _comm: &dyn Communicator) -> EngineResult<f64> {
        Err(EngineError::all("Fix does not compute a global scalar"))
    }

    /// Element `i` of the global vector. Collective.
    fn compute_vector(&mut self, _comm: &dyn Communicator, _i: usize) -> EngineResult<f64> {
        Err(EngineError::all("Fix does not compute a global vector"))
    }

    /// Element `(i, j)` of the global array. Collective.
    fn compute_array(&mut self, _comm: &dyn Communicator, _i: usize, _j: usize) -> EngineResult<f64> {
        Err(EngineError::all("Fix does not compute a global array"))
    }

    /// Per-particle buffer, if maintained.
    fn per_particle(&self) -> Option<DataRef<'_>> {
        None
    }

    /// Local buffer, if maintained.
    fn local(&self) -> Option<DataRef<'_>> {
        None
    }

    /// Extend per-particle storage to `nlocal` rows after particles were
    /// appended.
    fn grow(&mut self, _nlocal: usize, _sys: &SystemView<'_>) {}
}

// ── Fix ────────────────────────────────────────────────────────────

/// A registered driver.
pub struct Fix {
    id: String,
    group_bit: i32,
    style_name: String,
    style: Box<dyn FixStyle>,
}

impl Fix {
    /// Wrap a kernel.
    pub fn new(id: &str, group_bit: i32, style_name: &str, style: Box<dyn FixStyle>) -> Self {
        Self {
            id: id.to_string(),
            group_bit,
            style_name: style_name.to_string(),
            style,
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

    /// Published results.
    pub fn capabilities(&self) -> Capabilities {
        self.style.capabilities()
    }

    /// Compute one global value: the scalar, vector element `i`, or array
    /// element `(i, j)`. Indices are checked against the declared sizes.
    pub fn global_value(
        &mut self,
        shape: Shape,
        i: usize,
        j: usize,
        comm: &dyn Communicator,
    ) -> EngineResult<f64> {
        let caps = self.capabilities();
        let out_of_range = || EngineError::all(format!("Fix {} index out of range", self.id));
        match shape {
            Shape::Scalar if caps.scalar => self.style.compute_scalar(comm),
            Shape::Vector => match caps.vector {
                Some(len) if i < len => self.style.compute_vector(comm, i),
                Some(_) => Err(out_of_range()),
                None => Err(EngineError::all(format!("Fix {} does not compute a global vector", self.id))),
            },
            Shape::Array => match caps.array {
                Some((rows, cols)) if i < rows && j < cols => self.style.compute_array(comm, i, j),
                Some(_) => Err(out_of_range()),
                None => Err(EngineError::all(format!("Fix {} does not compute a global array", self.id))),
            },
            Shape::Scalar => Err(EngineError::all(format!("Fix {} does not compute a global scalar", self.id))),
        }
    }

    /// Borrow a maintained per-particle or local buffer of `shape`.
    pub fn data(&self, scope: Scope, shape: Shape) -> Option<DataRef<'_>> {
        let data = match scope {
            Scope::Global => return None,
            Scope::PerParticle => self.style.per_particle()?,
            Scope::Local => self.style.local()?,
        };
        (data.shape() == shape).then_some(data)
    }
}

// ── Fixes ──────────────────────────────────────────────────────────

/// Fix registry keyed by ID, in creation order (which is hook order).
#[derive(Default)]
pub struct Fixes {
    items: IndexMap<String, Fix>,
}

impl Fixes {
    /// Look up by ID.
    pub fn get(&self, id: &str) -> Option<&Fix> {
        self.items.get(id)
    }

    /// Look up by ID, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Fix> {
        self.items.get_mut(id)
    }

    /// Register a fix, replacing one with the same ID and style in place.
    pub fn insert(&mut self, fix: Fix) -> EngineResult<()> {
        if let Some(old) = self.items.get_mut(fix.id()) {
            if old.style_name != fix.style_name {
                return Err(EngineError::all("Replacing a fix, but new style != old style"));
            }
            *old = fix;
            return Ok(());
        }
        self.items.insert(fix.id().to_string(), fix);
        Ok(())
    }

    /// Delete a fix.
    pub fn remove(&mut self, id: &str) -> EngineResult<()> {
        self.items
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::all(format!("Could not find fix ID {id} to delete")))
    }

    /// Number of fixes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no fixes exist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any fix changes the box.
    pub fn changes_box(&self) -> bool {
        self.items.values().any(|f| f.style.changes_box())
    }

    /// Initialise every fix.
    pub fn init_all(&mut self, sys: &SystemView<'_>) -> EngineResult<()> {
        self.items.values_mut().try_for_each(|f| f.style.init(sys))
    }

    /// Run one hook on every fix in order.
    pub fn each(
        &mut self,
        ctx: &mut StepContext<'_>,
        hook: fn(&mut dyn FixStyle, &mut StepContext<'_>) -> EngineResult<()>,
    ) -> EngineResult<()> {
        self.items
            .values_mut()
            .try_for_each(|f| hook(f.style.as_mut(), ctx))
    }

    /// Grow every fix's per-particle storage to `nlocal` rows.
    pub fn grow_all(&mut self, nlocal: usize, sys: &SystemView<'_>) {
        self.items.values_mut().for_each(|f| f.style.grow(nlocal, sys));
    }
}

/// Iterate over the members of `group_bit` in `masks`.
pub(crate) fn members(masks: &[i32], group_bit: i32) -> impl Iterator<Item = usize> + '_ {
    masks
        .iter()
        .enumerate()
        .filter(move |(_, &m)| m & group_bit != 0)
        .map(|(i, _)| i)
}
