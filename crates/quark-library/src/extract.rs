//! Extraction of derived quantities.
//!
//! Two ownership contracts:
//!
//! - borrowed: [`Instance::extract_computed`] and
//!   [`Instance::extract_driver_data`] return a [`DataRef`] into the
//!   object's own buffer, valid until the next call on the instance;
//! - owned: [`Instance::extract_driver_value`] and
//!   [`Instance::extract_expression`] return values the caller keeps.
//!
//! An unknown ID or an unsupported scope/shape yields `None` without
//! touching the last-error slot. A failure while computing is captured.

use std::sync::Arc;

use quark_core::{DataRef, Scope, Shape};
use quark_engine::{system_view, VariableStyle};

use crate::instance::Instance;

/// Caller-owned result of evaluating a named expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExpressionValue {
    /// Value of an `equal`-style variable.
    Global(f64),
    /// One value per local particle of an `atom`-style variable, zero
    /// for particles outside the group.
    PerParticle(Vec<f64>),
}

impl ExpressionValue {
    /// The global value, if this is one.
    pub fn as_global(&self) -> Option<f64> {
        match self {
            Self::Global(v) => Some(*v),
            Self::PerParticle(_) => None,
        }
    }

    /// The per-particle values, if these are.
    pub fn as_per_particle(&self) -> Option<&[f64]> {
        match self {
            Self::Global(_) => None,
            Self::PerParticle(v) => Some(v),
        }
    }
}

impl Instance {
    /// Borrow the `scope`/`shape` results of compute `id`, computing
    /// them first unless they are current for this timestep.
    pub fn extract_computed(&mut self, id: &str, scope: Scope, shape: Shape) -> Option<DataRef<'_>> {
        let engine = &mut self.engine;
        let compute = engine.computes.get_mut(id)?;
        if !compute.supports(scope, shape) {
            return None;
        }
        let sys = system_view!(engine);
        let refreshed = compute.refresh(scope, shape, &sys);
        self.capture(refreshed)?;
        self.engine.computes.get(id)?.data(scope, shape)
    }

    /// Compute one global value of fix `id`: its scalar, element `i` of
    /// its vector, or element `(i, j)` of its array. Always recomputed.
    pub fn extract_driver_value(&mut self, id: &str, shape: Shape, i: usize, j: usize) -> Option<f64> {
        let comm = Arc::clone(&self.engine.comm);
        let fix = self.engine.fixes.get_mut(id)?;
        if !fix.capabilities().supports(Scope::Global, shape) {
            return None;
        }
        let value = fix.global_value(shape, i, j, &*comm);
        self.capture(value)
    }

    /// Borrow the per-particle or local data fix `id` maintains.
    /// Nothing is recomputed.
    pub fn extract_driver_data(&self, id: &str, scope: Scope, shape: Shape) -> Option<DataRef<'_>> {
        if scope == Scope::Global {
            return None;
        }
        self.engine.fixes.get(id)?.data(scope, shape)
    }

    /// Evaluate variable `name`.
    ///
    /// `equal`-style variables give [`ExpressionValue::Global`];
    /// `atom`-style variables need `group` and give
    /// [`ExpressionValue::PerParticle`]. Other styles, unknown names and
    /// unknown groups give `None`. Collective when the formula reduces.
    pub fn extract_expression(&mut self, name: &str, group: Option<&str>) -> Option<ExpressionValue> {
        match self.engine.variables.style(name)? {
            VariableStyle::Equal => {
                let value = self.engine.evaluate_equal(name);
                self.capture(value).map(ExpressionValue::Global)
            }
            VariableStyle::Atom => {
                let group = group.filter(|g| self.engine.groups.find(g).is_some())?;
                let values = self.engine.evaluate_atom(name, group);
                self.capture(values).map(ExpressionValue::PerParticle)
            }
            VariableStyle::Index | VariableStyle::String | VariableStyle::Internal => None,
        }
    }
}
