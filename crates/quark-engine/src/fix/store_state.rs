//! Snapshot per-particle attributes.

use quark_core::{Array2, BigInt, DataRef, EngineError, EngineResult};

use super::FixStyle;
use crate::compute::Capabilities;
use crate::context::{StepContext, SystemView};
use crate::property::Property;
use crate::style::StyleArgs;

/// `fix ID group store/state N name...`.
///
/// Stores the named attributes when created and again every `N` steps
/// (never again for `N = 0`). Values outside the group are zero.
pub struct FixStoreState {
    group_bit: i32,
    every: BigInt,
    props: Vec<Property>,
    values: Array2,
}

impl FixStoreState {
    /// Build and take the first snapshot.
    pub fn new(args: &StyleArgs<'_>, sys: &SystemView<'_>) -> EngineResult<Self> {
        let [every, names @ ..] = args.args else {
            return Err(EngineError::all("Illegal fix store/state command"));
        };
        let every: BigInt = every
            .parse()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| EngineError::all("Illegal fix store/state command"))?;
        if names.is_empty() {
            return Err(EngineError::all("Illegal fix store/state command"));
        }
        let props = names
            .iter()
            .map(|name| {
                Property::parse(name)
                    .filter(|p| !p.needs_charge() || sys.particles.q_flag != 0)
                    .ok_or_else(|| EngineError::all(format!("Fix store/state for atom property {name} that isn't allocated or is invalid")))
            })
            .collect::<EngineResult<Vec<_>>>()?;
        let mut fix = Self {
            group_bit: args.group_bit,
            every,
            props,
            values: Array2::default(),
        };
        fix.store(sys);
        Ok(fix)
    }

    fn store(&mut self, sys: &SystemView<'_>) {
        let p = sys.particles;
        self.values.reset(p.len(), self.props.len());
        for (i, &mask) in p.masks().iter().enumerate() {
            if mask & self.group_bit == 0 {
                continue;
            }
            for (slot, prop) in self.values.row_mut(i).iter_mut().zip(&self.props) {
                *slot = prop.value(p, sys.domain, i);
            }
        }
    }
}

impl FixStyle for FixStoreState {
    fn capabilities(&self) -> Capabilities {
        let cols = if self.props.len() == 1 { 0 } else { self.props.len() };
        Capabilities {
            per_particle: Some(cols),
            ..Capabilities::default()
        }
    }

    fn end_of_step(&mut self, ctx: &mut StepContext<'_>) -> EngineResult<()> {
        if self.every > 0 && ctx.update.ntimestep % self.every == 0 {
            self.store(&ctx.view());
        }
        Ok(())
    }

    fn per_particle(&self) -> Option<DataRef<'_>> {
        let view = self.values.view();
        Some(if self.props.len() == 1 {
            DataRef::Vector(view.as_slice())
        } else {
            DataRef::Array(view)
        })
    }

    fn grow(&mut self, nlocal: usize, _sys: &SystemView<'_>) {
        self.values.resize_rows(nlocal);
    }
}
