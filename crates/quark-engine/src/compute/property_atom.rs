//! Named per-particle attributes as a derived quantity.

use quark_core::{Array2, EngineError, EngineResult};

use super::{Capabilities, ComputeStyle};
use crate::context::SystemView;
use crate::property::Property;
use crate::style::StyleArgs;

/// `compute ID group property/atom name...`: a per-particle vector for
/// one attribute, an array with one column per attribute otherwise.
pub struct ComputePropertyAtom {
    group_bit: i32,
    props: Vec<Property>,
}

impl ComputePropertyAtom {
    /// Build from attribute names.
    pub fn new(args: &StyleArgs<'_>, sys: &SystemView<'_>) -> EngineResult<Self> {
        if args.args.is_empty() {
            return Err(EngineError::all("Illegal compute property/atom command"));
        }
        let props = args
            .args
            .iter()
            .map(|name| {
                let prop = Property::parse(name).ok_or_else(|| {
                    EngineError::all(format!("Invalid keyword {name} for compute property/atom command"))
                })?;
                if prop.needs_charge() && sys.particles.q_flag == 0 {
                    return Err(EngineError::all(
                        "Compute property/atom for atom property that isn't allocated",
                    ));
                }
                Ok(prop)
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self {
            group_bit: args.group_bit,
            props,
        })
    }
}

impl ComputeStyle for ComputePropertyAtom {
    fn capabilities(&self) -> Capabilities {
        let cols = if self.props.len() == 1 { 0 } else { self.props.len() };
        Capabilities {
            per_particle: Some(cols),
            ..Capabilities::default()
        }
    }

    fn compute_per_particle(&mut self, sys: &SystemView<'_>, out: &mut Array2) -> EngineResult<()> {
        let p = sys.particles;
        for (i, &mask) in p.masks().iter().enumerate() {
            if mask & self.group_bit == 0 {
                continue;
            }
            let row = out.row_mut(i);
            for (slot, prop) in row.iter_mut().zip(&self.props) {
                *slot = prop.value(p, sys.domain, i);
            }
        }
        Ok(())
    }
}
