//! Name → constructor tables for compute and fix styles.
//!
//! Built-in styles are registered by [`StyleRegistry::default`]; drivers
//! and tests can add their own before issuing `compute`/`fix` commands.

use indexmap::IndexMap;
use quark_core::{EngineError, EngineResult};

use crate::compute::{ComputeKe, ComputeKeAtom, ComputePropertyAtom, ComputeStyle, ComputeTemp};
use crate::context::SystemView;
use crate::fix::{FixAddForce, FixNve, FixSetForce, FixStoreState, FixStyle};

/// Arguments passed to a style constructor.
#[derive(Clone, Copy, Debug)]
pub struct StyleArgs<'a> {
    /// ID of the object being created.
    pub id: &'a str,
    /// Mask bit of its group.
    pub group_bit: i32,
    /// Style-specific arguments after the style name.
    pub args: &'a [&'a str],
}

impl StyleArgs<'_> {
    /// Fail unless no style-specific arguments were given.
    pub fn expect_no_extra(&self, command: &str) -> EngineResult<()> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(EngineError::all(format!("Illegal {command} command")))
        }
    }
}

/// Constructor for a compute style.
pub type ComputeFactory =
    Box<dyn Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn ComputeStyle>> + Send + Sync>;

/// Constructor for a fix style.
pub type FixFactory =
    Box<dyn Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn FixStyle>> + Send + Sync>;

/// Registered style constructors.
pub struct StyleRegistry {
    computes: IndexMap<String, ComputeFactory>,
    fixes: IndexMap<String, FixFactory>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self {
            computes: IndexMap::new(),
            fixes: IndexMap::new(),
        };
        registry.register_compute("ke", |a, _| Ok(Box::new(ComputeKe::new(a)?)));
        registry.register_compute("temp", |a, _| Ok(Box::new(ComputeTemp::new(a)?)));
        registry.register_compute("ke/atom", |a, _| Ok(Box::new(ComputeKeAtom::new(a)?)));
        registry.register_compute("property/atom", |a, s| {
            Ok(Box::new(ComputePropertyAtom::new(a, s)?))
        });
        registry.register_fix("nve", |a, _| Ok(Box::new(FixNve::new(a)?)));
        registry.register_fix("addforce", |a, _| Ok(Box::new(FixAddForce::new(a)?)));
        registry.register_fix("setforce", |a, _| Ok(Box::new(FixSetForce::new(a)?)));
        registry.register_fix("store/state", |a, s| Ok(Box::new(FixStoreState::new(a, s)?)));
        registry
    }
}

impl StyleRegistry {
    /// Add or replace a compute style.
    pub fn register_compute<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn ComputeStyle>>
            + Send
            + Sync
            + 'static,
    {
        self.computes.insert(name.to_string(), Box::new(factory));
    }

    /// Add or replace a fix style.
    pub fn register_fix<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&StyleArgs<'_>, &SystemView<'_>) -> EngineResult<Box<dyn FixStyle>>
            + Send
            + Sync
            + 'static,
    {
        self.fixes.insert(name.to_string(), Box::new(factory));
    }

    /// Construct a compute of `style`.
    pub fn create_compute(
        &self,
        style: &str,
        args: &StyleArgs<'_>,
        sys: &SystemView<'_>,
    ) -> EngineResult<Box<dyn ComputeStyle>> {
        let factory = self
            .computes
            .get(style)
            .ok_or_else(|| EngineError::all(format!("Unrecognized compute style '{style}'")))?;
        factory(args, sys)
    }

    /// Construct a fix of `style`.
    pub fn create_fix(
        &self,
        style: &str,
        args: &StyleArgs<'_>,
        sys: &SystemView<'_>,
    ) -> EngineResult<Box<dyn FixStyle>> {
        let factory = self
            .fixes
            .get(style)
            .ok_or_else(|| EngineError::all(format!("Unrecognized fix style '{style}'")))?;
        factory(args, sys)
    }

    /// Registered compute style names.
    pub fn compute_styles(&self) -> impl Iterator<Item = &str> {
        self.computes.keys().map(String::as_str)
    }

    /// Registered fix style names.
    pub fn fix_styles(&self) -> impl Iterator<Item = &str> {
        self.fixes.keys().map(String::as_str)
    }
}
