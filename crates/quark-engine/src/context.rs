//! Borrowed bundles of engine state handed to compute, fix and
//! variable kernels.

use quark_core::Communicator;

use crate::domain::Domain;
use crate::group::Groups;
use crate::particles::ParticleStore;
use crate::update::Update;

/// Read-only view of the system.
#[derive(Clone, Copy)]
pub struct SystemView<'a> {
    /// Process group.
    pub comm: &'a dyn Communicator,
    /// Timestep state.
    pub update: &'a Update,
    /// Box geometry.
    pub domain: &'a Domain,
    /// Local particles.
    pub particles: &'a ParticleStore,
    /// Group names.
    pub groups: &'a Groups,
}

/// Mutable view of the system used while integrating a step.
pub struct StepContext<'a> {
    /// Process group.
    pub comm: &'a dyn Communicator,
    /// Timestep state.
    pub update: &'a Update,
    /// Box geometry.
    pub domain: &'a Domain,
    /// Local particles.
    pub particles: &'a mut ParticleStore,
    /// Group names.
    pub groups: &'a Groups,
}

impl StepContext<'_> {
    /// Reborrow as a read-only view.
    pub fn view(&self) -> SystemView<'_> {
        SystemView {
            comm: self.comm,
            update: self.update,
            domain: self.domain,
            particles: &*self.particles,
            groups: self.groups,
        }
    }
}

/// Construct a [`SystemView`] from an engine's fields, leaving the
/// compute, fix and variable registries free to borrow separately.
#[macro_export]
macro_rules! system_view {
    ($engine:expr) => {
        $crate::context::SystemView {
            comm: &*$engine.comm,
            update: &$engine.update,
            domain: &$engine.domain,
            particles: &$engine.particles,
            groups: &$engine.groups,
        }
    };
}
