//! The process-wide default group.
//!
//! Drivers that do not manage their own group open instances on the
//! world group. It is created lazily as a [`SerialComm`] the first time
//! it is requested, unless a driver installed a different group first.

use std::sync::{Arc, OnceLock};

use quark_core::Communicator;

use crate::serial::SerialComm;

static WORLD: OnceLock<Arc<dyn Communicator>> = OnceLock::new();

/// Whether the world group exists yet.
pub fn is_world_initialized() -> bool {
    WORLD.get().is_some()
}

/// Install `comm` as the world group.
///
/// Returns `Err(comm)` unchanged if a world group already exists.
pub fn install_world(comm: Arc<dyn Communicator>) -> Result<(), Arc<dyn Communicator>> {
    WORLD.set(comm)
}

/// The world group, creating a serial one on first use.
pub fn world() -> Arc<dyn Communicator> {
    WORLD
        .get_or_init(|| {
            tracing::debug!("initialising serial world group");
            Arc::new(SerialComm::new())
        })
        .clone()
}
