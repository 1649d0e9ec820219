//! Shared fault-injection configuration.
//!
//! A [`FaultConfig`] is the mutable store a test arms and the decorators
//! consult. It is passed explicitly as an `Arc` and resolved once at
//! decorator construction, never reached through a global, so parallel test
//! runs can operate independently configured stores.

use std::sync::{Mutex, MutexGuard, PoisonError};

use sigil_core::Fault;

/// Mutable fault store consulted by [`crate::FaultEndpoint`].
///
/// An armed fault persists until cleared; every connector resolution checked
/// against it fails with a clone of the same fault. A single check is one
/// lock acquisition, so it is atomic with respect to concurrent arming.
#[derive(Debug, Default)]
pub struct FaultConfig {
    connectors: Mutex<Option<Fault>>,
}

impl FaultConfig {
    /// Create a configuration with no faults armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a fault for subsequent connector resolutions.
    pub fn fail_connectors(&self, fault: Fault) {
        *self.slot() = Some(fault);
    }

    /// Disarm the connectors fault.
    pub fn clear_connectors(&self) {
        *self.slot() = None;
    }

    /// Check the connectors slot, returning the armed fault if any.
    pub fn check_connectors_fault(&self) -> Result<(), Fault> {
        match self.slot().as_ref() {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Fault>> {
        self.connectors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
