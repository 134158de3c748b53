//! Instance state guard: precondition checks before any mutation.

use crate::errors::{DomainError, Result};
use crate::types::{Instance, Operation};
use crate::version::ApiVersion;

/// Validates that an instance permits the intended mutation.
///
/// This is a precondition gate only: a point-in-time read with no side
/// effects, evaluated before any mutation begins. The backend remains the
/// final arbiter and may still reject the operation at execution time.
#[derive(Debug, Clone)]
pub struct StateGuard {
    /// Version at which volume mutations on shelved instances are allowed.
    shelved_floor: ApiVersion,
}

impl Default for StateGuard {
    fn default() -> Self {
        Self {
            shelved_floor: ApiVersion::SHELVED_VOLUME_OPS,
        }
    }
}

impl StateGuard {
    pub fn new(shelved_floor: ApiVersion) -> Self {
        Self { shelved_floor }
    }

    /// Check whether `instance` may undergo `operation` for a caller that
    /// declared `api_version`.
    pub fn check(
        &self,
        instance: &Instance,
        operation: Operation,
        api_version: ApiVersion,
    ) -> Result<()> {
        if instance.locked {
            return Err(DomainError::InstanceIsLocked(instance.id.to_string()));
        }

        if instance.vm_state.is_shelved() && api_version < self.shelved_floor {
            tracing::debug!(
                instance_id = %instance.id,
                state = %instance.vm_state,
                declared = %api_version,
                required = %self.shelved_floor,
                "rejecting {} on shelved instance below version floor", operation
            );
            return Err(DomainError::ShelvedVersionGate {
                operation: operation.to_string(),
                state: instance.vm_state.to_string(),
                required: self.shelved_floor.to_string(),
            });
        }

        Ok(())
    }
}
