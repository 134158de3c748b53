//! External collaborator contracts.
//!
//! The coordinator drives three opaque collaborators: an instance resolver,
//! a volume resolver, and the volume backend that performs the actual
//! attach/detach/swap I/O. All are async and long-running relative to the
//! accepting call; the coordinator only waits for synchronous
//! acceptance/rejection.

mod memory;

pub use memory::InMemoryBackend;

use thiserror::Error;

use crate::errors::{DomainError, Result};
use crate::types::{Instance, InstanceId, VolumeId, VolumeRef};

/// Failure reported by the volume backend during an accepted call.
///
/// These can surface *after* the guard's point-in-time check passed; the
/// backend is the final arbiter of instance state.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("instance {0} is locked")]
    InstanceIsLocked(String),

    #[error("cannot {operation} instance {instance} while it is in vm_state {state}")]
    InstanceInvalidState {
        instance: String,
        operation: String,
        state: String,
    },

    /// The volume is not currently attached. Transient from the scan's point
    /// of view: another record may be the live one.
    #[error("volume {0} is not attached")]
    VolumeUnattached(String),

    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    #[error("invalid device path: {0}")]
    InvalidDevicePath(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cell mapping for instance {0} could not be found")]
    InstanceUnknownCell(String),

    #[error("backend failure: {0}")]
    Internal(String),
}

impl From<BackendError> for DomainError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InstanceIsLocked(id) => DomainError::InstanceIsLocked(id),
            BackendError::InstanceInvalidState {
                instance,
                operation,
                state,
            } => DomainError::InstanceInvalidState {
                instance,
                operation,
                state,
            },
            // Safety net for raw backend calls; the coordinator's scan
            // consumes this variant before it can get here.
            BackendError::VolumeUnattached(volume) => DomainError::AttachmentNotFound(volume),
            BackendError::InvalidVolume(msg) => DomainError::InvalidVolume(msg),
            BackendError::InvalidDevicePath(path) => DomainError::InvalidDevicePath(path),
            BackendError::InvalidInput(msg) => DomainError::InvalidInput(msg),
            BackendError::InstanceUnknownCell(id) => DomainError::InstanceNotFound(id),
            BackendError::Internal(msg) => DomainError::Internal(msg),
        }
    }
}

/// Resolves an instance id against the owning compute system.
#[async_trait::async_trait]
pub trait InstanceResolver: Send + Sync {
    /// Fails `InstanceNotFound` when the id cannot be resolved.
    async fn resolve(&self, instance_id: &InstanceId) -> Result<Instance>;
}

/// Resolves a volume id against the volume-management collaborator.
#[async_trait::async_trait]
pub trait VolumeResolver: Send + Sync {
    /// Fails `VolumeNotFound` when the id cannot be resolved.
    async fn resolve(&self, volume_id: &VolumeId) -> Result<VolumeRef>;
}

/// Performs the hypervisor-side attach/detach/swap I/O.
///
/// All three calls are acceptance-only: a success means the backend accepted
/// the request, not that the hypervisor-side operation has completed.
#[async_trait::async_trait]
pub trait VolumeBackend: Send + Sync {
    /// Accept an attach. Returns the device identifier actually reserved,
    /// or `None` when it will only be known once the attach completes.
    async fn attach(
        &self,
        instance: &Instance,
        volume: &VolumeRef,
        device_hint: Option<&str>,
    ) -> std::result::Result<Option<String>, BackendError>;

    /// Accept a detach of `volume` from `instance`.
    async fn detach(
        &self,
        instance: &Instance,
        volume: &VolumeRef,
    ) -> std::result::Result<(), BackendError>;

    /// Accept a swap of `old` for `new`, preserving the attachment slot.
    async fn swap(
        &self,
        instance: &Instance,
        old: &VolumeRef,
        new: &VolumeRef,
    ) -> std::result::Result<(), BackendError>;
}
