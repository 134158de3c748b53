//! Domain error types for attachment operations.
//!
//! Every failure the guard, registry, or coordinator can raise is a variant
//! here. The transport-facing taxonomy lives in [`crate::classify`]; nothing
//! outside that module should inspect variants to decide an outcome kind.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Domain-level failure raised during an attachment operation.
///
/// Display strings are the messages surfaced to callers, so they stay short
/// and human-readable.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The instance id could not be resolved.
    #[error("instance {0} could not be found")]
    InstanceNotFound(String),

    /// The volume id could not be resolved.
    #[error("volume {0} could not be found")]
    VolumeNotFound(String),

    /// The instance has no attachment record for this volume.
    #[error("volume_id not found: {0}")]
    AttachmentNotFound(String),

    /// The instance has no attachment records at all.
    #[error("instance {0} is not attached")]
    NotAttached(String),

    /// A swap scan exhausted every candidate record without success.
    #[error("the volume was either invalid or not attached to the instance")]
    SwapSourceNotAttached,

    /// The instance is locked against mutation.
    #[error("instance {0} is locked")]
    InstanceIsLocked(String),

    /// The instance lifecycle state does not permit the operation.
    #[error("cannot {operation} instance {instance} while it is in vm_state {state}")]
    InstanceInvalidState {
        instance: String,
        operation: String,
        state: String,
    },

    /// The operation on a shelved instance needs a newer declared API version.
    #[error("{operation} on an instance in vm_state {state} requires api version {required} or newer")]
    ShelvedVersionGate {
        operation: String,
        state: String,
        required: String,
    },

    /// Root volumes are never detachable through this path.
    #[error("can't detach root device volume")]
    RootVolumeDetach,

    /// A device path hint did not match the block-device naming pattern.
    #[error("invalid device path: {0}")]
    InvalidDevicePath(String),

    /// The volume is unsuitable for the requested operation.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    /// Malformed request input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure (poisoned lock, backend fault, ...).
    #[error("internal error: {0}")]
    Internal(String),
}
