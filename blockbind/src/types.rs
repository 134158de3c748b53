//! Core identifiers and instance/volume domain types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque compute instance identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque block-storage volume identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeId(String);

impl VolumeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VolumeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Instance lifecycle state, as read from the owning compute system.
///
/// Only the shelved pair matters to the state guard; every other state passes
/// through and the backend remains the final arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Active,
    Paused,
    Stopped,
    Shelved,
    ShelvedOffloaded,
    Error,
}

impl VmState {
    /// Whether this is one of the shelved states gated by API version.
    pub fn is_shelved(&self) -> bool {
        matches!(self, VmState::Shelved | VmState::ShelvedOffloaded)
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmState::Active => "active",
            VmState::Paused => "paused",
            VmState::Stopped => "stopped",
            VmState::Shelved => "shelved",
            VmState::ShelvedOffloaded => "shelved_offloaded",
            VmState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a compute instance. Owned by the surrounding
/// compute system; this crate only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub vm_state: VmState,
    pub locked: bool,
}

impl Instance {
    pub fn new(id: impl Into<InstanceId>, vm_state: VmState) -> Self {
        Self {
            id: id.into(),
            vm_state,
            locked: false,
        }
    }
}

impl From<&str> for Instance {
    fn from(id: &str) -> Self {
        Instance::new(InstanceId::from(id), VmState::Active)
    }
}

/// Resolved volume identity from the volume-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRef {
    pub id: VolumeId,
}

impl VolumeRef {
    pub fn new(id: impl Into<VolumeId>) -> Self {
        Self { id: id.into() }
    }
}

/// The mutation an attachment request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Attach,
    Detach,
    Swap,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Attach => "attach_volume",
            Operation::Detach => "detach_volume",
            Operation::Swap => "swap_volume",
        };
        f.write_str(s)
    }
}

/// Transient value describing a desired attachment mutation.
///
/// `volume_id` is the target volume, or the *old* volume for swap.
/// `new_volume_id` is swap-only; `device_hint` is attach-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRequest {
    pub operation: Operation,
    pub instance_id: InstanceId,
    pub volume_id: VolumeId,
    pub new_volume_id: Option<VolumeId>,
    pub device_hint: Option<String>,
}

impl AttachmentRequest {
    pub fn attach(
        instance_id: impl Into<InstanceId>,
        volume_id: impl Into<VolumeId>,
        device_hint: Option<String>,
    ) -> Self {
        Self {
            operation: Operation::Attach,
            instance_id: instance_id.into(),
            volume_id: volume_id.into(),
            new_volume_id: None,
            device_hint,
        }
    }

    pub fn detach(instance_id: impl Into<InstanceId>, volume_id: impl Into<VolumeId>) -> Self {
        Self {
            operation: Operation::Detach,
            instance_id: instance_id.into(),
            volume_id: volume_id.into(),
            new_volume_id: None,
            device_hint: None,
        }
    }

    pub fn swap(
        instance_id: impl Into<InstanceId>,
        old_volume_id: impl Into<VolumeId>,
        new_volume_id: impl Into<VolumeId>,
    ) -> Self {
        Self {
            operation: Operation::Swap,
            instance_id: instance_id.into(),
            volume_id: old_volume_id.into(),
            new_volume_id: Some(new_volume_id.into()),
            device_hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shelved_states() {
        assert!(VmState::Shelved.is_shelved());
        assert!(VmState::ShelvedOffloaded.is_shelved());
        assert!(!VmState::Active.is_shelved());
        assert!(!VmState::Error.is_shelved());
    }

    #[test]
    fn operation_names() {
        assert_eq!(Operation::Attach.to_string(), "attach_volume");
        assert_eq!(Operation::Detach.to_string(), "detach_volume");
        assert_eq!(Operation::Swap.to_string(), "swap_volume");
    }

    #[test]
    fn swap_request_carries_both_volumes() {
        let req = AttachmentRequest::swap("i1", "v-old", "v-new");
        assert_eq!(req.operation, Operation::Swap);
        assert_eq!(req.volume_id.as_str(), "v-old");
        assert_eq!(req.new_volume_id.as_ref().unwrap().as_str(), "v-new");
    }
}
