//! In-process reference backend.
//!
//! Wires all three collaborator contracts over a shared [`AttachmentTable`].
//! Serves as the default wiring for embedded use and as the base for test
//! doubles. The hypervisor side is simulated: attach acceptance reserves a
//! device name immediately.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::{BackendError, InstanceResolver, VolumeBackend, VolumeResolver};
use crate::errors::{DomainError, Result};
use crate::registry::{AttachmentRecord, AttachmentTable};
use crate::types::{Instance, InstanceId, Operation, VmState, VolumeId, VolumeRef};

/// In-memory compute + volume service standing in for the real collaborators.
///
/// Cloneable via `Arc`; all clones share the same state. The backend re-reads
/// its own instance view on every accepted call, so a lock taken after the
/// guard's point-in-time check is still honored here.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    instances: RwLock<HashMap<InstanceId, Instance>>,
    volumes: RwLock<HashSet<VolumeId>>,
    /// Volumes the backend rejects as invalid for attach/swap.
    rejected_volumes: RwLock<HashSet<VolumeId>>,
    table: AttachmentTable,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend").finish()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The attachment table backing this backend. Share it with the
    /// coordinator as its registry.
    pub fn table(&self) -> AttachmentTable {
        self.inner.table.clone()
    }

    /// Register an instance in the simulated compute service.
    pub fn add_instance(&self, instance: Instance) {
        self.inner
            .instances
            .write()
            .insert(instance.id.clone(), instance);
    }

    /// Register a volume in the simulated volume service.
    pub fn add_volume(&self, volume_id: impl Into<VolumeId>) {
        self.inner.volumes.write().insert(volume_id.into());
    }

    /// Mark a volume as invalid for attach/swap (wrong type/size/state).
    pub fn reject_volume(&self, volume_id: impl Into<VolumeId>) {
        let id = volume_id.into();
        self.inner.volumes.write().insert(id.clone());
        self.inner.rejected_volumes.write().insert(id);
    }

    /// Flip the lock flag on a registered instance.
    pub fn set_locked(&self, instance_id: &InstanceId, locked: bool) {
        if let Some(instance) = self.inner.instances.write().get_mut(instance_id) {
            instance.locked = locked;
        }
    }

    /// Seed an existing attachment record, bypassing the attach path.
    pub fn seed_attachment(&self, record: AttachmentRecord) -> Result<()> {
        self.inner
            .volumes
            .write()
            .insert(record.volume_id.clone());
        self.inner.table.insert(record)
    }

    /// Current view of the instance, preferring the backend's own state over
    /// the possibly stale snapshot the coordinator resolved.
    fn current_instance(&self, instance: &Instance) -> Instance {
        self.inner
            .instances
            .read()
            .get(&instance.id)
            .cloned()
            .unwrap_or_else(|| instance.clone())
    }

    fn check_mutable(
        &self,
        instance: &Instance,
        operation: Operation,
    ) -> std::result::Result<(), BackendError> {
        let current = self.current_instance(instance);
        if current.locked {
            return Err(BackendError::InstanceIsLocked(current.id.to_string()));
        }
        if current.vm_state == VmState::Error {
            return Err(BackendError::InstanceInvalidState {
                instance: current.id.to_string(),
                operation: operation.to_string(),
                state: current.vm_state.to_string(),
            });
        }
        Ok(())
    }

    /// Pick the next free `/dev/vdX` name for the instance.
    fn next_device_name(&self, instance_id: &InstanceId) -> std::result::Result<String, BackendError> {
        let records = self
            .inner
            .table
            .records(instance_id)
            .map_err(|e| BackendError::Internal(e.to_string()))?;
        let used: HashSet<String> = records
            .iter()
            .filter_map(|r| r.device_name.clone())
            .collect();

        // /dev/vda is conventionally the root disk.
        for letter in 'b'..='z' {
            let candidate = format!("/dev/vd{letter}");
            if !used.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(BackendError::Internal(format!(
            "no free device names on instance {instance_id}"
        )))
    }
}

#[async_trait::async_trait]
impl InstanceResolver for InMemoryBackend {
    async fn resolve(&self, instance_id: &InstanceId) -> Result<Instance> {
        self.inner
            .instances
            .read()
            .get(instance_id)
            .cloned()
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))
    }
}

#[async_trait::async_trait]
impl VolumeResolver for InMemoryBackend {
    async fn resolve(&self, volume_id: &VolumeId) -> Result<VolumeRef> {
        if self.inner.volumes.read().contains(volume_id) {
            Ok(VolumeRef::new(volume_id.clone()))
        } else {
            Err(DomainError::VolumeNotFound(volume_id.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl VolumeBackend for InMemoryBackend {
    async fn attach(
        &self,
        instance: &Instance,
        volume: &VolumeRef,
        device_hint: Option<&str>,
    ) -> std::result::Result<Option<String>, BackendError> {
        self.check_mutable(instance, Operation::Attach)?;

        if self.inner.rejected_volumes.read().contains(&volume.id) {
            return Err(BackendError::InvalidVolume(volume.id.to_string()));
        }

        let device = match device_hint {
            Some(hint) => hint.to_string(),
            None => self.next_device_name(&instance.id)?,
        };

        let record = AttachmentRecord::new(
            instance.id.clone(),
            volume.id.clone(),
            Some(device.clone()),
        );
        self.inner.table.insert(record).map_err(|e| match e {
            DomainError::InvalidInput(msg) => BackendError::InvalidInput(msg),
            other => BackendError::Internal(other.to_string()),
        })?;

        tracing::info!(
            instance_id = %instance.id,
            volume_id = %volume.id,
            device = %device,
            "accepted volume attach"
        );
        Ok(Some(device))
    }

    async fn detach(
        &self,
        instance: &Instance,
        volume: &VolumeRef,
    ) -> std::result::Result<(), BackendError> {
        self.check_mutable(instance, Operation::Detach)?;

        let removed = self
            .inner
            .table
            .remove(&instance.id, &volume.id)
            .map_err(|e| BackendError::Internal(e.to_string()))?;

        match removed {
            Some(_) => {
                tracing::info!(
                    instance_id = %instance.id,
                    volume_id = %volume.id,
                    "accepted volume detach"
                );
                Ok(())
            }
            None => Err(BackendError::VolumeUnattached(volume.id.to_string())),
        }
    }

    async fn swap(
        &self,
        instance: &Instance,
        old: &VolumeRef,
        new: &VolumeRef,
    ) -> std::result::Result<(), BackendError> {
        self.check_mutable(instance, Operation::Swap)?;

        if self.inner.rejected_volumes.read().contains(&new.id) {
            return Err(BackendError::InvalidVolume(new.id.to_string()));
        }

        let swapped = self
            .inner
            .table
            .replace_volume(&instance.id, &old.id, &new.id)
            .map_err(|e| match e {
                DomainError::InvalidInput(msg) => BackendError::InvalidInput(msg),
                other => BackendError::Internal(other.to_string()),
            })?;

        if swapped {
            tracing::info!(
                instance_id = %instance.id,
                old_volume = %old.id,
                new_volume = %new.id,
                "accepted volume swap"
            );
            Ok(())
        } else {
            Err(BackendError::VolumeUnattached(old.id.to_string()))
        }
    }
}
