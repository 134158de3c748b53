//! Thread-safe in-process attachment table.
//!
//! Holds the durable attachment state for the in-process backend and serves
//! the registry read path. The coordinator never writes here directly; only
//! the backend collaborator does.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::{DomainError, Result};
use crate::registry::{AttachmentRecord, AttachmentRegistry};
use crate::types::{InstanceId, VolumeId};

/// Shared table of attachment records, keyed by instance.
///
/// Cloneable via `Arc`; RwLock allows multiple readers, single writer.
/// Enforces the record invariant: at most one record per
/// `(instance, volume)` pair.
#[derive(Clone, Default)]
pub struct AttachmentTable {
    inner: Arc<RwLock<TableInner>>,
}

#[derive(Default)]
struct TableInner {
    records: HashMap<InstanceId, Vec<AttachmentRecord>>,
}

impl std::fmt::Debug for AttachmentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentTable").finish()
    }
}

impl AttachmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the instance already has a record for this
    /// volume.
    pub fn insert(&self, record: AttachmentRecord) -> Result<()> {
        let mut inner = write_lock(&self.inner)?;

        let records = inner.records.entry(record.instance_id.clone()).or_default();
        if records.iter().any(|r| r.volume_id == record.volume_id) {
            return Err(DomainError::InvalidInput(format!(
                "volume {} is already attached to instance {}",
                record.volume_id, record.instance_id
            )));
        }

        tracing::debug!(
            instance_id = %record.instance_id,
            volume_id = %record.volume_id,
            device = ?record.device_name,
            "recording attachment"
        );
        records.push(record);
        Ok(())
    }

    /// Remove the record for `(instance, volume)`, returning it.
    pub fn remove(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
    ) -> Result<Option<AttachmentRecord>> {
        let mut inner = write_lock(&self.inner)?;

        let Some(records) = inner.records.get_mut(instance_id) else {
            return Ok(None);
        };
        let Some(pos) = records.iter().position(|r| &r.volume_id == volume_id) else {
            return Ok(None);
        };

        let record = records.remove(pos);
        tracing::debug!(
            instance_id = %instance_id,
            volume_id = %volume_id,
            "removed attachment record"
        );
        Ok(Some(record))
    }

    /// Replace `old_volume` with `new_volume` in place, preserving the
    /// logical attachment slot. Returns false when no record matched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `new_volume` already has a record on the
    /// instance; rewriting in place must not create a second record for the
    /// same `(instance, volume)` pair.
    pub fn replace_volume(
        &self,
        instance_id: &InstanceId,
        old_volume: &VolumeId,
        new_volume: &VolumeId,
    ) -> Result<bool> {
        let mut inner = write_lock(&self.inner)?;

        let Some(records) = inner.records.get_mut(instance_id) else {
            return Ok(false);
        };
        if records.iter().any(|r| &r.volume_id == new_volume) {
            return Err(DomainError::InvalidInput(format!(
                "volume {new_volume} is already attached to instance {instance_id}"
            )));
        }
        let Some(record) = records.iter_mut().find(|r| &r.volume_id == old_volume) else {
            return Ok(false);
        };

        tracing::debug!(
            instance_id = %instance_id,
            old_volume = %old_volume,
            new_volume = %new_volume,
            device = ?record.device_name,
            "swapped attachment record in place"
        );
        record.volume_id = new_volume.clone();
        Ok(true)
    }

    /// Finalize the device name on a record once the hypervisor assigns it.
    pub fn set_device_name(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        device_name: &str,
    ) -> Result<bool> {
        let mut inner = write_lock(&self.inner)?;

        let Some(record) = inner
            .records
            .get_mut(instance_id)
            .and_then(|records| records.iter_mut().find(|r| &r.volume_id == volume_id))
        else {
            return Ok(false);
        };

        record.device_name = Some(device_name.to_string());
        Ok(true)
    }

    /// Snapshot of the records for an instance, insertion order preserved.
    pub fn records(&self, instance_id: &InstanceId) -> Result<Vec<AttachmentRecord>> {
        let inner = read_lock(&self.inner)?;
        Ok(inner
            .records
            .get(instance_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Number of records currently held for an instance.
    pub fn count(&self, instance_id: &InstanceId) -> Result<usize> {
        let inner = read_lock(&self.inner)?;
        Ok(inner.records.get(instance_id).map_or(0, Vec::len))
    }
}

#[async_trait::async_trait]
impl AttachmentRegistry for AttachmentTable {
    async fn records_for(&self, instance_id: &InstanceId) -> Result<Vec<AttachmentRecord>> {
        self.records(instance_id)
    }
}

fn write_lock(
    lock: &RwLock<TableInner>,
) -> Result<std::sync::RwLockWriteGuard<'_, TableInner>> {
    lock.write()
        .map_err(|e| DomainError::Internal(format!("attachment table lock poisoned: {e}")))
}

fn read_lock(lock: &RwLock<TableInner>) -> Result<std::sync::RwLockReadGuard<'_, TableInner>> {
    lock.read()
        .map_err(|e| DomainError::Internal(format!("attachment table lock poisoned: {e}")))
}
