//! Operation bodies for the coordinator.
//!
//! Each follows *locate -> guard -> attempt*; classification into the
//! caller-visible taxonomy happens in `classify.rs`, either via the
//! `*_classified` wrappers or by the embedding transport.

use chrono::Utc;

use crate::coordinator::retry::{self, ScanDisposition};
use crate::coordinator::{CoordinatorInner, RequestContext};
use crate::device;
use crate::errors::{DomainError, Result};
use crate::registry::{AttachmentRecord, AttachmentSummary};
use crate::types::{InstanceId, Operation, VolumeId};

/// Attach a volume. Returns a provisional record on backend acceptance; the
/// device name may be finalized later by the hypervisor side.
pub(crate) async fn attach(
    inner: &CoordinatorInner,
    instance_id: &InstanceId,
    volume_id: &VolumeId,
    device_hint: Option<&str>,
    ctx: RequestContext,
) -> Result<AttachmentRecord> {
    device::validate_device_hint(device_hint)?;

    tracing::debug!(
        instance_id = %instance_id,
        volume_id = %volume_id,
        device_hint = ?device_hint,
        "attach requested"
    );

    let lock = inner.locks.for_instance(instance_id);
    let _serialized = lock.lock().await;

    let instance = inner.instances.resolve(instance_id).await?;
    inner
        .guard
        .check(&instance, Operation::Attach, ctx.api_version)?;
    let volume = inner.volumes.resolve(volume_id).await?;

    let device = inner
        .backend
        .attach(&instance, &volume, device_hint)
        .await
        .map_err(DomainError::from)?;

    tracing::info!(
        instance_id = %instance_id,
        volume_id = %volume_id,
        device = ?device,
        "attach accepted"
    );

    Ok(AttachmentRecord {
        instance_id: instance_id.clone(),
        volume_id: volume_id.clone(),
        device_name: device,
        is_root: false,
        created_at: Utc::now(),
    })
}

/// Detach a volume, scanning candidate records and continuing past ones the
/// backend reports as not currently attached.
pub(crate) async fn detach(
    inner: &CoordinatorInner,
    instance_id: &InstanceId,
    volume_id: &VolumeId,
    ctx: RequestContext,
) -> Result<()> {
    tracing::debug!(
        instance_id = %instance_id,
        volume_id = %volume_id,
        "detach requested"
    );

    let lock = inner.locks.for_instance(instance_id);
    let _serialized = lock.lock().await;

    let instance = inner.instances.resolve(instance_id).await?;
    inner
        .guard
        .check(&instance, Operation::Detach, ctx.api_version)?;
    let volume = inner.volumes.resolve(volume_id).await?;

    let records = inner.registry.records_for(instance_id).await?;
    if records.is_empty() {
        return Err(DomainError::NotAttached(instance_id.to_string()));
    }

    for record in records.iter().filter(|r| &r.volume_id == volume_id) {
        if record.is_root {
            return Err(DomainError::RootVolumeDetach);
        }

        match inner.backend.detach(&instance, &volume).await {
            Ok(()) => {
                tracing::info!(
                    instance_id = %instance_id,
                    volume_id = %volume_id,
                    device = ?record.device_name,
                    "detach accepted"
                );
                return Ok(());
            }
            Err(err) => match retry::disposition(Operation::Detach, err) {
                ScanDisposition::Continue => continue,
                ScanDisposition::Fatal(domain) => return Err(domain),
            },
        }
    }

    Err(DomainError::AttachmentNotFound(volume_id.to_string()))
}

/// Swap an attached volume for a new one. Both volumes are resolved before
/// the instance is touched, so an unresolvable new volume never mutates
/// state.
pub(crate) async fn swap(
    inner: &CoordinatorInner,
    instance_id: &InstanceId,
    old_volume_id: &VolumeId,
    new_volume_id: &VolumeId,
    ctx: RequestContext,
) -> Result<()> {
    tracing::debug!(
        instance_id = %instance_id,
        old_volume = %old_volume_id,
        new_volume = %new_volume_id,
        "swap requested"
    );

    let old = inner.volumes.resolve(old_volume_id).await?;
    let new = inner.volumes.resolve(new_volume_id).await?;

    let lock = inner.locks.for_instance(instance_id);
    let _serialized = lock.lock().await;

    let instance = inner.instances.resolve(instance_id).await?;
    inner
        .guard
        .check(&instance, Operation::Swap, ctx.api_version)?;

    let records = inner.registry.records_for(instance_id).await?;

    for record in records.iter().filter(|r| &r.volume_id == old_volume_id) {
        match inner.backend.swap(&instance, &old, &new).await {
            Ok(()) => {
                tracing::info!(
                    instance_id = %instance_id,
                    old_volume = %old_volume_id,
                    new_volume = %new_volume_id,
                    device = ?record.device_name,
                    "swap accepted"
                );
                return Ok(());
            }
            Err(err) => match retry::disposition(Operation::Swap, err) {
                ScanDisposition::Continue => continue,
                ScanDisposition::Fatal(domain) => return Err(domain),
            },
        }
    }

    Err(DomainError::SwapSourceNotAttached)
}

/// List attachments as public summaries, bounded by the request or default
/// limit.
pub(crate) async fn list(
    inner: &CoordinatorInner,
    instance_id: &InstanceId,
    ctx: RequestContext,
) -> Result<Vec<AttachmentSummary>> {
    inner.instances.resolve(instance_id).await?;

    let mut records = inner.registry.records_for(instance_id).await?;
    if let Some(limit) = ctx.limit.or(inner.options.default_list_limit) {
        records.truncate(limit);
    }

    Ok(records.iter().map(AttachmentSummary::from).collect())
}

/// Detail view of one attachment.
pub(crate) async fn show(
    inner: &CoordinatorInner,
    instance_id: &InstanceId,
    volume_id: &VolumeId,
) -> Result<AttachmentSummary> {
    inner.instances.resolve(instance_id).await?;

    let records = inner.registry.records_for(instance_id).await?;
    if records.is_empty() {
        return Err(DomainError::NotAttached(instance_id.to_string()));
    }

    records
        .iter()
        .find(|r| &r.volume_id == volume_id)
        .map(AttachmentSummary::from)
        .ok_or_else(|| DomainError::AttachmentNotFound(volume_id.to_string()))
}
