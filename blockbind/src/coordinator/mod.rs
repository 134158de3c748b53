//! Operation coordinator: the attach/detach/swap orchestration core.
//!
//! Every operation follows the same template: *locate -> guard -> attempt ->
//! classify*. The coordinator holds no durable state; it reads the registry
//! fresh per call and delegates all mutation to the backend collaborator.
//!
//! ## Module layout
//!
//! - `ops`: operation bodies (attach/detach/swap/list/show)
//! - `retry`: typed disposition of backend failures during candidate scans
//! - `locks`: per-instance serialization of guard + attempt

mod locks;
mod ops;
mod retry;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{InMemoryBackend, InstanceResolver, VolumeBackend, VolumeResolver};
use crate::classify::{ClassifiedOutcome, classify};
use crate::errors::{DomainError, Result};
use crate::guard::StateGuard;
use crate::registry::{AttachmentRecord, AttachmentRegistry, AttachmentSummary};
use crate::types::{AttachmentRequest, InstanceId, Operation, VolumeId};
use crate::version::ApiVersion;

use locks::InstanceLocks;

/// Static coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorOptions {
    /// Version at which volume mutations on shelved instances are allowed.
    pub shelved_floor: ApiVersion,
    /// Limit applied to list results when the request carries none.
    pub default_list_limit: Option<usize>,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            shelved_floor: ApiVersion::SHELVED_VOLUME_OPS,
            default_list_limit: Some(1000),
        }
    }
}

/// Request-scoped values: the caller's declared capability version and an
/// optional pagination limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub api_version: ApiVersion,
    pub limit: Option<usize>,
}

impl RequestContext {
    pub fn with_version(api_version: ApiVersion) -> Self {
        Self {
            api_version,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Orchestrates volume attachment lifecycle operations.
///
/// Cheaply cloneable via `Arc`; all clones share the per-instance lock map.
/// Safe to retry at the request layer: attach is idempotent-intent, and
/// detach/swap retries rely on the backend reporting already-detached /
/// already-swapped conditions.
#[derive(Clone)]
pub struct AttachmentCoordinator {
    inner: Arc<CoordinatorInner>,
}

pub(crate) struct CoordinatorInner {
    pub(crate) registry: Arc<dyn AttachmentRegistry>,
    pub(crate) instances: Arc<dyn InstanceResolver>,
    pub(crate) volumes: Arc<dyn VolumeResolver>,
    pub(crate) backend: Arc<dyn VolumeBackend>,
    pub(crate) guard: StateGuard,
    pub(crate) options: CoordinatorOptions,
    pub(crate) locks: InstanceLocks,
}

impl std::fmt::Debug for AttachmentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentCoordinator").finish()
    }
}

impl AttachmentCoordinator {
    /// Build a coordinator over explicit collaborators.
    pub fn new(
        registry: Arc<dyn AttachmentRegistry>,
        instances: Arc<dyn InstanceResolver>,
        volumes: Arc<dyn VolumeResolver>,
        backend: Arc<dyn VolumeBackend>,
        options: CoordinatorOptions,
    ) -> Self {
        let guard = StateGuard::new(options.shelved_floor);
        Self {
            inner: Arc::new(CoordinatorInner {
                registry,
                instances,
                volumes,
                backend,
                guard,
                options,
                locks: InstanceLocks::new(),
            }),
        }
    }

    /// Default wiring over the in-process backend. Returns the backend handle
    /// for seeding instances, volumes, and attachment records.
    pub fn in_memory(options: CoordinatorOptions) -> (Self, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        let coordinator = Self::new(
            Arc::new(backend.table()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            options,
        );
        (coordinator, backend)
    }

    /// Attach `volume_id` to the instance.
    ///
    /// Returns a provisional [`AttachmentRecord`] once the backend accepts
    /// the request; `device_name` may still be `None` until the hypervisor
    /// finalizes the attach. Acceptance does not guarantee completion.
    pub async fn attach(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        device_hint: Option<&str>,
        ctx: RequestContext,
    ) -> Result<AttachmentRecord> {
        ops::attach(&self.inner, instance_id, volume_id, device_hint, ctx).await
    }

    /// Detach `volume_id` from the instance.
    pub async fn detach(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        ctx: RequestContext,
    ) -> Result<()> {
        ops::detach(&self.inner, instance_id, volume_id, ctx).await
    }

    /// Swap `old_volume_id` for `new_volume_id`, preserving the slot.
    pub async fn swap(
        &self,
        instance_id: &InstanceId,
        old_volume_id: &VolumeId,
        new_volume_id: &VolumeId,
        ctx: RequestContext,
    ) -> Result<()> {
        ops::swap(&self.inner, instance_id, old_volume_id, new_volume_id, ctx).await
    }

    /// List the instance's attachments as public summaries.
    pub async fn list(
        &self,
        instance_id: &InstanceId,
        ctx: RequestContext,
    ) -> Result<Vec<AttachmentSummary>> {
        ops::list(&self.inner, instance_id, ctx).await
    }

    /// Detail view for one attachment.
    pub async fn show(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
    ) -> Result<AttachmentSummary> {
        ops::show(&self.inner, instance_id, volume_id).await
    }

    /// Dispatch a prepared [`AttachmentRequest`].
    ///
    /// Attach yields the provisional record; detach and swap yield `None`
    /// on acceptance.
    pub async fn submit(
        &self,
        request: &AttachmentRequest,
        ctx: RequestContext,
    ) -> Result<Option<AttachmentRecord>> {
        match request.operation {
            Operation::Attach => self
                .attach(
                    &request.instance_id,
                    &request.volume_id,
                    request.device_hint.as_deref(),
                    ctx,
                )
                .await
                .map(Some),
            Operation::Detach => self
                .detach(&request.instance_id, &request.volume_id, ctx)
                .await
                .map(|_| None),
            Operation::Swap => {
                let new_volume_id = request.new_volume_id.as_ref().ok_or_else(|| {
                    DomainError::InvalidInput("swap requires a new volume id".into())
                })?;
                self.swap(&request.instance_id, &request.volume_id, new_volume_id, ctx)
                    .await
                    .map(|_| None)
            }
        }
    }

    /// Run `attach` and fold the result into the caller-visible taxonomy.
    pub async fn attach_classified(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        device_hint: Option<&str>,
        ctx: RequestContext,
    ) -> ClassifiedOutcome<AttachmentRecord> {
        classify(self.attach(instance_id, volume_id, device_hint, ctx).await)
    }

    /// Run `detach` and fold the result into the caller-visible taxonomy.
    pub async fn detach_classified(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        ctx: RequestContext,
    ) -> ClassifiedOutcome<()> {
        classify(self.detach(instance_id, volume_id, ctx).await)
    }

    /// Run `swap` and fold the result into the caller-visible taxonomy.
    pub async fn swap_classified(
        &self,
        instance_id: &InstanceId,
        old_volume_id: &VolumeId,
        new_volume_id: &VolumeId,
        ctx: RequestContext,
    ) -> ClassifiedOutcome<()> {
        classify(
            self.swap(instance_id, old_volume_id, new_volume_id, ctx)
                .await,
        )
    }
}

// Compile-time assertion: the coordinator must be shareable across tasks.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<AttachmentCoordinator>;
};
