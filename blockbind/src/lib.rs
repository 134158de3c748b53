//! Volume attachment lifecycle management for compute instances.
//!
//! `blockbind` attaches, detaches, and swaps block-storage volumes on running
//! compute instances. It reconciles an authoritative list of device-mapping
//! records against asynchronous backend operations and enforces the
//! correctness preconditions (instance state, locking, root-device
//! protection) before mutating anything.
//!
//! ## Architecture
//!
//! - [`registry`]: device-mapping records and their read-only view
//! - [`guard`]: instance-state precondition gate
//! - [`coordinator`]: attach/detach/swap/list orchestration
//! - [`classify`]: the stable four-kind outcome taxonomy
//! - [`backend`]: collaborator contracts plus an in-process reference backend
//!
//! Mutation of durable attachment state belongs entirely to the backend
//! collaborator; the coordinator holds no durable state of its own and reads
//! the registry fresh per operation.
//!
//! ## Example
//!
//! ```rust
//! use blockbind::{
//!     AttachmentCoordinator, CoordinatorOptions, Instance, InstanceId, RequestContext, VolumeId,
//! };
//!
//! # async fn example() -> blockbind::Result<()> {
//! let (coordinator, backend) = AttachmentCoordinator::in_memory(CoordinatorOptions::default());
//! backend.add_instance(Instance::from("inst-1"));
//! backend.add_volume("vol-1");
//!
//! let record = coordinator
//!     .attach(
//!         &InstanceId::from("inst-1"),
//!         &VolumeId::from("vol-1"),
//!         None,
//!         RequestContext::default(),
//!     )
//!     .await?;
//! println!("accepted on {:?}", record.device_name);
//! # Ok(())
//! # }
//! ```
//!
//! Attach and swap successes are acceptance-only: the hypervisor-side
//! operation may still be in flight when the call returns, and callers must
//! tolerate that window.

pub mod backend;
pub mod classify;
pub mod coordinator;
pub mod device;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod registry;
pub mod types;
pub mod version;

pub use backend::{BackendError, InMemoryBackend, InstanceResolver, VolumeBackend, VolumeResolver};
pub use classify::{ClassifiedOutcome, OutcomeKind, classify};
pub use coordinator::{AttachmentCoordinator, CoordinatorOptions, RequestContext};
pub use errors::{DomainError, Result};
pub use guard::StateGuard;
pub use logging::init_logging;
pub use registry::{AttachmentRecord, AttachmentRegistry, AttachmentSummary, AttachmentTable};
pub use types::{
    AttachmentRequest, Instance, InstanceId, Operation, VmState, VolumeId, VolumeRef,
};
pub use version::ApiVersion;
