//! Error classification into the stable outcome taxonomy.
//!
//! The classifier is the single point where domain failures become one of the
//! four caller-visible kinds (plus `Internal` for anything unexpected). It is
//! total over [`DomainError`]: no domain condition leaks past it unclassified.

use serde::Serialize;

use crate::errors::DomainError;

/// Caller-visible outcome kind for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Instance, volume, or attachment record absent.
    NotFound,
    /// Instance locked or in a state that forbids the operation.
    Conflict,
    /// Malformed device path, invalid volume, or invalid input.
    BadRequest,
    /// Root-volume detach attempt.
    Forbidden,
    /// Unexpected failure; surfaced, never silently absorbed.
    Internal,
}

impl OutcomeKind {
    /// Classify a domain failure. Deterministic and total.
    pub fn of(err: &DomainError) -> Self {
        match err {
            DomainError::InstanceNotFound(_)
            | DomainError::VolumeNotFound(_)
            | DomainError::AttachmentNotFound(_)
            | DomainError::NotAttached(_)
            | DomainError::SwapSourceNotAttached => OutcomeKind::NotFound,

            DomainError::InstanceIsLocked(_)
            | DomainError::InstanceInvalidState { .. }
            | DomainError::ShelvedVersionGate { .. } => OutcomeKind::Conflict,

            DomainError::InvalidDevicePath(_)
            | DomainError::InvalidVolume(_)
            | DomainError::InvalidInput(_) => OutcomeKind::BadRequest,

            DomainError::RootVolumeDetach => OutcomeKind::Forbidden,

            DomainError::Internal(_) => OutcomeKind::Internal,
        }
    }
}

/// Result of an operation as seen by a transport layer: either the success
/// payload or a `(kind, message)` failure.
///
/// Successes for attach/swap are explicitly partial - backend acceptance does
/// not guarantee the hypervisor-side operation has completed.
#[derive(Debug)]
pub enum ClassifiedOutcome<T> {
    Ok(T),
    Failed { kind: OutcomeKind, message: String },
}

impl<T> ClassifiedOutcome<T> {
    /// Outcome kind of a failure, `None` on success.
    pub fn kind(&self) -> Option<OutcomeKind> {
        match self {
            ClassifiedOutcome::Ok(_) => None,
            ClassifiedOutcome::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Turn an operation result into a classified outcome.
pub fn classify<T>(result: crate::errors::Result<T>) -> ClassifiedOutcome<T> {
    match result {
        Ok(value) => ClassifiedOutcome::Ok(value),
        Err(err) => ClassifiedOutcome::Failed {
            kind: OutcomeKind::of(&err),
            message: err.to_string(),
        },
    }
}
