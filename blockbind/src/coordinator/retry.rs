//! Typed retry policy for the candidate-record scan.
//!
//! Detach and swap enumerate the attachment records matching a volume id and
//! attempt the backend call per candidate. A `VolumeUnattached` report means
//! "this record is not the live one" and the scan continues; everything else
//! stops the scan. Swap additionally stops on `InvalidVolume`, since the new
//! volume's validity does not depend on which old record is chosen.

use crate::backend::BackendError;
use crate::errors::DomainError;
use crate::types::Operation;

/// What to do with a backend failure raised for one candidate record.
#[derive(Debug)]
pub(crate) enum ScanDisposition {
    /// The record was superficially matching but not live; try the next one.
    Continue,
    /// Stop the scan and fail the operation.
    Fatal(DomainError),
}

/// Classify a backend failure raised mid-scan.
pub(crate) fn disposition(operation: Operation, err: BackendError) -> ScanDisposition {
    match err {
        BackendError::VolumeUnattached(volume) => {
            tracing::warn!(
                volume_id = %volume,
                "backend reports volume unattached during {operation}, continuing scan"
            );
            ScanDisposition::Continue
        }
        other => ScanDisposition::Fatal(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::OutcomeKind;

    #[test]
    fn unattached_continues() {
        for op in [Operation::Detach, Operation::Swap] {
            let d = disposition(op, BackendError::VolumeUnattached("v1".into()));
            assert!(matches!(d, ScanDisposition::Continue));
        }
    }

    #[test]
    fn invalid_volume_is_fatal_bad_request() {
        let d = disposition(Operation::Swap, BackendError::InvalidVolume("v9".into()));
        match d {
            ScanDisposition::Fatal(err) => {
                assert_eq!(OutcomeKind::of(&err), OutcomeKind::BadRequest)
            }
            ScanDisposition::Continue => panic!("expected fatal"),
        }
    }

    #[test]
    fn unknown_cell_is_fatal_not_found() {
        let d = disposition(
            Operation::Detach,
            BackendError::InstanceUnknownCell("i1".into()),
        );
        match d {
            ScanDisposition::Fatal(err) => {
                assert_eq!(OutcomeKind::of(&err), OutcomeKind::NotFound)
            }
            ScanDisposition::Continue => panic!("expected fatal"),
        }
    }

    #[test]
    fn locked_at_execution_is_fatal_conflict() {
        let d = disposition(
            Operation::Detach,
            BackendError::InstanceIsLocked("i1".into()),
        );
        match d {
            ScanDisposition::Fatal(err) => {
                assert_eq!(OutcomeKind::of(&err), OutcomeKind::Conflict)
            }
            ScanDisposition::Continue => panic!("expected fatal"),
        }
    }
}
