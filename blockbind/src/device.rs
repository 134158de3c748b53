//! Block-device path hint validation.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{DomainError, Result};

/// Naming pattern for guest block-device paths (`/dev/vdb`, `/dev/xvda1`,
/// `/dev/sdc`, ...). Matches whole hints only.
const DEVICE_PATTERN: &str = r"^/dev/x?[a-z]?d?[a-z]+[0-9]*$";

fn device_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DEVICE_PATTERN).expect("device pattern is valid"))
}

/// Validate an optional caller-supplied device path hint.
///
/// `None` is always acceptable: the backend picks the device.
pub fn validate_device_hint(hint: Option<&str>) -> Result<()> {
    match hint {
        None => Ok(()),
        Some(path) if device_regex().is_match(path) => Ok(()),
        Some(path) => Err(DomainError::InvalidDevicePath(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_device_paths() {
        for path in ["/dev/vdb", "/dev/xvda", "/dev/sdc1", "/dev/vdaa", "/dev/hdb2"] {
            assert!(validate_device_hint(Some(path)).is_ok(), "{path}");
        }
    }

    #[test]
    fn accepts_missing_hint() {
        assert!(validate_device_hint(None).is_ok());
    }

    #[test]
    fn rejects_malformed_paths() {
        for path in ["vdb", "/dev/", "/dev/VDB", "/tmp/vdb", "/dev/vdb/extra", "/dev/1vdb"] {
            let err = validate_device_hint(Some(path)).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidDevicePath(_)),
                "{path}: {err}"
            );
        }
    }
}
