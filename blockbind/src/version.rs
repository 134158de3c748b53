//! Caller capability versions for compatibility-gated behavior.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Declared caller API version, ordered lexicographically on (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    /// Oldest version this crate recognizes.
    pub const MIN: ApiVersion = ApiVersion::new(2, 1);

    /// First version that permits volume mutations on shelved instances.
    pub const SHELVED_VOLUME_OPS: ApiVersion = ApiVersion::new(2, 20);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        ApiVersion::SHELVED_VOLUME_OPS
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidInput(format!("invalid api version: {s}"));
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(ApiVersion {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}
