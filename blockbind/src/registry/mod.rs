//! Attachment registry: the authoritative device-mapping records.
//!
//! The coordinator treats the registry as a read-only view, queried fresh per
//! operation; durable mutation belongs to the backend collaborator. The
//! in-process [`AttachmentTable`] implements both sides for embedded use.

mod table;

pub use table::AttachmentTable;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{InstanceId, VolumeId};

/// One volume currently associated with one instance (block-device mapping).
///
/// `device_name` stays `None` until the hypervisor side assigns it; attach
/// acceptance is asynchronous by design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub instance_id: InstanceId,
    pub volume_id: VolumeId,
    pub device_name: Option<String>,
    pub is_root: bool,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRecord {
    pub fn new(
        instance_id: impl Into<InstanceId>,
        volume_id: impl Into<VolumeId>,
        device_name: Option<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            volume_id: volume_id.into(),
            device_name,
            is_root: false,
            created_at: Utc::now(),
        }
    }

    pub fn root(mut self) -> Self {
        self.is_root = true;
        self
    }
}

/// Public summary shape for listing attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSummary {
    #[serde(rename = "volumeId")]
    pub volume_id: VolumeId,
    #[serde(rename = "serverId")]
    pub instance_id: InstanceId,
    pub device: Option<String>,
}

impl From<&AttachmentRecord> for AttachmentSummary {
    fn from(record: &AttachmentRecord) -> Self {
        Self {
            volume_id: record.volume_id.clone(),
            instance_id: record.instance_id.clone(),
            device: record.device_name.clone(),
        }
    }
}

/// Read-only view of the current device-mapping records for an instance.
///
/// An empty list is valid and means "no volumes attached"; implementations
/// fail only on infrastructure faults, never on unknown instances (instance
/// resolution is the [`crate::backend::InstanceResolver`]'s job).
#[async_trait::async_trait]
pub trait AttachmentRegistry: Send + Sync {
    /// Current records for the instance, stable order for listing.
    async fn records_for(&self, instance_id: &InstanceId) -> Result<Vec<AttachmentRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_translation() {
        let record = AttachmentRecord::new("i1", "v1", Some("/dev/vdb".into()));
        let summary = AttachmentSummary::from(&record);
        assert_eq!(summary.volume_id.as_str(), "v1");
        assert_eq!(summary.instance_id.as_str(), "i1");
        assert_eq!(summary.device.as_deref(), Some("/dev/vdb"));
    }

    #[test]
    fn summary_wire_shape() {
        let record = AttachmentRecord::new("i1", "v1", Some("/dev/vdb".into()));
        let json = serde_json::to_value(AttachmentSummary::from(&record)).unwrap();
        assert_eq!(json["volumeId"], "v1");
        assert_eq!(json["serverId"], "i1");
        assert_eq!(json["device"], "/dev/vdb");
    }
}
