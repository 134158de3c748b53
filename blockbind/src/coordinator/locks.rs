//! Per-instance serialization for mutating operations.
//!
//! The state guard's lock check is a point-in-time read, so two concurrent
//! mutations against the same instance would otherwise race between guard and
//! attempt. Each mutation holds the instance's keyed mutex for the duration
//! of guard + attempt; different instances never contend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::InstanceId;

/// Map of per-instance async mutexes, created on first use.
///
/// Entries are never evicted; the guard slot is a `()` and instances number
/// in the thousands at most for a single embedding process.
#[derive(Default)]
pub(crate) struct InstanceLocks {
    inner: Mutex<HashMap<InstanceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl InstanceLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle to the mutex for `instance_id`. Lock it with `.lock().await`
    /// and hold the guard across guard + attempt.
    pub(crate) fn for_instance(&self, instance_id: &InstanceId) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock();
        Arc::clone(
            map.entry(instance_id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}
