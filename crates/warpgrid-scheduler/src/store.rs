//! Instance store seam used when marking instances as failed.

use tracing::debug;
use warpgrid_state::{InstanceRecord, InstanceUpdates, StateResult, StateStore};

use crate::context::RequestContext;

/// Durable instance records.
pub trait InstanceStore: Send + Sync {
    /// Apply `updates` and return `(old, new)` from one atomic read-then-write.
    fn update_and_get_original(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        updates: &InstanceUpdates,
    ) -> StateResult<(InstanceRecord, InstanceRecord)>;
}

impl InstanceStore for StateStore {
    fn update_and_get_original(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        updates: &InstanceUpdates,
    ) -> StateResult<(InstanceRecord, InstanceRecord)> {
        debug!(request_id = %ctx.request_id, %uuid, "updating instance");
        StateStore::update_and_get_original(self, uuid, updates)
    }
}
