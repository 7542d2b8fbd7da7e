//! Domain types for the WarpGrid state store.
//!
//! These types represent the persisted state of scheduled instances and the
//! faults recorded against them. All types are serializable to/from JSON for
//! storage in redb tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for an instance (UUID string).
pub type InstanceUuid = String;

// ── Instance ──────────────────────────────────────────────────────

/// Coarse lifecycle state of an instance as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Building,
    Active,
    Stopped,
    Error,
    Deleted,
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmState::Building => "building",
            VmState::Active => "active",
            VmState::Stopped => "stopped",
            VmState::Error => "error",
            VmState::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// In-flight task an instance is undergoing, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Scheduling,
    Networking,
    BlockDeviceMapping,
    Spawning,
}

/// Persisted record of a single scheduled instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceRecord {
    pub uuid: InstanceUuid,
    /// Host the instance was last placed on, if any.
    pub host: Option<String>,
    /// Compute node within `host`, if any.
    pub node: Option<String>,
    pub vm_state: VmState,
    pub task_state: Option<TaskState>,
    /// Unix timestamp (seconds) when the record was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last update.
    pub updated_at: u64,
}

impl InstanceRecord {
    /// A freshly requested instance: building, waiting on the scheduler.
    pub fn pending(uuid: impl Into<String>, now: u64) -> Self {
        Self {
            uuid: uuid.into(),
            host: None,
            node: None,
            vm_state: VmState::Building,
            task_state: Some(TaskState::Scheduling),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field updates applied to an instance record in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceUpdates {
    pub vm_state: VmState,
    /// Replaces the current task state; `None` clears it.
    pub task_state: Option<TaskState>,
}

impl InstanceUpdates {
    /// The update the scheduler applies when it gives up on a request.
    pub fn failed() -> Self {
        Self {
            vm_state: VmState::Error,
            task_state: None,
        }
    }

    /// Apply these updates to `record`, stamping `updated_at`.
    pub fn apply(&self, record: &mut InstanceRecord, now: u64) {
        record.vm_state = self.vm_state;
        record.task_state = self.task_state;
        record.updated_at = now;
    }
}

// ── Fault ─────────────────────────────────────────────────────────

/// Persisted summary of the error that caused an instance to fail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceFault {
    pub instance_uuid: InstanceUuid,
    /// HTTP-style error code (500 when the error carries none).
    pub code: u16,
    /// Short message, at most [`InstanceFault::MAX_MESSAGE_LEN`] characters.
    pub message: String,
    /// Longer details (error chain, backtrace), if any.
    pub details: Option<String>,
    /// Host that recorded the fault.
    pub host: String,
    /// Unix timestamp (seconds) when the fault was recorded.
    pub created_at: u64,
}

impl InstanceFault {
    /// Column width of the fault message.
    pub const MAX_MESSAGE_LEN: usize = 255;

    /// Truncate `message` to [`Self::MAX_MESSAGE_LEN`] characters.
    pub fn truncate_message(message: &str) -> String {
        message.chars().take(Self::MAX_MESSAGE_LEN).collect()
    }
}

impl InstanceRecord {
    /// Build the key for the instances table.
    pub fn table_key(&self) -> &str {
        &self.uuid
    }
}

/// Build the composite key for the faults table.
///
/// `seq` is padded to the full width of `u32`, so keys of one instance sort
/// in insertion order.
pub fn fault_key(instance_uuid: &str, seq: u32) -> String {
    format!("{instance_uuid}:{seq:010}")
}

/// Instance UUID a fault key belongs to.
///
/// Splits on the last `:` since the UUID itself may contain colons.
pub fn fault_key_owner(key: &str) -> Option<&str> {
    key.rsplit_once(':').map(|(owner, _)| owner)
}
