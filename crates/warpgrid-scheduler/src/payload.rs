//! Notification payloads emitted by the scheduler.

use serde::{Deserialize, Serialize};
use warpgrid_state::{InstanceRecord, TaskState, VmState};

use crate::fault::ExceptionInfo;
use crate::request_spec::{InstanceProperties, RequestSpec};

/// Event type of the state-change notification sent for every instance update.
pub const INSTANCE_UPDATE_EVENT: &str = "compute.instance.update";

/// Payload of the error notification sent when scheduling an instance fails.
///
/// `instance_properties` is always present and is `null` when the request
/// spec carried none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub request_spec: RequestSpec,
    pub instance_properties: Option<InstanceProperties>,
    pub instance_id: String,
    pub state: VmState,
    pub method: String,
    pub reason: ExceptionInfo,
}

pub fn build_failure_payload(
    request_spec: &RequestSpec,
    uuid: &str,
    state: VmState,
    method: &str,
    reason: &ExceptionInfo,
) -> FailurePayload {
    FailurePayload {
        request_spec: request_spec.clone(),
        instance_properties: request_spec.instance_properties.clone(),
        instance_id: uuid.to_string(),
        state,
        method: method.to_string(),
        reason: reason.clone(),
    }
}

/// `"<service>.<method>"`, verbatim.
pub fn event_type(service: &str, method: &str) -> String {
    format!("{service}.{method}")
}

/// Diff-style payload describing one instance state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceUpdatePayload {
    pub instance_id: String,
    pub old_state: VmState,
    pub state: VmState,
    pub old_task_state: Option<TaskState>,
    pub new_task_state: Option<TaskState>,
    pub host: Option<String>,
    pub node: Option<String>,
    pub updated_at: u64,
}

impl InstanceUpdatePayload {
    pub fn from_records(old: &InstanceRecord, new: &InstanceRecord) -> Self {
        Self {
            instance_id: new.uuid.clone(),
            old_state: old.vm_state,
            state: new.vm_state,
            old_task_state: old.task_state,
            new_task_state: new.task_state,
            host: new.host.clone(),
            node: new.node.clone(),
            updated_at: new.updated_at,
        }
    }
}
