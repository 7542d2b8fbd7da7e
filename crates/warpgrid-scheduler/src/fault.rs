//! Instance faults — persisting why scheduling gave up on an instance.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warpgrid_state::{InstanceFault, InstanceRecord, StateStore, epoch_secs};

use crate::context::RequestContext;
use crate::error::{SchedulerError, SchedulerResult};

/// Code recorded when the error carries none.
pub const DEFAULT_FAULT_CODE: u16 = 500;

/// Description of the error that ended a scheduling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Error type name, e.g. `NoValidHost`.
    pub kind: String,
    pub message: String,
    /// HTTP-style code; `None` means internal error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Error chain or backtrace text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ExceptionInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Capture an error value: its type name, message, and source chain.
    pub fn from_error<E: StdError>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let kind = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            kind: kind.to_string(),
            message: err.to_string(),
            code: None,
            details: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Persists failure detail against an instance.
pub trait FaultRecorder: Send + Sync {
    fn add_instance_fault_from_exc(
        &self,
        ctx: &RequestContext,
        instance: &InstanceRecord,
        exc: &ExceptionInfo,
    ) -> SchedulerResult<()>;
}

/// Build the fault row for `exc` against `instance_uuid`.
///
/// Details are kept only for internal (code 500) errors; user-facing
/// errors already say everything in their message.
pub fn fault_from_exc(instance_uuid: &str, exc: &ExceptionInfo, host: &str, now: u64) -> InstanceFault {
    let code = exc.code.unwrap_or(DEFAULT_FAULT_CODE);
    let message = if exc.message.is_empty() {
        exc.kind.as_str()
    } else {
        exc.message.as_str()
    };
    InstanceFault {
        instance_uuid: instance_uuid.to_string(),
        code,
        message: InstanceFault::truncate_message(message),
        details: if code == DEFAULT_FAULT_CODE {
            exc.details.clone()
        } else {
            None
        },
        host: host.to_string(),
        created_at: now,
    }
}

/// Records faults into the instance-faults table of a [`StateStore`].
#[derive(Clone)]
pub struct StoreFaultRecorder {
    store: StateStore,
    /// Scheduler host stamped on every fault.
    host: String,
}

impl StoreFaultRecorder {
    pub fn new(store: StateStore, host: impl Into<String>) -> Self {
        Self {
            store,
            host: host.into(),
        }
    }
}

impl FaultRecorder for StoreFaultRecorder {
    fn add_instance_fault_from_exc(
        &self,
        ctx: &RequestContext,
        instance: &InstanceRecord,
        exc: &ExceptionInfo,
    ) -> SchedulerResult<()> {
        let fault = fault_from_exc(&instance.uuid, exc, &self.host, epoch_secs());
        let key = self
            .store
            .add_fault(&fault)
            .map_err(|e| SchedulerError::FaultRecord {
                uuid: instance.uuid.clone(),
                reason: e.to_string(),
            })?;
        debug!(request_id = %ctx.request_id, %key, "fault recorded");
        Ok(())
    }
}
