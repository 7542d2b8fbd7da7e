//! Scheduler error types.

use thiserror::Error;
use warpgrid_state::StateError;

/// Errors that can occur while tracking placement attempts or reporting
/// a scheduling failure.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("unsupported host descriptor: {0}")]
    UnsupportedHostDescriptor(String),

    #[error("request spec carries neither instance_uuids nor instance_properties.uuid")]
    MissingInstanceIdentity,

    #[error("failed to update instance {uuid}: {source}")]
    StoreUpdate {
        uuid: String,
        #[source]
        source: StateError,
    },

    #[error("failed to deliver {event_type} notification: {reason}")]
    NotificationDelivery { event_type: String, reason: String },

    #[error("failed to record fault for instance {uuid}: {reason}")]
    FaultRecord { uuid: String, reason: String },

    #[error("exceeded max scheduling attempts {max_attempts} for instance {instance_uuid}")]
    RetryAttemptsExceeded {
        instance_uuid: String,
        max_attempts: u32,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
