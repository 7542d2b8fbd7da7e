//! Notification bus seam.
//!
//! The scheduler emits two kinds of events: a diff-style state-change event
//! per instance update (`send_update`) and generic structured events
//! (`notify`). Delivery semantics belong to the implementation; callers
//! treat every notification as best-effort.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use warpgrid_state::InstanceRecord;

use crate::context::RequestContext;
use crate::error::{SchedulerError, SchedulerResult};
use crate::payload::{INSTANCE_UPDATE_EVENT, InstanceUpdatePayload};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Debug => "DEBUG",
            Priority::Info => "INFO",
            Priority::Warn => "WARN",
            Priority::Error => "ERROR",
            Priority::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Outgoing notification transport.
pub trait Notifier: Send + Sync {
    /// Emit a structured event.
    fn notify(
        &self,
        ctx: &RequestContext,
        publisher_id: &str,
        event_type: &str,
        priority: Priority,
        payload: Value,
    ) -> SchedulerResult<()>;

    /// Stable publisher identity for `service`.
    fn publisher_id(&self, service: &str) -> String;

    /// Emit the state-change event for an instance update.
    ///
    /// Default: an INFO `compute.instance.update` event carrying the
    /// old/new state diff, published as `service`.
    fn send_update(
        &self,
        ctx: &RequestContext,
        old: &InstanceRecord,
        new: &InstanceRecord,
        service: &str,
    ) -> SchedulerResult<()> {
        let payload = serde_json::to_value(InstanceUpdatePayload::from_records(old, new))
            .map_err(|e| SchedulerError::NotificationDelivery {
                event_type: INSTANCE_UPDATE_EVENT.to_string(),
                reason: e.to_string(),
            })?;
        self.notify(
            ctx,
            &self.publisher_id(service),
            INSTANCE_UPDATE_EVENT,
            Priority::Info,
            payload,
        )
    }
}

/// Publishes notifications as tracing events on `warpgrid::notification`.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    host: String,
}

impl LogNotifier {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Notifier for LogNotifier {
    fn notify(
        &self,
        ctx: &RequestContext,
        publisher_id: &str,
        event_type: &str,
        priority: Priority,
        payload: Value,
    ) -> SchedulerResult<()> {
        let message_id = Uuid::new_v4();
        let request_id = ctx.request_id.as_str();
        match priority {
            Priority::Debug => {
                debug!(target: "warpgrid::notification", %message_id, %publisher_id, %event_type, %request_id, %payload, "notification")
            }
            Priority::Info => {
                info!(target: "warpgrid::notification", %message_id, %publisher_id, %event_type, %request_id, %payload, "notification")
            }
            Priority::Warn => {
                warn!(target: "warpgrid::notification", %message_id, %publisher_id, %event_type, %request_id, %payload, "notification")
            }
            Priority::Error | Priority::Critical => {
                error!(target: "warpgrid::notification", %message_id, %publisher_id, %event_type, %request_id, %priority, %payload, "notification")
            }
        }
        Ok(())
    }

    fn publisher_id(&self, service: &str) -> String {
        format!("{service}.{}", self.host)
    }
}

/// Drops every notification.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(
        &self,
        _ctx: &RequestContext,
        _publisher_id: &str,
        _event_type: &str,
        _priority: Priority,
        _payload: Value,
    ) -> SchedulerResult<()> {
        Ok(())
    }

    fn publisher_id(&self, service: &str) -> String {
        service.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use warpgrid_state::InstanceUpdates;

    #[derive(Default)]
    struct Captured {
        events: Mutex<Vec<(String, String, Priority, Value)>>,
    }

    impl Notifier for Captured {
        fn notify(
            &self,
            _ctx: &RequestContext,
            publisher_id: &str,
            event_type: &str,
            priority: Priority,
            payload: Value,
        ) -> SchedulerResult<()> {
            self.events.lock().unwrap().push((
                publisher_id.to_string(),
                event_type.to_string(),
                priority,
                payload,
            ));
            Ok(())
        }

        fn publisher_id(&self, service: &str) -> String {
            format!("{service}.test-host")
        }
    }

    #[test]
    fn default_send_update_emits_instance_update() {
        let notifier = Captured::default();
        let old = InstanceRecord::pending("uuid-1", 1000);
        let mut new = old.clone();
        InstanceUpdates::failed().apply(&mut new, 2000);

        notifier
            .send_update(&RequestContext::new(), &old, &new, "scheduler")
            .unwrap();

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let (publisher, event_type, priority, payload) = &events[0];
        assert_eq!(publisher, "scheduler.test-host");
        assert_eq!(event_type, INSTANCE_UPDATE_EVENT);
        assert_eq!(*priority, Priority::Info);
        assert_eq!(payload["old_state"], "building");
        assert_eq!(payload["state"], "error");
    }

    #[test]
    fn log_notifier_publisher_id_includes_host() {
        let notifier = LogNotifier::new("sched-1");
        assert_eq!(notifier.publisher_id("scheduler"), "scheduler.sched-1");
        assert!(
            notifier
                .notify(
                    &RequestContext::new(),
                    "scheduler.sched-1",
                    "compute.run_instance",
                    Priority::Error,
                    serde_json::json!({"instance_id": "1"}),
                )
                .is_ok()
        );
    }

    #[test]
    fn priority_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Priority::Error).unwrap(), "ERROR");
        assert_eq!(Priority::Critical.to_string(), "CRITICAL");
    }
}
