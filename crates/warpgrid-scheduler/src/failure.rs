//! Failure reporter — marks instances as failed once scheduling gives up.
//!
//! For every instance a failed request covers, the reporter:
//!
//! 1. applies the failure updates in the instance store (atomic read-then-write)
//! 2. emits the state-change notification for the old/new records
//! 3. records a fault describing the error
//! 4. emits an ERROR notification `<service>.<method>` with the failure payload
//!
//! Steps run in that order per instance, one instance at a time. A failed
//! step is recorded in the [`FailureReport`] and the batch carries on: a
//! store failure skips the remaining steps for that instance only, and a
//! notification or fault failure never undoes a committed update.

use std::sync::Arc;

use tracing::{info, warn};
use warpgrid_state::{InstanceRecord, InstanceUpdates, StateStore};

use crate::context::RequestContext;
use crate::error::{SchedulerError, SchedulerResult};
use crate::fault::{ExceptionInfo, FaultRecorder, StoreFaultRecorder};
use crate::notifier::{Notifier, Priority};
use crate::payload::{build_failure_payload, event_type};
use crate::request_spec::RequestSpec;
use crate::store::InstanceStore;

/// Which per-instance step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStep {
    StateUpdate,
    StateNotification,
    FaultRecord,
    ErrorNotification,
}

/// One step that failed for one instance.
#[derive(Debug)]
pub struct InstanceFailure {
    pub uuid: String,
    pub step: FailureStep,
    pub error: SchedulerError,
}

/// Outcome of one [`FailureReporter::set_vm_state_and_notify`] call.
#[derive(Debug, Default)]
pub struct FailureReport {
    /// Instances whose state update committed, in processing order.
    pub updated: Vec<String>,
    /// Steps that failed, in processing order.
    pub failures: Vec<InstanceFailure>,
}

impl FailureReport {
    /// True when every step succeeded for every instance.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_for<'a>(&'a self, uuid: &'a str) -> impl Iterator<Item = &'a InstanceFailure> {
        self.failures.iter().filter(move |f| f.uuid == uuid)
    }

    fn record(&mut self, uuid: &str, step: FailureStep, error: SchedulerError) {
        warn!(%uuid, ?step, error = %error, "failure report step failed");
        self.failures.push(InstanceFailure {
            uuid: uuid.to_string(),
            step,
            error,
        });
    }
}

/// Drives the failure protocol against the store, fault and notifier seams.
#[derive(Clone)]
pub struct FailureReporter {
    store: Arc<dyn InstanceStore>,
    faults: Arc<dyn FaultRecorder>,
    notifier: Arc<dyn Notifier>,
}

impl FailureReporter {
    pub fn new(
        store: Arc<dyn InstanceStore>,
        faults: Arc<dyn FaultRecorder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            faults,
            notifier,
        }
    }

    /// Reporter writing instances and faults to one [`StateStore`].
    pub fn with_state_store(
        store: StateStore,
        host: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let faults = StoreFaultRecorder::new(store.clone(), host);
        Self::new(Arc::new(store), Arc::new(faults), notifier)
    }

    /// Mark every instance of a failed request with `updates` and notify.
    ///
    /// Returns [`SchedulerError::MissingInstanceIdentity`] when the request
    /// spec names no instance. Per-instance failures do not fail the call;
    /// they are collected in the returned report.
    pub fn set_vm_state_and_notify(
        &self,
        ctx: &RequestContext,
        service: &str,
        method: &str,
        updates: &InstanceUpdates,
        exc: &ExceptionInfo,
        request_spec: &RequestSpec,
    ) -> SchedulerResult<FailureReport> {
        let uuids = request_spec.target_uuids()?;
        let event_type = event_type(service, method);
        let mut report = FailureReport::default();

        for uuid in &uuids {
            self.report_instance(
                ctx,
                service,
                method,
                &event_type,
                updates,
                exc,
                request_spec,
                uuid,
                &mut report,
            );
        }

        info!(
            request_id = %ctx.request_id,
            %event_type,
            instances = uuids.len(),
            updated = report.updated.len(),
            failed_steps = report.failures.len(),
            reason = %exc,
            "scheduling failure reported"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn report_instance(
        &self,
        ctx: &RequestContext,
        service: &str,
        method: &str,
        event_type: &str,
        updates: &InstanceUpdates,
        exc: &ExceptionInfo,
        request_spec: &RequestSpec,
        uuid: &str,
        report: &mut FailureReport,
    ) {
        let (old, new): (InstanceRecord, InstanceRecord) =
            match self.store.update_and_get_original(ctx, uuid, updates) {
                Ok(records) => records,
                Err(source) => {
                    let error = SchedulerError::StoreUpdate {
                        uuid: uuid.to_string(),
                        source,
                    };
                    report.record(uuid, FailureStep::StateUpdate, error);
                    return;
                }
            };
        report.updated.push(uuid.to_string());

        if let Err(e) = self.notifier.send_update(ctx, &old, &new, service) {
            report.record(uuid, FailureStep::StateNotification, e);
        }

        if let Err(e) = self.faults.add_instance_fault_from_exc(ctx, &new, exc) {
            report.record(uuid, FailureStep::FaultRecord, e);
        }

        let payload = build_failure_payload(request_spec, uuid, updates.vm_state, method, exc);
        let result = serde_json::to_value(&payload)
            .map_err(|e| SchedulerError::NotificationDelivery {
                event_type: event_type.to_string(),
                reason: e.to_string(),
            })
            .and_then(|payload| {
                let publisher_id = self.notifier.publisher_id(service);
                self.notifier
                    .notify(ctx, &publisher_id, event_type, Priority::Error, payload)
            });
        if let Err(e) = result {
            report.record(uuid, FailureStep::ErrorNotification, e);
        }
    }
}
