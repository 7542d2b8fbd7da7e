//! End-to-end placement exhaustion.
//!
//! Drives the retry ledger through several placement attempts the way the
//! filter pipeline does, then reports the failure against a real state store
//! and checks what observers and the store end up with.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use warpgrid_scheduler::*;
use warpgrid_state::{InstanceRecord, InstanceUpdates, StateStore, VmState};

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(String, Priority, Value)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        _ctx: &RequestContext,
        _publisher_id: &str,
        event_type: &str,
        priority: Priority,
        payload: Value,
    ) -> SchedulerResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((event_type.to_string(), priority, payload));
        Ok(())
    }

    fn publisher_id(&self, service: &str) -> String {
        format!("{service}.test")
    }
}

fn candidates() -> Vec<Value> {
    vec![
        json!({"host": "host-a", "nodename": "node-a1", "limits": {"memory_mb": 1024}}),
        json!({"host": "host-b", "nodename": "node-b1", "limits": {"memory_mb": 2048}}),
        json!({"host": "host-c", "nodename": "node-c1", "limits": {"memory_mb": 4096}}),
    ]
}

#[test]
fn exhausted_request_is_marked_failed_and_reported() {
    let store = StateStore::open_in_memory().unwrap();
    store.put_instance(&InstanceRecord::pending("inst-1", 1000)).unwrap();

    let config = SchedulerConfig::from_toml_str("host = \"sched-1\"\nmax_attempts = 2").unwrap();
    let mut props = FilterProperties::default();
    let candidates = candidates();
    let mut attempts = candidates.iter();

    // Each pass: start the attempt, pick the first untried host, record it.
    let exhausted = loop {
        if let Err(e) = populate_retry(&mut props, "inst-1", config.max_attempts) {
            break e;
        }
        let chosen = attempts
            .by_ref()
            .map(|c| (c, c.host_state().unwrap()))
            .find(|(_, view)| !props.already_attempted(&view.host, &view.node))
            .map(|(c, _)| c)
            .unwrap();
        populate_filter_properties(&mut props, chosen).unwrap();
        props.retry.as_mut().unwrap().exc = Some("spawn failed".to_string());
    };

    assert!(matches!(
        exhausted,
        SchedulerError::RetryAttemptsExceeded { max_attempts: 2, .. }
    ));
    let retry = props.retry.clone().unwrap();
    assert_eq!(
        retry.hosts,
        vec![
            HostNodePair::new("host-a", "node-a1"),
            HostNodePair::new("host-b", "node-b1"),
        ]
    );
    assert_eq!(props.limits.as_ref().unwrap()["memory_mb"], json!(2048));

    let notifier = Arc::new(RecordingNotifier::default());
    let reporter = FailureReporter::with_state_store(store.clone(), &config.host, notifier.clone());
    let request_spec = RequestSpec {
        instance_properties: Some(InstanceProperties::with_uuid("inst-1")),
        ..RequestSpec::default()
    };

    let report = reporter
        .set_vm_state_and_notify(
            &RequestContext::new(),
            "compute",
            "run_instance",
            &InstanceUpdates::failed(),
            &ExceptionInfo::from_error(&exhausted),
            &request_spec,
        )
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.updated, vec!["inst-1"]);

    let record = store.get_instance("inst-1").unwrap().unwrap();
    assert_eq!(record.vm_state, VmState::Error);
    assert_eq!(record.task_state, None);

    let faults = store.list_faults_for_instance("inst-1").unwrap();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].code, 500);
    assert!(faults[0].message.contains("exceeded max scheduling attempts"));
    assert_eq!(faults[0].host, "sched-1");

    let events = notifier.events.lock().unwrap();
    let types: Vec<_> = events.iter().map(|(t, p, _)| (t.as_str(), *p)).collect();
    assert_eq!(
        types,
        vec![
            ("compute.instance.update", Priority::Info),
            ("compute.run_instance", Priority::Error),
        ]
    );
    let payload: FailurePayload = serde_json::from_value(events[1].2.clone()).unwrap();
    assert_eq!(payload.instance_id, "inst-1");
    assert_eq!(payload.state, VmState::Error);
    assert_eq!(payload.reason.kind, "SchedulerError");
    assert_eq!(payload.instance_properties, request_spec.instance_properties);
}

#[test]
fn forced_request_never_tracks_retries() {
    let mut props = FilterProperties {
        force_hosts: Some(vec!["host-a".to_string()]),
        ..FilterProperties::default()
    };

    for candidate in candidates() {
        populate_retry(&mut props, "inst-1", 3).unwrap();
        populate_filter_properties(&mut props, &candidate).unwrap();
    }

    assert!(props.retry.is_none());
    assert_eq!(props.limits.unwrap()["memory_mb"], json!(4096));
}

#[test]
fn filter_properties_survive_serialization_between_attempts() {
    let mut props = FilterProperties::with_retry();
    populate_filter_properties(&mut props, &HostState::new("h1", "n1", Limits::new())).unwrap();

    // Properties travel with the request between scheduler calls.
    let wire = serde_json::to_string(&props).unwrap();
    let mut props: FilterProperties = serde_json::from_str(&wire).unwrap();
    populate_filter_properties(&mut props, &HostState::new("h2", "n2", Limits::new())).unwrap();

    assert_eq!(
        props.retry.unwrap().hosts,
        vec![HostNodePair::new("h1", "n1"), HostNodePair::new("h2", "n2")]
    );
}
