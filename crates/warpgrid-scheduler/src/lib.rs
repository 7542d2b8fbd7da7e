//! warpgrid-scheduler — retry ledger and failure notification for placement.
//!
//! Two jobs, both driven by the placement pipeline:
//!
//! - After each placement attempt, record the chosen host/node pair on the
//!   request's [`FilterProperties`] so the next filter pass can skip it
//!   ([`populate_filter_properties`]).
//! - When every attempt is exhausted, mark the request's instances as failed,
//!   persist a fault and notify observers ([`FailureReporter`]).
//!
//! # Architecture
//!
//! ```text
//! placement pipeline
//!   ├── retry::populate_filter_properties  (per attempt, &mut FilterProperties)
//!   └── FailureReporter                    (once, on exhaustion)
//!       ├── InstanceStore   (warpgrid-state, atomic update_and_get_original)
//!       ├── FaultRecorder   (instance fault rows)
//!       └── Notifier        (state-change + ERROR "<service>.<method>" events)
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod failure;
pub mod fault;
pub mod host_state;
pub mod notifier;
pub mod payload;
pub mod request_spec;
pub mod retry;
pub mod store;

pub use config::SchedulerConfig;
pub use context::RequestContext;
pub use error::{SchedulerError, SchedulerResult};
pub use failure::{FailureReport, FailureReporter, FailureStep};
pub use fault::{ExceptionInfo, FaultRecorder, StoreFaultRecorder};
pub use host_state::{AsHostState, HostState, HostStateView, Limits};
pub use notifier::{LogNotifier, NoopNotifier, Notifier, Priority};
pub use payload::{FailurePayload, build_failure_payload, event_type};
pub use request_spec::{InstanceProperties, RequestSpec, build_request_spec};
pub use retry::{FilterProperties, HostNodePair, RetryState, populate_filter_properties, populate_retry};
pub use store::InstanceStore;
