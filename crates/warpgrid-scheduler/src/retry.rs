//! Retry ledger — records placement attempts on the request's filter
//! properties.
//!
//! Each scheduling request owns one [`FilterProperties`] that the placement
//! pipeline threads through every attempt. After an attempt picks a host,
//! [`populate_filter_properties`] appends the host/node pair to the retry
//! state so the next filter pass can skip it. Forced placement
//! (`force_hosts` / `force_nodes`) turns tracking off entirely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SchedulerError, SchedulerResult};
use crate::host_state::AsHostState;

/// A specific compute node within a host. Serializes as `["host", "node"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostNodePair(pub String, pub String);

impl HostNodePair {
    pub fn new(host: impl Into<String>, node: impl Into<String>) -> Self {
        Self(host.into(), node.into())
    }

    pub fn host(&self) -> &str {
        &self.0
    }

    pub fn node(&self) -> &str {
        &self.1
    }
}

/// Placement attempts made so far for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryState {
    /// Scheduling passes started, including the current one.
    #[serde(default)]
    pub num_attempts: u32,
    /// Host/node pairs already tried, first attempt first. Duplicates allowed.
    #[serde(default)]
    pub hosts: Vec<HostNodePair>,
    /// Description of the error that ended the previous attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exc: Option<String>,
}

impl RetryState {
    /// Whether `(host, node)` was already tried for this request.
    pub fn has_attempted(&self, host: &str, node: &str) -> bool {
        self.hosts.iter().any(|p| p.host() == host && p.node() == node)
    }
}

/// Request-scoped scheduling hints threaded through every placement attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterProperties {
    /// Limits of the host most recently considered for this request,
    /// exactly as the host descriptor carried them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Value>,
    /// Absent when the caller opted out of retry tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_nodes: Option<Vec<String>>,
    /// Free-form hints passed through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scheduler_hints: BTreeMap<String, Value>,
}

impl FilterProperties {
    /// Filter properties with retry tracking enabled and nothing tried yet.
    pub fn with_retry() -> Self {
        Self {
            retry: Some(RetryState::default()),
            ..Self::default()
        }
    }

    /// True when a non-empty `force_hosts` or `force_nodes` list is present.
    ///
    /// Present-but-empty lists do not count.
    pub fn is_forced(&self) -> bool {
        let non_empty = |list: &Option<Vec<String>>| list.as_ref().is_some_and(|l| !l.is_empty());
        non_empty(&self.force_hosts) || non_empty(&self.force_nodes)
    }

    /// Whether `(host, node)` was already tried. Always false without retry state.
    pub fn already_attempted(&self, host: &str, node: &str) -> bool {
        self.retry
            .as_ref()
            .is_some_and(|retry| retry.has_attempted(host, node))
    }
}

/// Record that `host` was chosen for the current placement attempt.
///
/// Always overwrites `limits` with the host's limits. Appends the host/node
/// pair to `retry.hosts` only when retry state is present and placement is
/// not forced; never creates retry state. On error `filter_properties` is
/// left untouched.
pub fn populate_filter_properties(
    filter_properties: &mut FilterProperties,
    host: &impl AsHostState,
) -> SchedulerResult<()> {
    let view = host.host_state()?;
    filter_properties.limits = Some(view.limits);

    if filter_properties.is_forced() {
        debug!(host = %view.host, node = %view.node, "forced placement, retry tracking skipped");
        return Ok(());
    }

    if let Some(retry) = filter_properties.retry.as_mut() {
        retry.hosts.push(HostNodePair(view.host, view.node));
        debug!(attempted = retry.hosts.len(), "placement attempt recorded");
    }
    Ok(())
}

/// Start a new scheduling pass for `instance_uuid`.
///
/// Creates retry state on the first pass and bumps `num_attempts`. Retry
/// tracking is disabled when `max_attempts == 1` or placement is forced.
/// Fails with [`SchedulerError::RetryAttemptsExceeded`] once the pass count
/// goes over `max_attempts`.
pub fn populate_retry(
    filter_properties: &mut FilterProperties,
    instance_uuid: &str,
    max_attempts: u32,
) -> SchedulerResult<()> {
    if max_attempts == 1 || filter_properties.is_forced() {
        return Ok(());
    }

    let retry = filter_properties.retry.get_or_insert_with(RetryState::default);
    retry.num_attempts += 1;

    if let Some(exc) = &retry.exc {
        // The previous attempt failed on a compute host; surface why.
        let last = retry.hosts.last();
        warn!(
            %instance_uuid,
            host = last.map(HostNodePair::host),
            node = last.map(HostNodePair::node),
            error = %exc,
            "error from last placement attempt"
        );
    }

    if retry.num_attempts > max_attempts {
        return Err(SchedulerError::RetryAttemptsExceeded {
            instance_uuid: instance_uuid.to_string(),
            max_attempts,
        });
    }
    Ok(())
}
