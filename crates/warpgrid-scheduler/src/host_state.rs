//! Host state adapter — one view over candidate-host descriptors.
//!
//! Candidate hosts reach the scheduler either as a typed [`HostState`]
//! (from the in-process host manager) or as a JSON object (from RPC
//! payloads and cached filter results). Both resolve to a [`HostStateView`]
//! once, at the boundary, through [`AsHostState`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchedulerError, SchedulerResult};

/// Resource limits of a host: resource name → limit (`memory_mb`, `vcpu`, ...).
pub type Limits = BTreeMap<String, Value>;

/// Typed candidate-host descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostState {
    pub host: String,
    /// Compute node within `host`.
    pub nodename: String,
    #[serde(default)]
    pub limits: Limits,
}

impl HostState {
    pub fn new(host: impl Into<String>, nodename: impl Into<String>, limits: Limits) -> Self {
        Self {
            host: host.into(),
            nodename: nodename.into(),
            limits,
        }
    }
}

/// Normalized `{host, node, limits}` view of a candidate host.
///
/// `limits` is carried opaquely: filters downstream interpret it, the retry
/// ledger only copies it onto the request.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStateView {
    pub host: String,
    pub node: String,
    pub limits: Value,
}

/// Anything that can describe a candidate host.
pub trait AsHostState {
    /// Resolve to the normalized view, or fail with
    /// [`SchedulerError::UnsupportedHostDescriptor`].
    fn host_state(&self) -> SchedulerResult<HostStateView>;
}

impl AsHostState for HostState {
    fn host_state(&self) -> SchedulerResult<HostStateView> {
        Ok(HostStateView {
            host: self.host.clone(),
            node: self.nodename.clone(),
            limits: Value::Object(
                self.limits
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        })
    }
}

impl AsHostState for HostStateView {
    fn host_state(&self) -> SchedulerResult<HostStateView> {
        Ok(self.clone())
    }
}

/// Mapping shape: `{"host": .., "nodename": .., "limits": ..}`.
///
/// `node` is accepted as an alias for `nodename`. `limits` must be present
/// but may hold any value; it is copied as-is.
impl AsHostState for Map<String, Value> {
    fn host_state(&self) -> SchedulerResult<HostStateView> {
        let host = string_field(self, &["host"])?;
        let node = string_field(self, &["nodename", "node"])?;
        let limits = self.get("limits").cloned().ok_or_else(|| {
            SchedulerError::UnsupportedHostDescriptor("missing field limits".to_string())
        })?;
        Ok(HostStateView { host, node, limits })
    }
}

impl AsHostState for Value {
    fn host_state(&self) -> SchedulerResult<HostStateView> {
        match self {
            Value::Object(map) => map.host_state(),
            other => Err(SchedulerError::UnsupportedHostDescriptor(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

impl<T: AsHostState + ?Sized> AsHostState for &T {
    fn host_state(&self) -> SchedulerResult<HostStateView> {
        (**self).host_state()
    }
}

/// First of `names` present in `map`, required to be a string.
fn string_field(map: &Map<String, Value>, names: &[&str]) -> SchedulerResult<String> {
    for name in names {
        match map.get(*name) {
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(other) => {
                return Err(SchedulerError::UnsupportedHostDescriptor(format!(
                    "{name} must be a string, got {other}"
                )));
            }
            None => continue,
        }
    }
    Err(SchedulerError::UnsupportedHostDescriptor(format!(
        "missing field {}",
        names[0]
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_limits() -> Limits {
        let mut limits = Limits::new();
        limits.insert("memory_mb".to_string(), json!(2048.0));
        limits.insert("vcpu".to_string(), json!(8));
        limits
    }

    #[test]
    fn typed_and_mapping_shapes_resolve_identically() {
        let typed = HostState::new("host-a", "node-1", sample_limits());
        let mapping = json!({
            "host": "host-a",
            "nodename": "node-1",
            "limits": {"memory_mb": 2048.0, "vcpu": 8},
        });

        assert_eq!(typed.host_state().unwrap(), mapping.host_state().unwrap());
    }

    #[test]
    fn mapping_accepts_node_alias() {
        let mapping = json!({"host": "h", "node": "n", "limits": {}});
        let view = mapping.host_state().unwrap();
        assert_eq!(view.node, "n");
        assert_eq!(view.limits, json!({}));
    }

    #[test]
    fn mapping_missing_field_is_unsupported() {
        for descriptor in [
            json!({"nodename": "n", "limits": {}}),
            json!({"host": "h", "limits": {}}),
            json!({"host": "h", "nodename": "n"}),
        ] {
            let result = descriptor.host_state();
            assert!(
                matches!(result, Err(SchedulerError::UnsupportedHostDescriptor(_))),
                "{descriptor} should be rejected"
            );
        }
    }

    #[test]
    fn mapping_with_non_string_host_is_unsupported() {
        let bad_host = json!({"host": 7, "nodename": "n", "limits": {}});
        assert!(bad_host.host_state().is_err());
    }

    #[test]
    fn mapping_limits_are_copied_opaquely() {
        let mapping = json!({"host": "fake-host", "nodename": "fake-node", "limits": "fake-limits"});
        let view = mapping.host_state().unwrap();
        assert_eq!(view.limits, json!("fake-limits"));

        let null_limits = json!({"host": "h", "nodename": "n", "limits": null});
        assert_eq!(null_limits.host_state().unwrap().limits, Value::Null);
    }

    #[test]
    fn non_object_value_is_unsupported() {
        let result = json!(["host", "node"]).host_state();
        assert!(matches!(result, Err(SchedulerError::UnsupportedHostDescriptor(_))));
    }

    #[test]
    fn host_state_deserializes_from_mapping() {
        let typed: HostState =
            serde_json::from_value(json!({"host": "h", "nodename": "n"})).unwrap();
        assert!(typed.limits.is_empty());
    }
}
