//! Request spec — what a scheduling request asked for.
//!
//! The scheduler only reads the instance identities out of it; everything
//! else (flavor, image, hints) is carried through opaquely so failure
//! notifications can echo the full request back to observers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchedulerError, SchedulerResult};

/// Properties of the instance(s) being scheduled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstanceProperties {
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_uuids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_properties: Option<InstanceProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_instances: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestSpec {
    /// Request spec naming its instances by UUID list.
    pub fn for_uuids<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instance_uuids: Some(uuids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// UUIDs of the instances this request covers, in request order.
    ///
    /// A non-empty `instance_uuids` wins; otherwise falls back to
    /// `instance_properties.uuid`.
    pub fn target_uuids(&self) -> SchedulerResult<Vec<String>> {
        if let Some(uuids) = self.instance_uuids.as_ref().filter(|u| !u.is_empty()) {
            return Ok(uuids.clone());
        }
        self.instance_properties
            .as_ref()
            .and_then(|props| props.uuid.clone())
            .map(|uuid| vec![uuid])
            .ok_or(SchedulerError::MissingInstanceIdentity)
    }
}

/// Build the request spec for one boot request covering `instances`.
///
/// The first instance supplies `instance_properties`; every instance with a
/// UUID contributes to `instance_uuids`.
pub fn build_request_spec(image: Option<Value>, instances: &[InstanceProperties]) -> RequestSpec {
    RequestSpec {
        instance_uuids: Some(instances.iter().filter_map(|i| i.uuid.clone()).collect()),
        instance_properties: instances.first().cloned(),
        image,
        num_instances: Some(instances.len()),
        extra: Map::new(),
    }
}
