//! ObjectVersion Custom Resource Definition
//!
//! An ObjectVersion is one versioned template body plus the API version and
//! kind of the object it renders into.

use kube::api::GroupVersionKind;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::kube_utils::parse_group_version;

/// Specification for an ObjectVersion
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "braid.james-parker.dev",
    version = "v1",
    kind = "ObjectVersion",
    plural = "objectversions",
    shortname = "ov",
    namespaced,
    printcolumn = r#"{"name":"APIVersion","type":"string","jsonPath":".spec.apiVersion"}"#,
    printcolumn = r#"{"name":"Kind","type":"string","jsonPath":".spec.kind"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectVersionSpec {
    /// API version of the rendered object (e.g. `apps/v1`, `v1`)
    pub api_version: String,

    /// Kind of the rendered object (e.g. `Deployment`)
    pub kind: String,

    /// Template body; renders to the `spec` of the target object
    #[serde(default)]
    pub spec: String,

    /// Variable names the body expects. Informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
}

impl ObjectVersionSpec {
    /// Group, version and kind of the object this template renders into
    pub fn group_version_kind(&self) -> Result<GroupVersionKind, crate::Error> {
        let (group, version) = parse_group_version(&self.api_version)?;
        if self.kind.is_empty() {
            return Err(crate::Error::validation("ObjectVersion kind must not be empty"));
        }
        Ok(GroupVersionKind::gvk(&group, &version, &self.kind))
    }
}
