//! Application Custom Resource Definition
//!
//! An Application asks for one ApplicationTemplate to be materialized with
//! its own variable overrides. Every object it produces is named after it.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for an Application
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "braid.james-parker.dev",
    version = "v1",
    kind = "Application",
    plural = "applications",
    shortname = "app",
    namespaced,
    printcolumn = r#"{"name":"Template","type":"string","jsonPath":".spec.template"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Name of the ApplicationTemplate in the same namespace
    pub template: String,

    /// Instance-level variable values; these win over template defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}
