//! ApplicationTemplate Custom Resource Definition
//!
//! An ApplicationTemplate is an ordered catalog of ObjectVersion references,
//! each carrying default variable values.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One object an ApplicationTemplate materializes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationObject {
    /// Name of the ObjectVersion in the same namespace
    pub template: String,

    /// Template-level variable values; Application values override these
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

/// Specification for an ApplicationTemplate
///
/// Objects are synthesized in list order.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "braid.james-parker.dev",
    version = "v1",
    kind = "ApplicationTemplate",
    plural = "applicationtemplates",
    shortname = "apptpl",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTemplateSpec {
    /// Objects to materialize, in order
    #[serde(default)]
    pub objects: Vec<ApplicationObject>,
}
