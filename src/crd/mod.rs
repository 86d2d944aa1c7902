//! Custom Resource Definitions for braid
//!
//! - [`Application`] - a requested instance of a template
//! - [`ApplicationTemplate`] - an ordered list of object references
//! - [`ObjectVersion`] - a versioned template body for one object kind

mod application;
mod application_template;
mod object_version;

pub use application::{Application, ApplicationSpec};
pub use application_template::{ApplicationObject, ApplicationTemplate, ApplicationTemplateSpec};
pub use object_version::{ObjectVersion, ObjectVersionSpec};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// All CRDs served by braid, in install order
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        ObjectVersion::crd(),
        ApplicationTemplate::crd(),
        Application::crd(),
    ]
}
