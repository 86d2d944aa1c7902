//! braid - a Kubernetes operator that materializes cluster objects from
//! layered, variable-parameterized templates
//!
//! An [`Application`](crd::Application) names an
//! [`ApplicationTemplate`](crd::ApplicationTemplate), which lists
//! [`ObjectVersion`](crd::ObjectVersion)s in order. Each ObjectVersion body is
//! rendered with the resolved variables, decoded into a document, and written
//! as an object named after the Application.
//!
//! # Modules
//!
//! - [`crd`] - Custom Resource Definitions
//! - [`template`] - Variable resolution and template rendering
//! - [`merge`] - Deep merge of decoded documents
//! - [`controller`] - Reconciliation logic
//! - [`controller_runner`] - Wiring controllers onto a Kubernetes client
//! - [`config`] - Command-line and environment configuration
//! - [`kube_utils`] - API version parsing and kind discovery
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod config;
pub mod controller;
pub mod controller_runner;
pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod merge;
pub mod template;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of every braid CRD
pub const API_GROUP: &str = "braid.james-parker.dev";

/// API version of every braid CRD
pub const API_VERSION: &str = "braid.james-parker.dev/v1";
