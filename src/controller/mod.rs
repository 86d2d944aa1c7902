//! Controllers for braid CRDs
//!
//! - [`application`] materializes Applications into target objects
//! - [`template`] tracks which Applications depend on an ApplicationTemplate

pub mod application;
pub mod template;

pub use application::{
    error_policy, linked_owner_references, owner_link, reconcile, reconcile_application,
    synthesize_target, Context, KubeObjectStore, ObjectStore, OwnerLink, ReconcileOutcome,
    SyncStrategy,
};
pub use template::{applications_for_template, reconcile_template, TemplateContext};
