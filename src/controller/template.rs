//! ApplicationTemplate controller implementation
//!
//! Templates own no objects of their own. The controller reports which
//! Applications depend on a template, and [`applications_for_template`]
//! lets the Application controller re-render those Applications whenever
//! the template changes.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::runtime::reflector::{ObjectRef, Store};
use kube::ResourceExt;
use tracing::{debug, error, info, instrument};

use crate::crd::{Application, ApplicationTemplate};
use crate::Error;

/// Controller context for the ApplicationTemplate controller
pub struct TemplateContext {
    /// Cached view of all watched Applications
    pub applications: Store<Application>,
    /// Requeue delay after a failed pass
    pub error_requeue: Duration,
}

impl TemplateContext {
    /// Create a context over an Application cache
    pub fn new(applications: Store<Application>, error_requeue: Duration) -> Self {
        Self {
            applications,
            error_requeue,
        }
    }
}

/// Applications in the template's namespace that name it as their template
pub fn dependent_applications(
    applications: &[Arc<Application>],
    template: &ApplicationTemplate,
) -> Vec<ObjectRef<Application>> {
    let namespace = template.namespace();
    let name = template.name_any();

    let mut dependents: Vec<ObjectRef<Application>> = applications
        .iter()
        .filter(|app| app.namespace() == namespace && app.spec.template == name)
        .map(|app| ObjectRef::from_obj(app.as_ref()))
        .collect();
    dependents.sort_by(|a, b| a.name.cmp(&b.name));
    dependents
}

/// Map a changed ApplicationTemplate to the Applications that use it
pub fn applications_for_template(
    applications: &Store<Application>,
    template: &ApplicationTemplate,
) -> Vec<ObjectRef<Application>> {
    let dependents = dependent_applications(&applications.state(), template);
    debug!(
        template = %template.name_any(),
        dependents = dependents.len(),
        "template changed, re-rendering dependent applications"
    );
    dependents
}

/// Reconcile an ApplicationTemplate
#[instrument(
    skip(template, ctx),
    fields(
        namespace = %template.namespace().unwrap_or_default(),
        template = %template.name_any()
    )
)]
pub async fn reconcile_template(
    template: Arc<ApplicationTemplate>,
    ctx: Arc<TemplateContext>,
) -> Result<Action, Error> {
    for owner in template.owner_references() {
        debug!(kind = %owner.kind, owner = %owner.name, "template owner");
    }

    let dependents = dependent_applications(&ctx.applications.state(), &template);
    for app in &dependents {
        info!(application = %app.name, "application uses template");
    }
    if dependents.is_empty() {
        debug!("no applications use template");
    }

    Ok(Action::await_change())
}

/// Error policy for the ApplicationTemplate controller
pub fn error_policy(
    template: Arc<ApplicationTemplate>,
    error: &Error,
    ctx: Arc<TemplateContext>,
) -> Action {
    error!(
        ?error,
        template = %template.name_any(),
        "template reconciliation failed"
    );
    Action::requeue(ctx.error_requeue)
}
