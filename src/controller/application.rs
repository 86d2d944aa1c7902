//! Application controller implementation
//!
//! One reconciliation pass walks the Application's template in order and
//! materializes each referenced ObjectVersion as a namespaced object named
//! after the Application. A pass that has to link the Application to its
//! template, or that creates an object, stops there and lets the next pass
//! pick up the rest.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{
    Api, ApiResource, DynamicObject, GroupVersionKind, Patch, PatchParams, PostParams,
};
use kube::runtime::controller::Action;
use kube::{Client, Resource, ResourceExt};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

#[cfg(test)]
use mockall::automock;

use crate::config::ControllerConfig;
use crate::crd::{Application, ApplicationTemplate, ObjectVersion};
use crate::kube_utils::resolve_api_resource;
use crate::merge::merge;
use crate::template::{render_document, resolve_variables, TemplateEngine};
use crate::Error;

/// Delay before the pass after a create picks up the remaining objects
const CREATED_REQUEUE: Duration = Duration::from_secs(1);

/// Store operations the Application controller needs
///
/// All lookups are namespaced. `Ok(None)` means the object does not exist;
/// any other failure is an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an Application
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Application>, Error>;

    /// Fetch an ApplicationTemplate
    async fn get_application_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ApplicationTemplate>, Error>;

    /// Fetch an ObjectVersion
    async fn get_object_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObjectVersion>, Error>;

    /// Replace the owner references of an Application
    ///
    /// Writes only metadata; the Application's spec is left untouched.
    async fn link_application(
        &self,
        application: &Application,
        owner_references: Vec<OwnerReference>,
    ) -> Result<(), Error>;

    /// Fetch a target object of an arbitrary kind
    async fn get_target(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, Error>;

    /// Create a target object
    async fn create_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error>;

    /// Server-side apply a target object, taking ownership of conflicting fields
    async fn apply_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error>;

    /// Full update of a target object, guarded by its resourceVersion
    async fn replace_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error>;
}

/// Real Kubernetes implementation of [`ObjectStore`]
pub struct KubeObjectStore {
    client: Client,
    field_manager: String,
}

impl KubeObjectStore {
    /// Create a new store using the given Kubernetes client
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    async fn dynamic_api(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
    ) -> Result<Api<DynamicObject>, Error> {
        let ar = resolve_api_resource(&self.client, gvk).await?;
        Ok(Api::namespaced_with(self.client.clone(), namespace, &ar))
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

fn target_identity(object: &DynamicObject) -> Result<(String, String), Error> {
    let namespace = object
        .namespace()
        .ok_or_else(|| Error::validation("target object has no namespace"))?;
    Ok((namespace, object.name_any()))
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Application>, Error> {
        let api: Api<Application> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_application_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ApplicationTemplate>, Error> {
        let api: Api<ApplicationTemplate> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_object_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObjectVersion>, Error> {
        let api: Api<ObjectVersion> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn link_application(
        &self,
        application: &Application,
        owner_references: Vec<OwnerReference>,
    ) -> Result<(), Error> {
        let namespace = application
            .namespace()
            .ok_or_else(|| Error::validation("Application has no namespace"))?;
        let api: Api<Application> = Api::namespaced(self.client.clone(), &namespace);

        let mut metadata = json!({ "ownerReferences": owner_references });
        if let Some(rv) = application.resource_version() {
            metadata["resourceVersion"] = json!(rv);
        }

        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };
        api.patch(
            &application.name_any(),
            &params,
            &Patch::Merge(&json!({ "metadata": metadata })),
        )
        .await?;
        Ok(())
    }

    async fn get_target(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, Error> {
        let api = self.dynamic_api(gvk, namespace).await?;
        Ok(api.get_opt(name).await?)
    }

    async fn create_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error> {
        let (namespace, _) = target_identity(object)?;
        let api = self.dynamic_api(gvk, &namespace).await?;
        api.create(&self.post_params(), object).await?;
        Ok(())
    }

    async fn apply_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error> {
        let (namespace, name) = target_identity(object)?;
        let api = self.dynamic_api(gvk, &namespace).await?;
        let params = PatchParams::apply(&self.field_manager).force();
        api.patch(&name, &params, &Patch::Apply(object)).await?;
        Ok(())
    }

    async fn replace_target(
        &self,
        gvk: &GroupVersionKind,
        object: &DynamicObject,
    ) -> Result<(), Error> {
        let (namespace, name) = target_identity(object)?;
        let api = self.dynamic_api(gvk, &namespace).await?;
        api.replace(&name, &self.post_params(), object).await?;
        Ok(())
    }
}

/// How an existing target object is brought up to date
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Server-side apply the freshly rendered spec
    #[default]
    Replace,
    /// Deep-merge the rendered spec over the live spec, then update
    Merge,
}

/// Whether an Application already references its template as an owner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnerLink {
    /// No owner reference to the current template
    Unlinked,
    /// Owner reference to the current template is present
    Linked,
}

/// Result of one reconciliation pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The Application no longer exists
    NotFound,
    /// The Application was linked to its template; nothing else happened
    Linked,
    /// A missing target object was created; the pass stopped after it
    Created {
        /// ObjectVersion the created object came from
        object: String,
    },
    /// Every target object existed and was updated
    Synced {
        /// Number of objects written
        objects: usize,
    },
}

fn is_template_owner(owner: &OwnerReference) -> bool {
    owner.kind == ApplicationTemplate::kind(&())
        && owner.api_version == ApplicationTemplate::api_version(&())
}

/// Determine whether `application` is owned by `template`.
///
/// An owner reference to a different ApplicationTemplate (by name or uid)
/// counts as unlinked.
pub fn owner_link(application: &Application, template: &ApplicationTemplate) -> OwnerLink {
    let template_uid = template.uid();
    let linked = application.owner_references().iter().any(|owner| {
        is_template_owner(owner)
            && owner.name == template.name_any()
            && Some(&owner.uid) == template_uid.as_ref()
    });

    if linked {
        OwnerLink::Linked
    } else {
        OwnerLink::Unlinked
    }
}

/// Owner references for `application` once it is linked to `template`.
///
/// References to other ApplicationTemplates are dropped; references to
/// anything else are kept.
pub fn linked_owner_references(
    application: &Application,
    template: &ApplicationTemplate,
) -> Result<Vec<OwnerReference>, Error> {
    let uid = template.uid().ok_or_else(|| {
        Error::validation(format!(
            "ApplicationTemplate {} has no uid",
            template.name_any()
        ))
    })?;

    let mut owners: Vec<OwnerReference> = application
        .owner_references()
        .iter()
        .filter(|owner| !is_template_owner(owner))
        .cloned()
        .collect();

    owners.push(OwnerReference {
        api_version: ApplicationTemplate::api_version(&()).to_string(),
        kind: ApplicationTemplate::kind(&()).to_string(),
        name: template.name_any(),
        uid,
        ..Default::default()
    });
    Ok(owners)
}

/// Build the desired target object for one rendered document.
///
/// The object carries the Application's name and namespace, empty labels
/// and annotations, and a single controller owner reference back to the
/// Application. The document becomes its `spec`.
pub fn synthesize_target(
    application: &Application,
    gvk: &GroupVersionKind,
    document: Value,
) -> Result<DynamicObject, Error> {
    let namespace = application
        .namespace()
        .ok_or_else(|| Error::validation("Application has no namespace"))?;
    let owner = application.controller_owner_ref(&()).ok_or_else(|| {
        Error::validation(format!("Application {} has no uid", application.name_any()))
    })?;

    let ar = ApiResource::from_gvk(gvk);
    let mut object = DynamicObject::new(&application.name_any(), &ar)
        .within(&namespace)
        .data(json!({ "spec": document }));
    object.metadata.labels = Some(BTreeMap::new());
    object.metadata.annotations = Some(BTreeMap::new());
    object.metadata.owner_references = Some(vec![owner]);
    Ok(object)
}

/// Overlay the rendered document onto the live object's spec.
fn merge_into_live(mut live: DynamicObject, document: &Value) -> DynamicObject {
    let base = live.data.get("spec").cloned().unwrap_or(Value::Null);
    let merged = merge(&base, document);
    match live.data.as_object_mut() {
        Some(fields) => {
            fields.insert("spec".to_string(), merged);
        }
        None => live.data = json!({ "spec": merged }),
    }
    live
}

/// Run one reconciliation pass for the Application `namespace/name`.
///
/// Objects are processed in template order and the first failure aborts the
/// pass. Creating an object also ends the pass.
pub async fn reconcile_application(
    store: &dyn ObjectStore,
    engine: &TemplateEngine,
    strategy: SyncStrategy,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, Error> {
    let Some(application) = store.get_application(namespace, name).await? else {
        debug!("application no longer exists");
        return Ok(ReconcileOutcome::NotFound);
    };

    let template_name = &application.spec.template;
    let template = store
        .get_application_template(namespace, template_name)
        .await?
        .ok_or_else(|| Error::dependency_missing("ApplicationTemplate", namespace, template_name))?;

    if owner_link(&application, &template) == OwnerLink::Unlinked {
        let owners = linked_owner_references(&application, &template)?;
        store.link_application(&application, owners).await?;
        info!(template = %template_name, "linked application to its template");
        return Ok(ReconcileOutcome::Linked);
    }

    let mut synced = 0;
    for entry in &template.spec.objects {
        let version = store
            .get_object_version(namespace, &entry.template)
            .await?
            .ok_or_else(|| Error::dependency_missing("ObjectVersion", namespace, &entry.template))?;
        let gvk = version.spec.group_version_kind()?;

        let variables = resolve_variables(
            &version.spec.variables,
            &entry.variables,
            &application.spec.variables,
        );
        let undeclared = variables.undeclared(&version.spec.variables);
        if !undeclared.is_empty() {
            debug!(object = %entry.template, ?undeclared, "variables not declared by ObjectVersion");
        }

        let document = render_document(engine, &version.spec.spec, &variables)
            .map_err(|e| Error::template(&entry.template, e))?;

        match store.get_target(&gvk, namespace, name).await? {
            None => {
                let desired = synthesize_target(&application, &gvk, document)?;
                store.create_target(&gvk, &desired).await?;
                info!(kind = %gvk.kind, object = %entry.template, "created target object");
                return Ok(ReconcileOutcome::Created {
                    object: entry.template.clone(),
                });
            }
            Some(live) => match strategy {
                SyncStrategy::Replace => {
                    let desired = synthesize_target(&application, &gvk, document)?;
                    store.apply_target(&gvk, &desired).await?;
                    debug!(kind = %gvk.kind, object = %entry.template, "applied target object");
                }
                SyncStrategy::Merge => {
                    let merged = merge_into_live(live, &document);
                    store.replace_target(&gvk, &merged).await?;
                    debug!(kind = %gvk.kind, object = %entry.template, "merged target object");
                }
            },
        }
        synced += 1;
    }

    Ok(ReconcileOutcome::Synced { objects: synced })
}

/// Controller context for the Application controller
pub struct Context {
    /// Store used to read and write resources
    pub store: Arc<dyn ObjectStore>,
    /// Engine used to render ObjectVersion bodies
    pub engine: TemplateEngine,
    /// Update strategy for existing target objects
    pub strategy: SyncStrategy,
    /// Requeue delay after a converged pass
    pub resync_interval: Duration,
    /// Requeue delay after a failed pass
    pub error_requeue: Duration,
}

impl Context {
    /// Create a context over the given store
    pub fn new(store: Arc<dyn ObjectStore>, config: &ControllerConfig) -> Self {
        Self {
            store,
            engine: TemplateEngine::new(),
            strategy: config.strategy,
            resync_interval: config.resync_interval(),
            error_requeue: config.error_requeue(),
        }
    }

    /// Create a context backed by the Kubernetes API
    pub fn from_client(client: Client, config: &ControllerConfig) -> Self {
        let store = KubeObjectStore::new(client, config.field_manager.clone());
        Self::new(Arc::new(store), config)
    }

    /// Create a context for testing with the default configuration
    #[cfg(test)]
    pub fn for_testing(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(store, &ControllerConfig::default())
    }
}

/// Reconcile an Application
#[instrument(
    skip(application, ctx),
    fields(
        namespace = %application.namespace().unwrap_or_default(),
        application = %application.name_any()
    )
)]
pub async fn reconcile(application: Arc<Application>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = application.name_any();
    let namespace = application
        .namespace()
        .ok_or_else(|| Error::validation("Application must be namespaced"))?;

    let outcome = reconcile_application(
        ctx.store.as_ref(),
        &ctx.engine,
        ctx.strategy,
        &namespace,
        &name,
    )
    .await?;

    Ok(match outcome {
        ReconcileOutcome::NotFound | ReconcileOutcome::Linked => Action::await_change(),
        ReconcileOutcome::Created { .. } => Action::requeue(CREATED_REQUEUE),
        ReconcileOutcome::Synced { objects } => {
            debug!(objects, "application in sync");
            Action::requeue(ctx.resync_interval)
        }
    })
}

/// Error policy for the Application controller
pub fn error_policy(application: Arc<Application>, error: &Error, ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        kind = error.kind(),
        retryable = error.is_retryable(),
        namespace = %application.namespace().unwrap_or_default(),
        application = %application.name_any(),
        "application reconciliation failed"
    );
    Action::requeue(ctx.error_requeue)
}
