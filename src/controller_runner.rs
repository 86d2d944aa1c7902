//! Controller runner - builds the controller futures
//!
//! The Application controller owns the Application cache; the
//! ApplicationTemplate controller and the template watch both read from it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};

use crate::config::ControllerConfig;
use crate::controller::application::{error_policy, reconcile, Context};
use crate::controller::template::{
    applications_for_template, error_policy as template_error_policy, reconcile_template,
    TemplateContext,
};
use crate::crd::{Application, ApplicationTemplate};

/// A controller future ready to be awaited
pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = kube::core::NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Build the Application and ApplicationTemplate controller futures
pub fn build_controllers(client: Client, config: &ControllerConfig) -> Vec<ControllerFuture> {
    let namespace = config.namespace.as_deref();
    let watcher_config = || WatcherConfig::default().timeout(config.watch_timeout_secs);

    let applications: Api<Application> = scoped_api(client.clone(), namespace);
    let templates: Api<ApplicationTemplate> = scoped_api(client.clone(), namespace);

    let app_ctx = Arc::new(Context::from_client(client, config));

    let app_controller = Controller::new(applications, watcher_config());
    let application_cache = app_controller.store();
    let cache_for_watch = application_cache.clone();

    let app_ctrl = app_controller
        .watches(templates.clone(), watcher_config(), move |template| {
            applications_for_template(&cache_for_watch, &template)
        })
        .shutdown_on_signal()
        .run(reconcile, error_policy, app_ctx)
        .for_each(log_reconcile_result("Application"));

    let template_ctx = Arc::new(TemplateContext::new(
        application_cache,
        config.error_requeue(),
    ));
    let template_ctrl = Controller::new(templates, watcher_config())
        .shutdown_on_signal()
        .run(reconcile_template, template_error_policy, template_ctx)
        .for_each(log_reconcile_result("ApplicationTemplate"));

    match namespace {
        Some(ns) => tracing::info!(namespace = %ns, "watching a single namespace"),
        None => tracing::info!("watching all namespaces"),
    }
    tracing::info!(strategy = ?config.strategy, "- Application controller");
    tracing::info!("- ApplicationTemplate controller");

    vec![Box::pin(app_ctrl), Box::pin(template_ctrl)]
}

/// Create a logging closure for controller reconciliation results
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
