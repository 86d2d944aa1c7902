//! braid operator - materializes Applications from layered templates

use clap::Parser;
use futures::future::join_all;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use braid::config::ControllerConfig;
use braid::controller_runner::build_controllers;
use braid::crd::all_crds;

/// braid - Kubernetes operator for template-driven Applications
#[derive(Parser, Debug)]
#[command(name = "braid", version, about, long_about = None)]
struct Cli {
    /// Print CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Do not install or update CRDs on startup
    #[arg(long, env = "BRAID_SKIP_CRD_INSTALL")]
    skip_crd_install: bool,

    #[command(flatten)]
    controller: ControllerConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        for crd in all_crds() {
            let yaml = serde_yaml::to_string(&crd)
                .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
            println!("---\n{yaml}");
        }
        return Ok(());
    }

    run_controller(cli).await
}

/// Install or update every braid CRD with server-side apply
async fn ensure_crds_installed(client: &Client, field_manager: &str) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(field_manager).force();

    for crd in all_crds() {
        let name = crd.name_any();
        tracing::info!(crd = %name, "Installing CRD...");
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to install CRD {}: {}", name, e))?;
    }

    tracing::info!("All braid CRDs installed/updated");
    Ok(())
}

async fn run_controller(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("braid controller starting...");

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    if !cli.skip_crd_install {
        ensure_crds_installed(&client, &cli.controller.field_manager).await?;
    }

    tracing::info!("Starting controllers:");
    let controllers = build_controllers(client, &cli.controller);
    join_all(controllers).await;

    tracing::info!("braid controller shutting down");
    Ok(())
}
