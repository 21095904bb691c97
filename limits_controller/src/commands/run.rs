//! Implementation of the reconciliation command
use std::sync::Arc;

use limits_clap_blocks::controller::ControllerConfig;
use limits_controller::{
    CONTROLLER_NAME, Controller, ReconcileConfig,
    scheduler::{Scheduler, wait_for_signal},
};
use limits_kube::{KubeStore, namespace::NamespaceResolver};
use limits_logging::LoggingConfig;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("Kubernetes client error: {0}")]
    Kube(#[from] limits_kube::Error),

    #[error(transparent)]
    Reconcile(#[from] limits_controller::Error),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    /// logging options
    #[clap(flatten)]
    pub(crate) logging_config: LoggingConfig,

    /// reconciliation options
    #[clap(flatten)]
    pub(crate) controller_config: ControllerConfig,
}

pub(crate) async fn command(config: Config) -> Result<()> {
    let Config {
        controller_config, ..
    } = config;

    let namespace = NamespaceResolver::new(controller_config.namespace.clone())
        .resolve()
        .await;
    let store = KubeStore::try_default(namespace.clone(), CONTROLLER_NAME).await?;

    let reconcile_config = ReconcileConfig::from(&controller_config);
    info!(
        %namespace,
        source = %reconcile_config.source_name,
        generated = %reconcile_config.generated_name,
        key = %reconcile_config.key,
        label_selector = %reconcile_config.label_selector,
        active_series_max = reconcile_config.active_series_max,
        "starting thanos limits controller"
    );

    let controller = Controller::new(Arc::new(store), reconcile_config);
    let controller = &controller;
    Scheduler::new(controller_config.reconcile_interval())
        .run(
            move || async move { controller.run_cycle().await.map(drop) },
            wait_for_signal(),
        )
        .await?;

    Ok(())
}
