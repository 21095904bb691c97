//! Reconciles the Thanos receive head series limit with the number of ready receivers.
//!
//! Each cycle counts the ready replicas of the receive StatefulSets, multiplies that count
//! by the number of active series a single receiver can hold, writes the product into the
//! default tenant's `head_series_limit` of the operator maintained limits document, and
//! publishes the result as a generated ConfigMap.
use std::sync::Arc;

use limits_clap_blocks::controller::ControllerConfig;
use limits_kube::{ClusterStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

pub mod loader;
pub mod publisher;
pub mod reader;
pub mod reconciler;
pub mod scheduler;

pub use publisher::PublishOutcome;

/// Name the controller uses as field manager and in the managed-by label.
pub const CONTROLLER_NAME: &str = "thanos-limits-controller";

/// Label set on the generated ConfigMap.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot {action} in namespace {namespace:?}: {source}")]
    Connectivity {
        action: String,
        namespace: String,
        #[source]
        source: StoreError,
    },

    #[error("{kind} {name:?} not found in namespace {namespace:?}")]
    NotFound {
        kind: &'static str,
        name: String,
        namespace: String,
    },

    #[error("key {key:?} not found in ConfigMap {name:?}")]
    KeyMissing { name: String, key: String },

    #[error("failed to parse limits config {key:?} of ConfigMap {name:?}: {source}")]
    Decode {
        name: String,
        key: String,
        #[source]
        source: limits_types::Error,
    },

    #[error("failed to marshal limits config for ConfigMap {name:?}: {source}")]
    Encode {
        name: String,
        #[source]
        source: limits_types::Error,
    },

    #[error("{kind} {name:?} was modified concurrently: {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error(
        "head series limit overflows: {replicas} ready replicas x {active_series_max} active series"
    )]
    LimitOverflow { replicas: u64, active_series_max: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Attach the request context to a failed object store request.
    pub(crate) fn from_store(
        source: StoreError,
        namespace: &str,
        action: impl FnOnce() -> String,
    ) -> Self {
        match source {
            StoreError::NotFound { kind, name } => Self::NotFound {
                kind,
                name,
                namespace: namespace.to_string(),
            },
            StoreError::Conflict {
                kind,
                name,
                message,
            } => Self::Conflict {
                kind,
                name,
                message,
            },
            source => Self::Connectivity {
                action: action(),
                namespace: namespace.to_string(),
                source,
            },
        }
    }
}

/// What a reconciliation cycle reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Operator maintained ConfigMap holding the base limits document.
    pub source_name: String,
    /// ConfigMap the reconciled document is published to.
    pub generated_name: String,
    /// Key of the document in both ConfigMaps.
    pub key: String,
    /// Selects the receive StatefulSets.
    pub label_selector: String,
    /// Active series a single ready receiver can hold.
    pub active_series_max: u32,
}

impl From<&ControllerConfig> for ReconcileConfig {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            source_name: config.configmap_name.clone(),
            generated_name: config.configmap_generated_name.clone(),
            key: config.configmap_limits_path.clone(),
            label_selector: config.statefulset_label.clone(),
            active_series_max: config.active_series_max.get(),
        }
    }
}

/// Runs reconciliation cycles against a [`ClusterStore`].
#[derive(Debug)]
pub struct Controller {
    store: Arc<dyn ClusterStore>,
    config: ReconcileConfig,
}

impl Controller {
    pub fn new(store: Arc<dyn ClusterStore>, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    /// Perform one full cycle: count, load, reconcile, publish.
    ///
    /// Any error aborts the cycle. Nothing is retried apart from the publisher's single
    /// update after finding the generated ConfigMap already exists.
    pub async fn run_cycle(&self) -> Result<PublishOutcome> {
        let store = self.store.as_ref();
        let config = &self.config;

        let ready_replicas = reader::ready_replicas(store, &config.label_selector).await?;
        let base = loader::load_limits(store, &config.source_name, &config.key).await?;
        let document = reconciler::reconcile(ready_replicas, config.active_series_max, base)?;
        debug!(
            ready_replicas,
            active_series_max = config.active_series_max,
            head_series_limit = ?document.write.default.head_series_limit,
            "calculated global head_series_limit"
        );

        let outcome =
            publisher::publish(store, &config.generated_name, &config.key, &document).await?;
        info!(
            name = %config.generated_name,
            ?outcome,
            ready_replicas,
            "reconciliation cycle complete"
        );
        Ok(outcome)
    }
}
