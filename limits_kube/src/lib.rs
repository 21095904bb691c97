//! Access to the cluster object store.
//!
//! The controller only needs four operations from the Kubernetes API server: list the
//! receive StatefulSets matching a label selector, and get, create or update a ConfigMap.
//! [`ClusterStore`] captures exactly those, [`KubeStore`] implements them on top of a
//! [`kube::Client`] and [`mock::MockClusterStore`] implements them in memory for tests.
use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

mod kube_store;
pub mod mock;
pub mod namespace;

pub use kube_store::KubeStore;

/// Kind of the objects counted for ready replicas.
pub const WORKLOAD_GROUP_KIND: &str = "StatefulSet";

/// Kind of the objects holding limits documents.
pub const ARTIFACT_KIND: &str = "ConfigMap";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to build kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

/// Failure of a single object store request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("conflicting write to {kind} {name:?}: {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error("object store request failed: {source}")]
    Connectivity { source: BoxError },
}

impl StoreError {
    pub fn connectivity(source: impl Into<BoxError>) -> Self {
        Self::Connectivity {
            source: source.into(),
        }
    }
}

/// A replicated workload, i.e. a StatefulSet of receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadGroup {
    pub name: String,
    /// Declared number of replicas.
    pub replicas: i32,
    /// Replicas currently passing their readiness checks.
    pub ready_replicas: i32,
}

/// A named, versioned set of text values, i.e. a ConfigMap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
    /// Opaque token changing on every write. Must be echoed back on update.
    pub version: Option<String>,
}

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// The operations the controller performs against the cluster, scoped to one namespace.
#[async_trait]
pub trait ClusterStore: Debug + Send + Sync + 'static {
    /// Namespace every request is issued against.
    fn namespace(&self) -> &str;

    /// List the workload groups matching `label_selector`.
    async fn list_workload_groups(
        &self,
        label_selector: &str,
    ) -> Result<Vec<WorkloadGroup>, StoreError>;

    async fn get_artifact(&self, name: &str) -> Result<Artifact, StoreError>;

    /// Create a new artifact. Fails with [`StoreError::AlreadyExists`] if the name is taken.
    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError>;

    /// Replace an existing artifact. The artifact must carry the current version token.
    async fn update_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError>;
}
