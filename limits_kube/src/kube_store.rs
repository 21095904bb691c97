use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::{
    ARTIFACT_KIND, Artifact, ClusterStore, Error, StoreError, WORKLOAD_GROUP_KIND, WorkloadGroup,
};

/// [`ClusterStore`] backed by the Kubernetes API server.
#[derive(Debug, Clone)]
pub struct KubeStore {
    namespace: String,
    field_manager: String,
    config_map_api: Api<ConfigMap>,
    stateful_set_api: Api<StatefulSet>,
}

impl KubeStore {
    /// Create a store issuing requests in `namespace` through `client`. Writes are
    /// attributed to `field_manager`.
    pub fn new(client: Client, namespace: impl Into<String>, field_manager: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            config_map_api: Api::namespaced(client.clone(), &namespace),
            stateful_set_api: Api::namespaced(client, &namespace),
            field_manager: field_manager.into(),
            namespace,
        }
    }

    /// Create a store using the ambient client configuration: the in-cluster service
    /// account when running in a pod, the local kubeconfig otherwise.
    pub async fn try_default(
        namespace: impl Into<String> + Send,
        field_manager: impl Into<String> + Send,
    ) -> Result<Self, Error> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, namespace, field_manager))
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    fn config_map(&self, artifact: &Artifact) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(artifact.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: (!artifact.labels.is_empty()).then(|| artifact.labels.clone()),
                resource_version: artifact.version.clone(),
                ..Default::default()
            },
            data: Some(artifact.data.clone()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list_workload_groups(
        &self,
        label_selector: &str,
    ) -> Result<Vec<WorkloadGroup>, StoreError> {
        let stateful_sets = self
            .stateful_set_api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| store_error(WORKLOAD_GROUP_KIND, label_selector, e))?;
        debug!(
            namespace = %self.namespace,
            label_selector,
            count = stateful_sets.items.len(),
            "listed StatefulSets"
        );
        Ok(stateful_sets.items.iter().map(workload_group).collect())
    }

    async fn get_artifact(&self, name: &str) -> Result<Artifact, StoreError> {
        self.config_map_api
            .get(name)
            .await
            .map(artifact)
            .map_err(|e| store_error(ARTIFACT_KIND, name, e))
    }

    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        self.config_map_api
            .create(&self.post_params(), &self.config_map(artifact))
            .await
            .map(self::artifact)
            .map_err(|e| store_error(ARTIFACT_KIND, &artifact.name, e))
    }

    async fn update_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        self.config_map_api
            .replace(&artifact.name, &self.post_params(), &self.config_map(artifact))
            .await
            .map(self::artifact)
            .map_err(|e| store_error(ARTIFACT_KIND, &artifact.name, e))
    }
}

fn workload_group(stateful_set: &StatefulSet) -> WorkloadGroup {
    let status = stateful_set.status.as_ref();
    let replicas = stateful_set
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .or_else(|| status.map(|status| status.replicas))
        .unwrap_or_default();
    WorkloadGroup {
        name: stateful_set.name_any(),
        replicas,
        ready_replicas: status
            .and_then(|status| status.ready_replicas)
            .unwrap_or_default(),
    }
}

fn artifact(config_map: ConfigMap) -> Artifact {
    Artifact {
        name: config_map.name_any(),
        labels: config_map.metadata.labels.unwrap_or_default(),
        data: config_map.data.unwrap_or_default(),
        version: config_map.metadata.resource_version,
    }
}

/// Classify an API error by the status reason the server reported.
fn store_error(kind: &'static str, name: &str, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(response) if response.reason == "NotFound" || response.code == 404 => {
            StoreError::NotFound {
                kind,
                name: name.to_string(),
            }
        }
        kube::Error::Api(response) if response.reason == "AlreadyExists" => {
            StoreError::AlreadyExists {
                kind,
                name: name.to_string(),
            }
        }
        kube::Error::Api(response) if response.reason == "Conflict" => StoreError::Conflict {
            kind,
            name: name.to_string(),
            message: response.message,
        },
        error => StoreError::connectivity(error),
    }
}
