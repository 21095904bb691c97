//! Writes the reconciled document to the generated ConfigMap.
use limits_kube::{ARTIFACT_KIND, Artifact, ClusterStore, StoreError};
use limits_types::LimitsDocument;
use tracing::{debug, info};

use crate::{CONTROLLER_NAME, Error, MANAGED_BY_LABEL, Result};

/// How [`publish`] brought the generated ConfigMap up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The ConfigMap did not exist and was created.
    Created,
    /// The ConfigMap existed and its content was replaced.
    Updated,
}

/// Create ConfigMap `name` holding `document` under `key`, or replace its content when it
/// already exists.
///
/// Creation is attempted first. Only an "already exists" answer moves on to fetching the
/// current version and sending a single update carrying it. Any other failure, at any step,
/// is returned and nothing further is sent.
pub async fn publish(
    store: &dyn ClusterStore,
    name: &str,
    key: &str,
    document: &LimitsDocument,
) -> Result<PublishOutcome> {
    let namespace = store.namespace();
    let text = document.to_yaml().map_err(|source| Error::Encode {
        name: name.to_string(),
        source,
    })?;
    let desired = Artifact::new(name)
        .with_label(MANAGED_BY_LABEL, CONTROLLER_NAME)
        .with_data(key, text);

    match store.create_artifact(&desired).await {
        Ok(created) => {
            info!(%name, %namespace, version = ?created.version, "created ConfigMap");
            return Ok(PublishOutcome::Created);
        }
        Err(StoreError::AlreadyExists { .. }) => {
            debug!(%name, %namespace, "ConfigMap already exists, updating");
        }
        Err(source) => {
            return Err(Error::from_store(source, namespace, || {
                format!("create {ARTIFACT_KIND} {name:?}")
            }));
        }
    }

    let existing = store.get_artifact(name).await.map_err(|source| {
        Error::from_store(source, namespace, || {
            format!("get {ARTIFACT_KIND} {name:?} for update")
        })
    })?;

    // labels set by others survive, the data is replaced as a whole
    let mut labels = existing.labels;
    labels.extend(desired.labels);
    let replacement = Artifact {
        labels,
        version: existing.version,
        ..desired
    };

    let updated = store.update_artifact(&replacement).await.map_err(|source| {
        Error::from_store(source, namespace, || {
            format!("update {ARTIFACT_KIND} {name:?}")
        })
    })?;
    info!(%name, %namespace, version = ?updated.version, "updated ConfigMap");
    Ok(PublishOutcome::Updated)
}
