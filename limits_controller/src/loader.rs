//! Reads the operator maintained limits document.
use limits_kube::{ARTIFACT_KIND, ClusterStore};
use limits_types::LimitsDocument;
use tracing::debug;

use crate::{Error, Result};

/// Fetch ConfigMap `name` and decode the limits document stored under `key`.
///
/// A blank document decodes to the empty [`LimitsDocument`].
pub async fn load_limits(store: &dyn ClusterStore, name: &str, key: &str) -> Result<LimitsDocument> {
    let artifact = store.get_artifact(name).await.map_err(|source| {
        Error::from_store(source, store.namespace(), || {
            format!("get {ARTIFACT_KIND} {name:?}")
        })
    })?;

    let text = artifact.data.get(key).ok_or_else(|| Error::KeyMissing {
        name: name.to_string(),
        key: key.to_string(),
    })?;

    let document = LimitsDocument::from_yaml(text).map_err(|source| Error::Decode {
        name: name.to_string(),
        key: key.to_string(),
        source,
    })?;

    debug!(%name, %key, version = ?artifact.version, "loaded limits config");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limits_kube::mock::{MockClusterStore, Operation};
    use limits_kube::{Artifact, StoreError};
    use pretty_assertions::assert_eq;

    fn store_with(key: &str, text: &str) -> MockClusterStore {
        MockClusterStore::new("monitoring")
            .with_artifact(Artifact::new("thanos-limits").with_data(key, text))
    }

    #[test_log::test(tokio::test)]
    async fn decodes_document() {
        let store = store_with(
            "config.yaml",
            r#"
write:
  global:
    max_concurrency: 30
    meta_monitoring_url: "http://prometheus:9090"
  default:
    head_series_limit: 1
"#,
        );

        let document = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap();
        assert_eq!(document.write.global.max_concurrency, Some(30));
        assert_eq!(
            document.write.global.meta_monitoring_url,
            "http://prometheus:9090"
        );
        assert_eq!(document.write.default.head_series_limit, Some(1));
    }

    #[test_log::test(tokio::test)]
    async fn custom_key() {
        let store = store_with("limits.yaml", "write: {}");
        let document = load_limits(&store, "thanos-limits", "limits.yaml")
            .await
            .unwrap();
        assert_eq!(document, LimitsDocument::default());
    }

    #[test_log::test(tokio::test)]
    async fn blank_document() {
        let store = store_with("config.yaml", "");
        let document = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap();
        assert_eq!(document, LimitsDocument::default());
    }

    #[test_log::test(tokio::test)]
    async fn missing_config_map() {
        let store = MockClusterStore::new("monitoring");
        let err = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"ConfigMap "thanos-limits" not found in namespace "monitoring""#
        );
    }

    #[test_log::test(tokio::test)]
    async fn missing_key() {
        let store = store_with("other.yaml", "write: {}");
        let err = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::KeyMissing { name, key } if name == "thanos-limits" && key == "config.yaml"),
            "{err}"
        );
    }

    #[test_log::test(tokio::test)]
    async fn malformed_document() {
        let store = store_with("config.yaml", "write: [1, 2, 3]");
        let err = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err}");
    }

    #[test_log::test(tokio::test)]
    async fn get_failure() {
        let store = store_with("config.yaml", "write: {}");
        store.fail_next(Operation::Get, StoreError::connectivity("connection reset"));
        let err = load_limits(&store, "thanos-limits", "config.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connectivity { .. }), "{err}");
    }
}
