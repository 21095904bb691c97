//! Discovery of the namespace the controller operates in.
use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

/// Namespace file mounted into every pod running with a service account.
pub const SERVICE_ACCOUNT_NAMESPACE_FILE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Namespace used when nothing else names one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Resolves the working namespace from, in order of precedence: an explicitly configured
/// value, the service account namespace file, the current kubeconfig context, and finally
/// [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    explicit: Option<String>,
    service_account_file: PathBuf,
    kubeconfig: Option<Kubeconfig>,
}

impl NamespaceResolver {
    /// Create a resolver reading the well-known service account file and the kubeconfig
    /// pointed to by `KUBECONFIG` (or `~/.kube/config`).
    pub fn new(explicit: Option<String>) -> Self {
        Self {
            explicit,
            service_account_file: PathBuf::from(SERVICE_ACCOUNT_NAMESPACE_FILE),
            kubeconfig: Kubeconfig::read().ok(),
        }
    }

    pub fn with_service_account_file(self, service_account_file: impl Into<PathBuf>) -> Self {
        Self {
            service_account_file: service_account_file.into(),
            ..self
        }
    }

    pub fn with_kubeconfig(self, kubeconfig: Option<Kubeconfig>) -> Self {
        Self { kubeconfig, ..self }
    }

    pub async fn resolve(&self) -> String {
        if let Some(namespace) = self.explicit.as_deref().and_then(non_empty) {
            debug!(%namespace, "using explicitly configured namespace");
            return namespace;
        }

        if let Ok(contents) = tokio::fs::read_to_string(&self.service_account_file).await {
            if let Some(namespace) = non_empty(&contents) {
                debug!(%namespace, "using service account namespace");
                return namespace;
            }
        }

        if let Some(kubeconfig) = &self.kubeconfig {
            match kube::Config::from_custom_kubeconfig(
                kubeconfig.clone(),
                &KubeConfigOptions::default(),
            )
            .await
            {
                Ok(config) => {
                    debug!(namespace = %config.default_namespace, "using kubeconfig namespace");
                    return config.default_namespace;
                }
                Err(error) => debug!(%error, "ignoring unusable kubeconfig"),
            }
        }

        DEFAULT_NAMESPACE.to_string()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
users:
- name: admin
  user:
    token: not-a-real-token
contexts:
- name: dev
  context:
    cluster: local
    user: admin
    namespace: receive
current-context: dev
"#;

    fn service_account_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn resolver(explicit: Option<&str>, file: &tempfile::NamedTempFile) -> NamespaceResolver {
        NamespaceResolver::new(explicit.map(String::from))
            .with_service_account_file(file.path())
            .with_kubeconfig(Some(Kubeconfig::from_yaml(KUBECONFIG).unwrap()))
    }

    #[test_log::test(tokio::test)]
    async fn explicit_wins() {
        let file = service_account_file("from-file\n");
        assert_eq!(resolver(Some("explicit"), &file).resolve().await, "explicit");
    }

    #[test_log::test(tokio::test)]
    async fn blank_explicit_is_ignored() {
        let file = service_account_file("from-file\n");
        assert_eq!(resolver(Some("  "), &file).resolve().await, "from-file");
    }

    #[test_log::test(tokio::test)]
    async fn service_account_before_kubeconfig() {
        let file = service_account_file("from-file\n");
        assert_eq!(resolver(None, &file).resolve().await, "from-file");
    }

    #[test_log::test(tokio::test)]
    async fn kubeconfig_context() {
        let file = service_account_file("");
        assert_eq!(resolver(None, &file).resolve().await, "receive");
    }

    #[test_log::test(tokio::test)]
    async fn falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = NamespaceResolver::new(None)
            .with_service_account_file(dir.path().join("missing"))
            .with_kubeconfig(None);
        assert_eq!(resolver.resolve().await, DEFAULT_NAMESPACE);
    }
}
