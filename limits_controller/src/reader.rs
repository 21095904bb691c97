//! Counts the ready receivers.
use limits_kube::{ClusterStore, WORKLOAD_GROUP_KIND};
use tracing::debug;

use crate::{Error, Result};

/// Sum of the ready replicas of every StatefulSet matching `label_selector`.
///
/// Declared replicas are ignored. A failed listing is an error, never a count of zero, so a
/// cycle cannot publish a zero limit because the API server was unreachable.
pub async fn ready_replicas(store: &dyn ClusterStore, label_selector: &str) -> Result<u64> {
    let groups = store
        .list_workload_groups(label_selector)
        .await
        .map_err(|source| {
            Error::from_store(source, store.namespace(), || {
                format!("list {WORKLOAD_GROUP_KIND}s matching {label_selector:?}")
            })
        })?;

    let mut total: u64 = 0;
    for group in &groups {
        debug!(
            name = %group.name,
            replicas = group.replicas,
            ready_replicas = group.ready_replicas,
            "found receive StatefulSet"
        );
        // the API server never reports a negative count
        total += u64::try_from(group.ready_replicas).unwrap_or_default();
    }

    debug!(
        statefulsets = groups.len(),
        ready_replicas = total,
        "counted ready receive replicas"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limits_kube::StoreError;
    use limits_kube::mock::{MockClusterStore, Operation};

    const SELECTOR: &str = "controller.limits.thanos.io=thanos-limits-controller";
    const LABELS: [(&str, &str); 1] = [("controller.limits.thanos.io", "thanos-limits-controller")];

    #[test_log::test(tokio::test)]
    async fn sums_ready_replicas_only() {
        let store = MockClusterStore::new("monitoring")
            .with_workload_group(&LABELS, "receive-a", 5, 5)
            .with_workload_group(&LABELS, "receive-b", 3, 2)
            .with_workload_group(&LABELS, "receive-c", 4, 0);

        assert_eq!(ready_replicas(&store, SELECTOR).await.unwrap(), 7);
    }

    #[test_log::test(tokio::test)]
    async fn ignores_unselected_groups() {
        let store = MockClusterStore::new("monitoring")
            .with_workload_group(&LABELS, "receive", 3, 3)
            .with_workload_group(&[("app", "query")], "query", 10, 10);

        assert_eq!(ready_replicas(&store, SELECTOR).await.unwrap(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn nothing_selected_is_zero() {
        let store = MockClusterStore::new("monitoring");
        assert_eq!(ready_replicas(&store, SELECTOR).await.unwrap(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn list_failure_is_not_zero() {
        let store =
            MockClusterStore::new("monitoring").with_workload_group(&LABELS, "receive", 3, 3);
        store.fail_next(Operation::List, StoreError::connectivity("timeout"));

        let err = ready_replicas(&store, SELECTOR).await.unwrap_err();
        assert!(matches!(err, Error::Connectivity { .. }), "{err}");
        assert_eq!(
            err.to_string(),
            format!(
                "cannot list StatefulSets matching {SELECTOR:?} in namespace \"monitoring\": \
                 object store request failed: timeout"
            )
        );
    }
}
