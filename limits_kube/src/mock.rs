//! In-memory [`ClusterStore`] for tests.
use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    ARTIFACT_KIND, Artifact, ClusterStore, StoreError, WORKLOAD_GROUP_KIND, WorkloadGroup,
};

/// The store operations, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
}

/// A request received by the [`MockClusterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListWorkloadGroups { label_selector: String },
    GetArtifact { name: String },
    CreateArtifact { name: String },
    UpdateArtifact { name: String, version: Option<String> },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Self::ListWorkloadGroups { .. } => Operation::List,
            Self::GetArtifact { .. } => Operation::Get,
            Self::CreateArtifact { .. } => Operation::Create,
            Self::UpdateArtifact { .. } => Operation::Update,
        }
    }
}

/// A [`ClusterStore`] keeping its objects in memory.
///
/// Every request is recorded and can be inspected with [`MockClusterStore::calls`]. Failures
/// can be queued per [`Operation`] with [`MockClusterStore::fail_next`]; a queued failure is
/// returned, and consumed, instead of performing the operation. Artifacts get a new version
/// token on every write and updates carrying a stale token are rejected with
/// [`StoreError::Conflict`].
#[derive(Debug)]
pub struct MockClusterStore {
    namespace: String,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    workload_groups: Vec<(BTreeMap<String, String>, WorkloadGroup)>,
    artifacts: BTreeMap<String, Artifact>,
    last_version: u64,
    calls: Vec<Call>,
    failures: BTreeMap<Operation, VecDeque<StoreError>>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }

    fn injected_failure(&mut self, operation: Operation) -> Option<StoreError> {
        self.failures.get_mut(&operation)?.pop_front()
    }
}

impl MockClusterStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            state: Default::default(),
        }
    }

    /// Add a workload group carrying the given labels.
    pub fn with_workload_group(
        self,
        labels: &[(&str, &str)],
        name: &str,
        replicas: i32,
        ready_replicas: i32,
    ) -> Self {
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.state.lock().workload_groups.push((
            labels,
            WorkloadGroup {
                name: name.to_string(),
                replicas,
                ready_replicas,
            },
        ));
        self
    }

    /// Store an artifact as-is, assigning it a fresh version. Not recorded as a call.
    pub fn with_artifact(self, artifact: Artifact) -> Self {
        self.put_artifact(artifact);
        self
    }

    /// Store an artifact as-is, assigning it a fresh version. Not recorded as a call.
    pub fn put_artifact(&self, mut artifact: Artifact) -> Artifact {
        let mut state = self.state.lock();
        artifact.version = Some(state.next_version());
        state
            .artifacts
            .insert(artifact.name.clone(), artifact.clone());
        artifact
    }

    /// Remove an artifact. Not recorded as a call.
    pub fn remove_artifact(&self, name: &str) -> Option<Artifact> {
        self.state.lock().artifacts.remove(name)
    }

    /// Current content of an artifact.
    pub fn artifact(&self, name: &str) -> Option<Artifact> {
        self.state.lock().artifacts.get(name).cloned()
    }

    /// Fail the next request of `operation` with `error`.
    pub fn fail_next(&self, operation: Operation, error: StoreError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// All requests received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Number of requests of `operation` received so far.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }
}

#[async_trait]
impl ClusterStore for MockClusterStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list_workload_groups(
        &self,
        label_selector: &str,
    ) -> Result<Vec<WorkloadGroup>, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListWorkloadGroups {
            label_selector: label_selector.to_string(),
        });
        if let Some(error) = state.injected_failure(Operation::List) {
            return Err(error);
        }
        let selector = Selector::parse(label_selector).ok_or_else(|| {
            StoreError::connectivity(format!(
                "unable to parse {WORKLOAD_GROUP_KIND} selector {label_selector:?}"
            ))
        })?;
        Ok(state
            .workload_groups
            .iter()
            .filter(|(labels, _)| selector.matches(labels))
            .map(|(_, group)| group.clone())
            .collect())
    }

    async fn get_artifact(&self, name: &str) -> Result<Artifact, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call::GetArtifact {
            name: name.to_string(),
        });
        if let Some(error) = state.injected_failure(Operation::Get) {
            return Err(error);
        }
        state
            .artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn create_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateArtifact {
            name: artifact.name.clone(),
        });
        if let Some(error) = state.injected_failure(Operation::Create) {
            return Err(error);
        }
        if state.artifacts.contains_key(&artifact.name) {
            return Err(StoreError::AlreadyExists {
                kind: ARTIFACT_KIND,
                name: artifact.name.clone(),
            });
        }
        let created = Artifact {
            version: Some(state.next_version()),
            ..artifact.clone()
        };
        state
            .artifacts
            .insert(created.name.clone(), created.clone());
        Ok(created)
    }

    async fn update_artifact(&self, artifact: &Artifact) -> Result<Artifact, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(Call::UpdateArtifact {
            name: artifact.name.clone(),
            version: artifact.version.clone(),
        });
        if let Some(error) = state.injected_failure(Operation::Update) {
            return Err(error);
        }
        let current = state
            .artifacts
            .get(&artifact.name)
            .ok_or_else(|| not_found(&artifact.name))?;
        if current.version != artifact.version {
            return Err(StoreError::Conflict {
                kind: ARTIFACT_KIND,
                name: artifact.name.clone(),
                message: format!(
                    "version {:?} is stale, current version is {:?}",
                    artifact.version, current.version
                ),
            });
        }
        let updated = Artifact {
            version: Some(state.next_version()),
            ..artifact.clone()
        };
        state
            .artifacts
            .insert(updated.name.clone(), updated.clone());
        Ok(updated)
    }
}

fn not_found(name: &str) -> StoreError {
    StoreError::NotFound {
        kind: ARTIFACT_KIND,
        name: name.to_string(),
    }
}

/// Equality-based label selector: `key=value`, `key==value`, `key!=value`, `key` and `!key`
/// clauses separated by commas.
#[derive(Debug)]
struct Selector(Vec<Requirement>);

#[derive(Debug)]
enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    Exists(String),
    DoesNotExist(String),
}

impl Selector {
    fn parse(selector: &str) -> Option<Self> {
        selector
            .split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| {
                let requirement = if let Some((k, v)) = clause.split_once("!=") {
                    Requirement::NotEquals(k.trim().to_string(), v.trim().to_string())
                } else if let Some((k, v)) = clause.split_once("==") {
                    Requirement::Equals(k.trim().to_string(), v.trim().to_string())
                } else if let Some((k, v)) = clause.split_once('=') {
                    Requirement::Equals(k.trim().to_string(), v.trim().to_string())
                } else if let Some(k) = clause.strip_prefix('!') {
                    Requirement::DoesNotExist(k.trim().to_string())
                } else {
                    Requirement::Exists(clause.to_string())
                };
                match &requirement {
                    Requirement::Equals(k, _)
                    | Requirement::NotEquals(k, _)
                    | Requirement::Exists(k)
                    | Requirement::DoesNotExist(k)
                        if k.is_empty() =>
                    {
                        None
                    }
                    _ => Some(requirement),
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|requirement| match requirement {
            Requirement::Equals(k, v) => labels.get(k) == Some(v),
            Requirement::NotEquals(k, v) => labels.get(k) != Some(v),
            Requirement::Exists(k) => labels.contains_key(k),
            Requirement::DoesNotExist(k) => !labels.contains_key(k),
        })
    }
}
