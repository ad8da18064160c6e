// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cluster for tests.
//!
//! Objects are stored as JSON keyed by (kind, namespace, name). Creating a
//! Job can materialize a pod for it, the way the Job controller would, so the
//! run path can be exercised end to end.

use super::{selector_matches, ClusterApi, ClusterError, ClusterObject, Propagation};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    Container, ContainerState, ContainerStateRunning, ContainerStateTerminated,
    ContainerStateWaiting, ContainerStatus, Pod, PodSpec, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use ttl_core::labels::JOB_NAME;

/// Cluster operation kinds, for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Create,
    Replace,
    Delete,
    List,
}

/// Recorded cluster call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCall {
    pub verb: Verb,
    pub kind: String,
    pub namespace: Option<String>,
    /// `None` for list calls
    pub name: Option<String>,
}

/// What the fake Job controller does when a Job is created.
#[derive(Debug, Clone)]
pub enum JobPods {
    /// No pod is ever scheduled.
    Never,
    /// A pod runs the Job's pod template.
    Run {
        /// Pod lists that come back empty before the pod shows up.
        hidden_polls: usize,
        /// Pod reads during which the containers still report running.
        running_polls: usize,
        /// Exit codes by container name; unlisted containers exit 0.
        exit_codes: HashMap<String, i32>,
    },
}

impl JobPods {
    /// Pod appears immediately and every container exits 0.
    pub fn succeed() -> Self {
        JobPods::Run { hidden_polls: 0, running_polls: 0, exit_codes: HashMap::new() }
    }

    /// Pod appears immediately with the given exit codes.
    pub fn exit_codes(codes: &[(&str, i32)]) -> Self {
        JobPods::Run {
            hidden_polls: 0,
            running_polls: 0,
            exit_codes: codes.iter().map(|(name, code)| (name.to_string(), *code)).collect(),
        }
    }
}

impl Default for JobPods {
    fn default() -> Self {
        JobPods::succeed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ObjectKey {
    kind: String,
    namespace: Option<String>,
    name: String,
}

impl ObjectKey {
    fn of<K: ClusterObject>(namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind: K::kind_name(),
            namespace: K::NAMESPACED.then(|| namespace.unwrap_or("default").to_string()),
            name: name.to_string(),
        }
    }

    fn pod(namespace: &str, name: &str) -> Self {
        Self::of::<Pod>(Some(namespace), name)
    }
}

struct PendingPod {
    pod: Pod,
    polls_left: usize,
}

struct RunningPod {
    polls_left: usize,
    exit_codes: HashMap<String, i32>,
}

struct FailRule {
    verb: Verb,
    kind: String,
    name: Option<String>,
}

#[derive(Default)]
struct FakeClusterState {
    objects: BTreeMap<ObjectKey, serde_json::Value>,
    calls: Vec<ClusterCall>,
    failures: Vec<FailRule>,
    job_pods: JobPods,
    pending_pods: Vec<PendingPod>,
    running_pods: HashMap<ObjectKey, RunningPod>,
    next_uid: u64,
}

fn encode<K: ClusterObject>(object: &K) -> Result<serde_json::Value, ClusterError> {
    serde_json::to_value(object).map_err(|e| ClusterError::Request(e.to_string()))
}

fn decode<K: ClusterObject>(value: &serde_json::Value) -> Result<K, ClusterError> {
    serde_json::from_value(value.clone()).map_err(|e| ClusterError::Request(e.to_string()))
}

impl FakeClusterState {
    fn record(&mut self, verb: Verb, kind: String, namespace: Option<&str>, name: Option<&str>) {
        self.calls.push(ClusterCall {
            verb,
            kind,
            namespace: namespace.map(String::from),
            name: name.map(String::from),
        });
    }

    fn check_failure(
        &self,
        verb: Verb,
        kind: &str,
        name: Option<&str>,
    ) -> Result<(), ClusterError> {
        let failed = self.failures.iter().any(|rule| {
            rule.verb == verb
                && rule.kind == kind
                && (rule.name.is_none() || rule.name.as_deref() == name)
        });
        if failed {
            return Err(ClusterError::Request(format!(
                "injected {:?} failure for {} {}",
                verb,
                kind,
                name.unwrap_or("*")
            )));
        }
        Ok(())
    }

    fn get<K: ClusterObject>(
        &mut self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<K, ClusterError> {
        let key = ObjectKey::of::<K>(namespace, name);
        self.record(Verb::Get, key.kind.clone(), key.namespace.as_deref(), Some(name));
        self.check_failure(Verb::Get, &key.kind, Some(name))?;
        if key.kind == "Pod" {
            self.advance_running_pod(&key)?;
        }
        match self.objects.get(&key) {
            Some(value) => decode(value),
            None => Err(ClusterError::NotFound { kind: key.kind, name: key.name }),
        }
    }

    fn create<K: ClusterObject>(&mut self, object: &K) -> Result<K, ClusterError> {
        let meta = object.meta();
        let name = meta.name.clone().unwrap_or_default();
        let key = ObjectKey::of::<K>(meta.namespace.as_deref(), &name);
        self.record(Verb::Create, key.kind.clone(), key.namespace.as_deref(), Some(&name));
        self.check_failure(Verb::Create, &key.kind, Some(&name))?;
        if self.objects.contains_key(&key) {
            return Err(ClusterError::AlreadyExists { kind: key.kind, name });
        }

        self.next_uid += 1;
        let mut created = object.clone();
        let meta = created.meta_mut();
        meta.uid = Some(format!("uid-{}", self.next_uid));
        meta.resource_version = Some("1".to_string());
        meta.namespace = key.namespace.clone();

        let value = encode(&created)?;
        if key.kind == "Job" {
            self.schedule_job_pod(decode::<Job>(&value)?);
        }
        self.objects.insert(key, value);
        Ok(created)
    }

    fn replace<K: ClusterObject>(&mut self, object: &K) -> Result<K, ClusterError> {
        let meta = object.meta();
        let name = meta.name.clone().unwrap_or_default();
        let key = ObjectKey::of::<K>(meta.namespace.as_deref(), &name);
        self.record(Verb::Replace, key.kind.clone(), key.namespace.as_deref(), Some(&name));
        self.check_failure(Verb::Replace, &key.kind, Some(&name))?;
        let Some(existing) = self.objects.get(&key) else {
            return Err(ClusterError::NotFound { kind: key.kind, name });
        };

        let existing: K = decode(existing)?;
        let version = existing
            .meta()
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let mut replaced = object.clone();
        let meta = replaced.meta_mut();
        meta.uid = existing.meta().uid.clone();
        meta.resource_version = Some((version + 1).to_string());
        meta.namespace = key.namespace.clone();

        self.objects.insert(key, encode(&replaced)?);
        Ok(replaced)
    }

    fn delete<K: ClusterObject>(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError> {
        let key = ObjectKey::of::<K>(namespace, name);
        self.record(Verb::Delete, key.kind.clone(), key.namespace.as_deref(), Some(name));
        self.check_failure(Verb::Delete, &key.kind, Some(name))?;
        if self.objects.remove(&key).is_none() {
            return Err(ClusterError::NotFound { kind: key.kind, name: key.name });
        }

        match key.kind.as_str() {
            // The API orphans a Job's pods unless propagation is requested
            "Job" if propagation == Propagation::Background => {
                let job_ns = key.namespace.clone();
                let owned_by_job = |pod: &Pod| {
                    pod.metadata.namespace == job_ns
                        && pod.metadata.labels.as_ref().and_then(|l| l.get(JOB_NAME))
                            == Some(&key.name)
                };
                self.objects.retain(|k, v| {
                    k.kind != "Pod" || !decode::<Pod>(v).is_ok_and(|pod| owned_by_job(&pod))
                });
                self.pending_pods.retain(|p| !owned_by_job(&p.pod));
            }
            "Namespace" => {
                let ns = Some(name.to_string());
                self.objects.retain(|k, _| k.namespace != ns);
            }
            _ => {}
        }
        Ok(())
    }

    fn list<K: ClusterObject>(
        &mut self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<K>, ClusterError> {
        let kind = K::kind_name();
        let namespace = namespace.filter(|_| K::NAMESPACED);
        self.record(Verb::List, kind.clone(), namespace, None);
        self.check_failure(Verb::List, &kind, None)?;
        if kind == "Pod" {
            self.surface_pending_pods()?;
        }

        let mut items = Vec::new();
        for (key, value) in &self.objects {
            if key.kind != kind {
                continue;
            }
            if namespace.is_some() && key.namespace.as_deref() != namespace {
                continue;
            }
            let object: K = decode(value)?;
            if selector.is_some_and(|s| !selector_matches(s, object.meta().labels.as_ref())) {
                continue;
            }
            items.push(object);
        }
        Ok(items)
    }

    /// Build the pod the Job controller would create for `job`.
    fn schedule_job_pod(&mut self, job: Job) {
        let JobPods::Run { hidden_polls, running_polls, exit_codes } = self.job_pods.clone() else {
            return;
        };
        let job_name = job.metadata.name.clone().unwrap_or_default();
        let namespace = job.metadata.namespace.clone().unwrap_or_default();
        let template = job.spec.map(|s| s.template).unwrap_or_default();
        let mut labels = template.metadata.and_then(|m| m.labels).unwrap_or_default();
        labels.insert(JOB_NAME.to_string(), job_name.clone());

        let spec = template.spec.unwrap_or_default();
        let status = pod_status(&spec, &exit_codes, running_polls > 0);
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(format!("{}-x7k2p", job_name)),
                namespace: Some(namespace),
                labels: Some(labels),
                ..Default::default()
            },
            spec: Some(spec),
            status: Some(status),
        };
        if running_polls > 0 {
            let key = ObjectKey::pod(
                pod.metadata.namespace.as_deref().unwrap_or_default(),
                pod.metadata.name.as_deref().unwrap_or_default(),
            );
            self.running_pods.insert(key, RunningPod { polls_left: running_polls, exit_codes });
        }
        self.pending_pods.push(PendingPod { pod, polls_left: hidden_polls });
    }

    /// Move pods whose hide counter ran out into the object store.
    fn surface_pending_pods(&mut self) -> Result<(), ClusterError> {
        let mut ready = Vec::new();
        for pending in std::mem::take(&mut self.pending_pods) {
            if pending.polls_left == 0 {
                ready.push(pending.pod);
            } else {
                let polls_left = pending.polls_left - 1;
                self.pending_pods.push(PendingPod { polls_left, ..pending });
            }
        }
        for pod in ready {
            let key = ObjectKey::pod(
                pod.metadata.namespace.as_deref().unwrap_or_default(),
                pod.metadata.name.as_deref().unwrap_or_default(),
            );
            self.objects.insert(key, encode(&pod)?);
        }
        Ok(())
    }

    /// Count down a running pod; once exhausted its containers terminate.
    fn advance_running_pod(&mut self, key: &ObjectKey) -> Result<(), ClusterError> {
        let Some(running) = self.running_pods.get_mut(key) else {
            return Ok(());
        };
        if running.polls_left > 0 {
            running.polls_left -= 1;
            return Ok(());
        }
        let Some(running) = self.running_pods.remove(key) else {
            return Ok(());
        };
        let Some(value) = self.objects.get(key) else {
            return Ok(());
        };
        let mut pod: Pod = decode(value)?;
        let spec = pod.spec.clone().unwrap_or_default();
        pod.status = Some(pod_status(&spec, &running.exit_codes, false));
        self.objects.insert(key.clone(), encode(&pod)?);
        Ok(())
    }
}

/// Status of a Job pod. A failed init container stops the pod: later init
/// containers and all main containers never start and stay `Waiting`.
fn pod_status(spec: &PodSpec, exit_codes: &HashMap<String, i32>, running: bool) -> PodStatus {
    let exit_code = |c: &Container| exit_codes.get(&c.name).copied().unwrap_or(0);
    let status = |c: &Container, state: ContainerState| ContainerStatus {
        name: c.name.clone(),
        image: c.image.clone().unwrap_or_default(),
        state: Some(state),
        ..Default::default()
    };

    let mut init_failed = false;
    let mut init_statuses = Vec::new();
    for c in spec.init_containers.as_deref().unwrap_or_default() {
        let state = if init_failed {
            waiting_state()
        } else {
            container_state(exit_code(c), running)
        };
        init_failed |= !running && exit_code(c) != 0;
        init_statuses.push(status(c, state));
    }
    let main_statuses: Vec<ContainerStatus> = spec
        .containers
        .iter()
        .map(|c| {
            let state = if init_failed {
                waiting_state()
            } else {
                container_state(exit_code(c), running)
            };
            status(c, state)
        })
        .collect();

    let main_failed = !running && spec.containers.iter().any(|c| exit_code(c) != 0);
    let phase = match (running, init_failed || main_failed) {
        (true, _) => "Running",
        (false, true) => "Failed",
        (false, false) => "Succeeded",
    };
    PodStatus {
        phase: Some(phase.to_string()),
        init_container_statuses: Some(init_statuses),
        container_statuses: Some(main_statuses),
        ..Default::default()
    }
}

fn container_state(exit_code: i32, running: bool) -> ContainerState {
    if running {
        ContainerState { running: Some(ContainerStateRunning::default()), ..Default::default() }
    } else {
        ContainerState {
            terminated: Some(ContainerStateTerminated { exit_code, ..Default::default() }),
            ..Default::default()
        }
    }
}

fn waiting_state() -> ContainerState {
    ContainerState {
        waiting: Some(ContainerStateWaiting {
            reason: Some("PodInitializing".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Fake cluster for testing
#[derive(Clone, Default)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeClusterState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how the fake Job controller schedules pods
    pub fn with_job_pods(self, job_pods: JobPods) -> Self {
        self.inner.lock().job_pods = job_pods;
        self
    }

    /// Store an object directly, without recording a call
    pub fn insert<K: ClusterObject>(&self, mut object: K) {
        let meta = object.meta();
        let name = meta.name.as_deref().unwrap_or_default();
        let key = ObjectKey::of::<K>(meta.namespace.as_deref(), name);
        object.meta_mut().namespace = key.namespace.clone();
        if let Ok(value) = serde_json::to_value(&object) {
            self.inner.lock().objects.insert(key, value);
        }
    }

    /// Read an object without recording a call
    pub fn object<K: ClusterObject>(&self, namespace: Option<&str>, name: &str) -> Option<K> {
        let key = ObjectKey::of::<K>(namespace, name);
        self.inner.lock().objects.get(&key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains<K: ClusterObject>(&self, namespace: Option<&str>, name: &str) -> bool {
        let key = ObjectKey::of::<K>(namespace, name);
        self.inner.lock().objects.contains_key(&key)
    }

    /// Number of stored objects of kind `K`
    pub fn count<K: ClusterObject>(&self) -> usize {
        let kind = K::kind_name();
        self.inner.lock().objects.keys().filter(|k| k.kind == kind).count()
    }

    /// Make every matching call fail; `name = None` matches any name
    pub fn fail(&self, verb: Verb, kind: &str, name: Option<&str>) {
        self.inner.lock().failures.push(FailRule {
            verb,
            kind: kind.to_string(),
            name: name.map(String::from),
        });
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded calls with the given verb
    pub fn calls_with(&self, verb: Verb) -> Vec<ClusterCall> {
        self.inner.lock().calls.iter().filter(|c| c.verb == verb).cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn get<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<K, ClusterError> {
        self.inner.lock().get(namespace, name)
    }

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError> {
        self.inner.lock().create(object)
    }

    async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError> {
        self.inner.lock().replace(object)
    }

    async fn delete<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError> {
        self.inner.lock().delete::<K>(namespace, name, propagation)
    }

    async fn list<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<K>, ClusterError> {
        self.inner.lock().list(namespace, selector)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
