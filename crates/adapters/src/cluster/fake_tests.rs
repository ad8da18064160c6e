// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use k8s_openapi::api::batch::v1::JobSpec;
use k8s_openapi::api::core::v1::{Namespace, PodTemplateSpec, ServiceAccount};
use k8s_openapi::api::rbac::v1::ClusterRole;

fn meta(namespace: Option<&str>, name: &str, labels: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(String::from),
        labels: (!labels.is_empty())
            .then(|| labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
        ..Default::default()
    }
}

fn service_account(ns: &str, name: &str, labels: &[(&str, &str)]) -> ServiceAccount {
    ServiceAccount { metadata: meta(Some(ns), name, labels), ..Default::default() }
}

fn job(ns: &str, name: &str) -> Job {
    let container = |name: &str| Container { name: name.to_string(), ..Default::default() };
    Job {
        metadata: meta(Some(ns), name, &[]),
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: Some(meta(None, "", &[("app", "ttl")])),
                spec: Some(PodSpec {
                    init_containers: Some(vec![container("first")]),
                    containers: vec![container("main")],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn terminated_codes(pod: &Pod) -> Vec<(String, Option<i32>)> {
    let status = pod.status.clone().unwrap_or_default();
    status
        .init_container_statuses
        .unwrap_or_default()
        .into_iter()
        .chain(status.container_statuses.unwrap_or_default())
        .map(|s| (s.name, s.state.and_then(|st| st.terminated).map(|t| t.exit_code)))
        .collect()
}

#[tokio::test]
async fn create_then_get_assigns_uid() {
    let cluster = FakeCluster::new();
    let created = cluster.create(&service_account("ops", "sa", &[])).await.unwrap();
    assert!(created.metadata.uid.is_some());

    let fetched: ServiceAccount = cluster.get(Some("ops"), "sa").await.unwrap();
    assert_eq!(fetched.metadata.uid, created.metadata.uid);
}

#[tokio::test]
async fn create_twice_reports_already_exists() {
    let cluster = FakeCluster::new();
    cluster.create(&service_account("ops", "sa", &[])).await.unwrap();
    let err = cluster.create(&service_account("ops", "sa", &[])).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn replace_keeps_uid_and_bumps_version() {
    let cluster = FakeCluster::new();
    let created = cluster.create(&service_account("ops", "sa", &[])).await.unwrap();
    let replaced =
        cluster.replace(&service_account("ops", "sa", &[("tier", "x")])).await.unwrap();
    assert_eq!(replaced.metadata.uid, created.metadata.uid);
    assert_eq!(replaced.metadata.resource_version.as_deref(), Some("2"));
    let stored: ServiceAccount = cluster.object(Some("ops"), "sa").unwrap();
    assert_eq!(stored.metadata.labels.unwrap().get("tier").map(String::as_str), Some("x"));
}

#[tokio::test]
async fn replace_and_delete_missing_report_not_found() {
    let cluster = FakeCluster::new();
    assert!(cluster.replace(&service_account("ops", "sa", &[])).await.unwrap_err().is_not_found());
    let err = cluster
        .delete::<ServiceAccount>(Some("ops"), "sa", Propagation::Default)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_filters_by_namespace_and_selector() {
    let cluster = FakeCluster::new();
    cluster.insert(service_account("a", "one", &[("team", "x")]));
    cluster.insert(service_account("b", "two", &[("team", "x")]));
    cluster.insert(service_account("b", "three", &[("team", "y")]));

    let all: Vec<ServiceAccount> = cluster.list(None, Some("team=x")).await.unwrap();
    assert_eq!(all.len(), 2);
    let in_b: Vec<ServiceAccount> = cluster.list(Some("b"), None).await.unwrap();
    assert_eq!(in_b.len(), 2);
    let in_b_x: Vec<ServiceAccount> = cluster.list(Some("b"), Some("team=x")).await.unwrap();
    assert_eq!(in_b_x[0].metadata.name.as_deref(), Some("two"));
}

#[tokio::test]
async fn cluster_scoped_objects_ignore_namespace() {
    let cluster = FakeCluster::new();
    cluster.insert(ClusterRole { metadata: meta(None, "cr", &[]), ..Default::default() });
    let role: ClusterRole = cluster.get(Some("ignored"), "cr").await.unwrap();
    assert_eq!(role.metadata.name.as_deref(), Some("cr"));
    assert!(role.metadata.namespace.is_none());
}

#[tokio::test]
async fn job_pod_appears_after_hidden_polls() {
    let cluster = FakeCluster::new().with_job_pods(JobPods::Run {
        hidden_polls: 2,
        running_polls: 0,
        exit_codes: HashMap::new(),
    });
    cluster.create(&job("ops", "j")).await.unwrap();

    for _ in 0..2 {
        let pods: Vec<Pod> = cluster.list(Some("ops"), Some("job-name=j")).await.unwrap();
        assert!(pods.is_empty());
    }
    let pods: Vec<Pod> = cluster.list(Some("ops"), Some("job-name=j")).await.unwrap();
    assert_eq!(pods.len(), 1);
    let labels = pods[0].metadata.labels.clone().unwrap();
    assert_eq!(labels.get("app").map(String::as_str), Some("ttl"));
}

#[tokio::test]
async fn job_pod_containers_run_then_terminate() {
    let cluster = FakeCluster::new().with_job_pods(JobPods::Run {
        hidden_polls: 0,
        running_polls: 1,
        exit_codes: [("main".to_string(), 3)].into_iter().collect(),
    });
    cluster.create(&job("ops", "j")).await.unwrap();
    let pods: Vec<Pod> = cluster.list(Some("ops"), Some("job-name=j")).await.unwrap();
    let name = pods[0].metadata.name.clone().unwrap();

    let running: Pod = cluster.get(Some("ops"), &name).await.unwrap();
    assert_eq!(
        terminated_codes(&running),
        vec![("first".to_string(), None), ("main".to_string(), None)]
    );

    let done: Pod = cluster.get(Some("ops"), &name).await.unwrap();
    assert_eq!(
        terminated_codes(&done),
        vec![("first".to_string(), Some(0)), ("main".to_string(), Some(3))]
    );
    assert_eq!(done.status.unwrap().phase.as_deref(), Some("Failed"));
}

#[tokio::test]
async fn failed_init_container_leaves_later_containers_waiting() {
    let cluster = FakeCluster::new().with_job_pods(JobPods::exit_codes(&[("first", 1)]));
    cluster.create(&job("ops", "j")).await.unwrap();
    let pods: Vec<Pod> = cluster.list(Some("ops"), Some("job-name=j")).await.unwrap();

    assert_eq!(
        terminated_codes(&pods[0]),
        vec![("first".to_string(), Some(1)), ("main".to_string(), None)]
    );
    let status = pods[0].status.clone().unwrap();
    assert_eq!(status.phase.as_deref(), Some("Failed"));
    let main = &status.container_statuses.unwrap()[0];
    let waiting = main.state.clone().and_then(|s| s.waiting).unwrap();
    assert_eq!(waiting.reason.as_deref(), Some("PodInitializing"));
}

#[tokio::test]
async fn never_scheduled_job_has_no_pod() {
    let cluster = FakeCluster::new().with_job_pods(JobPods::Never);
    cluster.create(&job("ops", "j")).await.unwrap();
    let pods: Vec<Pod> = cluster.list(Some("ops"), None).await.unwrap();
    assert!(pods.is_empty());
}

#[yare::parameterized(
    background = { Propagation::Background, 0 },
    default    = { Propagation::Default, 1 },
)]
fn job_delete_cascades_only_in_background(propagation: Propagation, pods_left: usize) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    rt.block_on(async {
        let cluster = FakeCluster::new();
        cluster.create(&job("ops", "j")).await.unwrap();
        let _: Vec<Pod> = cluster.list(Some("ops"), None).await.unwrap();
        cluster.delete::<Job>(Some("ops"), "j", propagation).await.unwrap();
        assert_eq!(cluster.count::<Pod>(), pods_left);
    });
}

#[tokio::test]
async fn namespace_delete_removes_contents() {
    let cluster = FakeCluster::new();
    cluster.insert(Namespace { metadata: meta(None, "staging", &[]), ..Default::default() });
    cluster.insert(service_account("staging", "sa", &[]));
    cluster.insert(service_account("ops", "sa", &[]));

    cluster.delete::<Namespace>(None, "staging", Propagation::Default).await.unwrap();
    assert!(!cluster.contains::<Namespace>(None, "staging"));
    assert!(!cluster.contains::<ServiceAccount>(Some("staging"), "sa"));
    assert!(cluster.contains::<ServiceAccount>(Some("ops"), "sa"));
}

#[tokio::test]
async fn injected_failures_apply_to_matching_calls() {
    let cluster = FakeCluster::new();
    cluster.insert(service_account("ops", "a", &[]));
    cluster.insert(service_account("ops", "b", &[]));
    cluster.fail(Verb::Get, "ServiceAccount", Some("a"));

    let err = cluster.get::<ServiceAccount>(Some("ops"), "a").await.unwrap_err();
    assert!(matches!(err, ClusterError::Request(_)));
    assert!(cluster.get::<ServiceAccount>(Some("ops"), "b").await.is_ok());

    cluster.clear_failures();
    assert!(cluster.get::<ServiceAccount>(Some("ops"), "a").await.is_ok());
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let cluster = FakeCluster::new();
    cluster.create(&service_account("ops", "sa", &[])).await.unwrap();
    let _: Vec<ServiceAccount> = cluster.list(Some("ops"), None).await.unwrap();
    cluster.delete::<ServiceAccount>(Some("ops"), "sa", Propagation::Default).await.unwrap();

    let verbs: Vec<Verb> = cluster.calls().iter().map(|c| c.verb).collect();
    assert_eq!(verbs, vec![Verb::Create, Verb::List, Verb::Delete]);
    assert_eq!(cluster.calls_with(Verb::Delete)[0].name.as_deref(), Some("sa"));

    cluster.clear_calls();
    assert!(cluster.calls().is_empty());
}
