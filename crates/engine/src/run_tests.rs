// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::{SetOptions, TtlConfig, TtlDeps, DEFAULT_SERVICE_ACCOUNT};
use chrono::{TimeZone, Utc};
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{ClusterRole, Role};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use std::time::Duration;
use ttl_adapters::{FakeCluster, FakeLogFetcher, FakeReleaseStore, JobPods, Verb};
use ttl_core::labels::{TRIGGERED_BY, TRIGGERED_BY_RUN};
use ttl_core::{ContainerResult, FakeClock};

const NAME: &str = "myapp-staging-ttl";
const JOB: &str = "myapp-staging-ttl-run";
const POD: &str = "myapp-staging-ttl-run-x7k2p";

type Manager = TtlManager<FakeCluster, FakeReleaseStore, FakeLogFetcher, FakeClock>;

struct Harness {
    cluster: FakeCluster,
    logs: FakeLogFetcher,
    manager: Manager,
}

fn harness(job_pods: JobPods) -> Harness {
    let cluster = FakeCluster::new().with_job_pods(job_pods);
    let logs = FakeLogFetcher::new();
    let deps = TtlDeps {
        cluster: cluster.clone(),
        releases: FakeReleaseStore::new().with_release("myapp", "staging"),
        logs: logs.clone(),
    };
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap());
    let manager = TtlManager::new(deps, clock, TtlConfig::default());
    Harness { cluster, logs, manager }
}

fn release() -> ReleaseRef {
    ReleaseRef::new("myapp", "staging")
}

fn set_options(cronjob_namespace: &str, delete_namespace: bool) -> SetOptions {
    SetOptions {
        release: release(),
        cronjob_namespace: cronjob_namespace.to_string(),
        duration: "7d".to_string(),
        service_account: DEFAULT_SERVICE_ACCOUNT.to_string(),
        create_service_account: true,
        helm_image: String::new(),
        kubectl_image: String::new(),
        delete_namespace,
    }
}

/// A TTL in `ops` that also deletes the `staging` namespace.
async fn with_cross_namespace_ttl(h: &Harness) {
    h.cluster.insert(Namespace {
        metadata: ObjectMeta { name: Some("staging".to_string()), ..Default::default() },
        ..Default::default()
    });
    h.manager.set(&set_options("ops", true)).await.unwrap();
}

fn results(pairs: &[(&str, i32)]) -> Vec<ContainerResult> {
    pairs
        .iter()
        .map(|(name, code)| ContainerResult { name: name.to_string(), exit_code: *code })
        .collect()
}

/// Run without a deadline, discarding logs.
async fn run(h: &Harness, cronjob_namespace: &str) -> (RunResult, Option<TtlError>) {
    let mut sink = Vec::<u8>::new();
    h.manager.run_now(&release(), cronjob_namespace, &mut sink, &CancellationToken::new()).await
}

fn cancel_after(token: &CancellationToken, after: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        token.cancel();
    });
}

#[tokio::test(start_paused = true)]
async fn run_tears_down_release_and_cleans_up() {
    let h = harness(JobPods::succeed());
    with_cross_namespace_ttl(&h).await;
    h.logs.set_log("helm-uninstall", "release \"myapp\" uninstalled\n");
    h.logs.set_log("delete-namespace", "namespace \"staging\" deleted\n");

    let mut sink = Vec::new();
    let (result, error) =
        h.manager.run_now(&release(), "ops", &mut sink, &CancellationToken::new()).await;

    assert!(error.is_none(), "{:?}", error);
    assert_eq!(
        result.containers,
        results(&[("helm-uninstall", 0), ("delete-namespace", 0), ("self-cleanup", 0)])
    );
    assert!(!result.job_failed);
    assert!(result.deleted_namespace);
    assert_eq!(result.release_name, "myapp");

    let out = String::from_utf8(sink).unwrap();
    assert_eq!(
        out,
        "==> Container: helm-uninstall <==\n\
         release \"myapp\" uninstalled\n\
         ==> Container: delete-namespace <==\n\
         namespace \"staging\" deleted\n\
         ==> Container: self-cleanup <==\n"
    );

    assert_eq!(h.cluster.count::<Job>(), 0);
    assert_eq!(h.cluster.count::<Pod>(), 0);
    assert_eq!(h.cluster.count::<CronJob>(), 0);
    assert_eq!(h.cluster.count::<ServiceAccount>(), 0);
    assert_eq!(h.cluster.count::<Role>(), 0);
    assert_eq!(h.cluster.count::<ClusterRole>(), 0);
    assert_eq!(h.cluster.count::<Namespace>(), 0);
}

#[tokio::test(start_paused = true)]
async fn one_shot_job_is_labelled_and_neutered() {
    let h = harness(JobPods::Never);
    with_cross_namespace_ttl(&h).await;
    h.cluster.fail(Verb::Delete, "Job", None);

    let token = CancellationToken::new();
    token.cancel();
    let _ = h.manager.run_now(&release(), "ops", &mut Vec::<u8>::new(), &token).await;

    let job: Job = h.cluster.object(Some("ops"), JOB).unwrap();
    let labels = job.metadata.labels.unwrap();
    assert_eq!(labels.get(TRIGGERED_BY).map(String::as_str), Some(TRIGGERED_BY_RUN));
    let pod = job.spec.unwrap().template.spec.unwrap();
    assert_eq!(pod.containers[0].command.clone().unwrap()[0], "echo");
}

#[tokio::test(start_paused = true)]
async fn failing_init_container_stops_the_run_and_cleans_up() {
    let h = harness(JobPods::exit_codes(&[("helm-uninstall", 1)]));
    with_cross_namespace_ttl(&h).await;
    h.logs.set_log("helm-uninstall", "Error: uninstall: timed out\n");

    let mut sink = Vec::new();
    let (result, error) =
        h.manager.run_now(&release(), "ops", &mut sink, &CancellationToken::new()).await;

    assert!(matches!(error, Some(TtlError::JobFailed)), "{:?}", error);
    assert!(result.job_failed);
    assert_eq!(result.containers, results(&[("helm-uninstall", 1)]));
    let out = String::from_utf8(sink).unwrap();
    assert_eq!(out, "==> Container: helm-uninstall <==\nError: uninstall: timed out\n");
    assert_eq!(h.cluster.count::<Job>(), 0);
    assert_eq!(h.cluster.count::<CronJob>(), 0);
    assert_eq!(h.cluster.count::<ClusterRole>(), 0);
}

#[tokio::test(start_paused = true)]
async fn finished_pod_is_not_waited_on_until_the_deadline() {
    let h = harness(JobPods::exit_codes(&[("helm-uninstall", 1)]));
    h.manager.set(&set_options("staging", false)).await.unwrap();
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_secs(600));
    let started = tokio::time::Instant::now();

    let (result, error) =
        h.manager.run_now(&release(), "staging", &mut Vec::<u8>::new(), &token).await;

    assert!(matches!(error, Some(TtlError::JobFailed)), "{:?}", error);
    assert!(started.elapsed() < Duration::from_secs(10), "{:?}", started.elapsed());
    assert_eq!(result.containers, results(&[("helm-uninstall", 1)]));
    let pod_reads = h.cluster.calls_with(Verb::Get).into_iter().filter(|c| c.kind == "Pod").count();
    assert_eq!(pod_reads, 2);
}

#[tokio::test(start_paused = true)]
async fn pod_that_never_appears_times_out_and_still_cleans_up() {
    let h = harness(JobPods::Never);
    with_cross_namespace_ttl(&h).await;
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_secs(5));

    let (result, error) = h.manager.run_now(&release(), "ops", &mut Vec::<u8>::new(), &token).await;

    assert!(
        matches!(&error, Some(TtlError::PodWaitTimeout { job }) if job == JOB),
        "{:?}",
        error
    );
    assert!(result.containers.is_empty());
    assert!(h.cluster.calls_with(Verb::List).iter().filter(|c| c.kind == "Pod").count() > 1);
    assert_eq!(h.cluster.count::<Job>(), 0);
    assert_eq!(h.cluster.count::<CronJob>(), 0);
    assert!(result.deleted_namespace);
}

#[tokio::test(start_paused = true)]
async fn slow_pod_is_polled_until_it_finishes() {
    let h =
        harness(JobPods::Run { hidden_polls: 3, running_polls: 2, exit_codes: HashMap::new() });
    h.manager.set(&set_options("staging", false)).await.unwrap();

    let (result, error) = run(&h, "staging").await;

    assert!(error.is_none(), "{:?}", error);
    assert_eq!(result.containers, results(&[("helm-uninstall", 0), ("self-cleanup", 0)]));
    assert!(!result.deleted_namespace);
    let pod_lists =
        h.cluster.calls_with(Verb::List).into_iter().filter(|c| c.kind == "Pod").count();
    assert_eq!(pod_lists, 4);
}

#[tokio::test(start_paused = true)]
async fn container_that_never_finishes_times_out() {
    let h = harness(JobPods::Run {
        hidden_polls: 0,
        running_polls: 1_000,
        exit_codes: HashMap::new(),
    });
    h.manager.set(&set_options("staging", false)).await.unwrap();
    let token = CancellationToken::new();
    cancel_after(&token, Duration::from_secs(3));

    let (result, error) =
        h.manager.run_now(&release(), "staging", &mut Vec::<u8>::new(), &token).await;

    assert!(
        matches!(&error, Some(TtlError::ContainerWaitTimeout { pod, container })
            if pod == POD && container == "helm-uninstall"),
        "{:?}",
        error
    );
    assert!(result.containers.is_empty());
    assert_eq!(h.cluster.count::<Job>(), 0);
}

#[tokio::test(start_paused = true)]
async fn log_fetch_failure_is_not_fatal() {
    let h = harness(JobPods::succeed());
    h.manager.set(&set_options("staging", false)).await.unwrap();
    h.logs.fail("helm-uninstall");
    h.logs.set_log("self-cleanup", "cleanup handled by helm-ttl run\n");

    let mut sink = Vec::new();
    let (result, error) =
        h.manager.run_now(&release(), "staging", &mut sink, &CancellationToken::new()).await;

    assert!(error.is_none(), "{:?}", error);
    assert_eq!(result.containers.len(), 2);
    let out = String::from_utf8(sink).unwrap();
    assert!(
        out.starts_with("==> Container: helm-uninstall <==\n==> Container: self-cleanup <==\n"),
        "{}",
        out
    );
    assert_eq!(h.logs.calls()[0].pod, POD);
}

#[tokio::test(start_paused = true)]
async fn missing_ttl_creates_nothing() {
    let h = harness(JobPods::succeed());
    let (result, error) = run(&h, "staging").await;

    assert!(matches!(error, Some(TtlError::TtlNotFound { .. })), "{:?}", error);
    assert!(result.containers.is_empty());
    assert!(h.cluster.calls_with(Verb::Create).is_empty());
}

#[tokio::test(start_paused = true)]
async fn job_creation_failure_skips_cleanup() {
    let h = harness(JobPods::succeed());
    h.manager.set(&set_options("staging", false)).await.unwrap();
    h.cluster.fail(Verb::Create, "Job", None);
    h.cluster.clear_calls();

    let (_, error) = run(&h, "staging").await;

    assert!(error.unwrap().to_string().starts_with("failed to create Job"));
    assert!(h.cluster.calls_with(Verb::Delete).is_empty());
    assert!(h.cluster.contains::<CronJob>(Some("staging"), NAME));
}

#[tokio::test(start_paused = true)]
async fn namespace_deletion_failure_is_recorded_not_returned() {
    let h = harness(JobPods::succeed());
    with_cross_namespace_ttl(&h).await;
    h.cluster.fail(Verb::Delete, "Namespace", None);

    let (result, error) = run(&h, "ops").await;

    assert!(error.is_none(), "{:?}", error);
    assert!(!result.deleted_namespace);
    assert!(h.cluster.contains::<Namespace>(None, "staging"));
}

#[tokio::test(start_paused = true)]
async fn cleanup_failures_do_not_fail_a_good_run() {
    let h = harness(JobPods::succeed());
    h.manager.set(&set_options("staging", false)).await.unwrap();
    h.cluster.fail(Verb::Delete, "CronJob", None);
    h.cluster.fail(Verb::Delete, "Role", None);

    let (result, error) = run(&h, "staging").await;

    assert!(error.is_none(), "{:?}", error);
    assert!(!result.job_failed);
    assert_eq!(h.cluster.count::<Job>(), 0);
}
