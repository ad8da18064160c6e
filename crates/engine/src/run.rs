// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-demand teardown.
//!
//! A one-shot Job is materialized from the CronJob's template and watched
//! container by container. Whatever happens while watching, the Job, the
//! CronJob and the RBAC bundle are cleaned up afterwards.

use crate::error::{best_effort, TtlError};
use crate::lifecycle::TtlManager;
use crate::template::build_job_from_cron_job;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ContainerStatus, Namespace, Pod};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use ttl_adapters::{ClusterApi, ClusterError, LogFetcher, Propagation, ReleaseStore};
use ttl_core::labels::{self, JOB_NAME};
use ttl_core::{run_job_name, Clock, ReleaseRef, RunResult};

fn ignore_not_found(result: Result<(), ClusterError>) -> Result<(), ClusterError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

fn terminated_exit_code(statuses: Option<&Vec<ContainerStatus>>, container: &str) -> Option<i32> {
    statuses?
        .iter()
        .filter(|s| s.name == container)
        .find_map(|s| s.state.as_ref()?.terminated.as_ref().map(|t| t.exit_code))
}

impl<C, R, L, K> TtlManager<C, R, L, K>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    /// Tear a release down now, writing each container's log to `sink`.
    ///
    /// Cancelling `cancel` stops the wait for the pod or a container but not
    /// the cleanup, which has its own deadline. The result holds everything
    /// gathered before any error returned alongside it.
    pub async fn run_now<W: Write + Send>(
        &self,
        release: &ReleaseRef,
        cronjob_ns: &str,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> (RunResult, Option<TtlError>) {
        let mut result = RunResult::for_release(release);

        let cron_job = match self.fetch_cron_job(release, cronjob_ns).await {
            Ok(cron_job) => cron_job,
            Err(e) => return (result, Some(e)),
        };
        let name = cron_job.metadata.name.clone().unwrap_or_default();
        let delete_namespace = labels::delete_namespace_flag(cron_job.metadata.labels.as_ref());

        let job_name = run_job_name(&name);
        let job = build_job_from_cron_job(&cron_job, &job_name);
        if let Err(e) = self.cluster.create(&job).await {
            return (result, Some(TtlError::cluster("create Job", e)));
        }
        tracing::info!(release = %release, job = %job_name, "started one-shot teardown Job");

        let watch_error = self.watch(cronjob_ns, &job_name, sink, cancel, &mut result).await.err();
        self.cleanup(release, cronjob_ns, &name, &job_name, delete_namespace, &mut result).await;

        let error = watch_error.or_else(|| result.job_failed.then_some(TtlError::JobFailed));
        (result, error)
    }

    async fn watch<W: Write + Send>(
        &self,
        namespace: &str,
        job_name: &str,
        sink: &mut W,
        cancel: &CancellationToken,
        result: &mut RunResult,
    ) -> Result<(), TtlError> {
        let pod = self.wait_for_pod(namespace, job_name, cancel).await?;
        let pod_name = pod.metadata.name.unwrap_or_default();
        let spec = pod.spec.unwrap_or_default();

        // Walk the live pod so injected sidecars are reported too
        let containers: Vec<String> = spec
            .init_containers
            .unwrap_or_default()
            .into_iter()
            .chain(spec.containers)
            .map(|c| c.name)
            .collect();

        for container in containers {
            let waited = self.wait_for_container(namespace, &pod_name, &container, cancel).await?;
            let Some(exit_code) = waited else {
                result.job_failed = true;
                break;
            };
            self.write_logs(namespace, &pod_name, &container, sink).await;
            if exit_code != 0 {
                tracing::warn!(pod = %pod_name, %container, exit_code, "container failed");
            }
            result.record(container, exit_code);
        }
        Ok(())
    }

    async fn wait_for_pod(
        &self,
        namespace: &str,
        job_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Pod, TtlError> {
        let selector = format!("{}={}", JOB_NAME, job_name);
        loop {
            let pods = self
                .cluster
                .list::<Pod>(Some(namespace), Some(&selector))
                .await
                .map_err(|e| TtlError::cluster("list pods", e))?;
            if let Some(pod) = pods.into_iter().next() {
                tracing::debug!(job = job_name, pod = ?pod.metadata.name, "pod scheduled");
                return Ok(pod);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(TtlError::PodWaitTimeout { job: job_name.to_string() });
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Poll until `container` terminates and return its exit code. `None` means
    /// the pod finished without ever running it, as after a failed init
    /// container.
    async fn wait_for_container(
        &self,
        namespace: &str,
        pod_name: &str,
        container: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<i32>, TtlError> {
        loop {
            let pod = self
                .cluster
                .get::<Pod>(Some(namespace), pod_name)
                .await
                .map_err(|e| TtlError::cluster(format!("get pod {}", pod_name), e))?;
            let status = pod.status.unwrap_or_default();
            let exit_code = terminated_exit_code(status.init_container_statuses.as_ref(), container)
                .or_else(|| terminated_exit_code(status.container_statuses.as_ref(), container));
            if exit_code.is_some() {
                return Ok(exit_code);
            }
            if let Some(phase @ ("Failed" | "Succeeded")) = status.phase.as_deref() {
                tracing::warn!(
                    pod = pod_name,
                    container,
                    phase,
                    "pod finished without running container"
                );
                return Ok(None);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(TtlError::ContainerWaitTimeout {
                        pod: pod_name.to_string(),
                        container: container.to_string(),
                    });
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    async fn write_logs<W: Write + Send>(
        &self,
        namespace: &str,
        pod_name: &str,
        container: &str,
        sink: &mut W,
    ) {
        best_effort("write log header", writeln!(sink, "==> Container: {} <==", container));
        match self.logs.fetch(namespace, pod_name, container).await {
            Ok(log) => {
                best_effort("write container log", sink.write_all(log.as_bytes()));
            }
            Err(e) => {
                best_effort::<(), _>("fetch container log", Err(e));
            }
        }
        best_effort("flush log sink", sink.flush());
    }

    /// Remove everything the run and the TTL left behind, within the cleanup
    /// deadline. Failures are logged and never returned.
    async fn cleanup(
        &self,
        release: &ReleaseRef,
        namespace: &str,
        name: &str,
        job_name: &str,
        delete_namespace: bool,
        result: &mut RunResult,
    ) {
        let steps = async {
            let job =
                self.cluster.delete::<Job>(Some(namespace), job_name, Propagation::Background);
            best_effort("delete Job", ignore_not_found(job.await));

            let cron_job =
                self.cluster.delete::<CronJob>(Some(namespace), name, Propagation::Default);
            best_effort("delete CronJob", ignore_not_found(cron_job.await));

            best_effort("tear down RBAC", self.access.teardown(release, namespace).await);

            if delete_namespace {
                let ns = self.cluster.delete::<Namespace>(
                    None,
                    &release.namespace,
                    Propagation::Default,
                );
                if best_effort("delete release namespace", ignore_not_found(ns.await)).is_some() {
                    tracing::info!(namespace = %release.namespace, "deleted release namespace");
                    result.deleted_namespace = true;
                }
            }
        };

        if tokio::time::timeout(self.config.cleanup_timeout, steps).await.is_err() {
            tracing::warn!(
                release = %release,
                timeout = ?self.config.cleanup_timeout,
                "cleanup did not finish before its deadline"
            );
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
