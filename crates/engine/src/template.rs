// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CronJob and Job construction for release teardown.
//!
//! The CronJob runs three steps in order: `helm uninstall` (init), an
//! optional `kubectl delete namespace` (init), then a main container that
//! deletes the CronJob itself.

use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, Job, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use thiserror::Error;
use ttl_core::labels::{self, TRIGGERED_BY, TRIGGERED_BY_RUN};
use ttl_core::{NameError, ReleaseRef};

pub const DEFAULT_HELM_IMAGE: &str = "alpine/helm:latest";
pub const DEFAULT_KUBECTL_IMAGE: &str = "alpine/k8s:latest";

pub const HELM_UNINSTALL_CONTAINER: &str = "helm-uninstall";
pub const DELETE_NAMESPACE_CONTAINER: &str = "delete-namespace";
pub const SELF_CLEANUP_CONTAINER: &str = "self-cleanup";

/// Schedules are always encoded in UTC.
const CRON_TIME_ZONE: &str = "Etc/UTC";
const RUN_NOOP_MESSAGE: &str = "cleanup handled by helm-ttl run";

/// Errors from template construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error(
        "cannot use --delete-namespace when CronJob namespace ({0}) equals release namespace \
         ({0}); the CronJob would delete its own namespace"
    )]
    NamespaceConflict(String),
    #[error(transparent)]
    Name(#[from] NameError),
}

/// Reject a CronJob that would delete the namespace it runs in.
pub fn check_topology(
    release_namespace: &str,
    cronjob_namespace: &str,
    delete_namespace: bool,
) -> Result<(), TemplateError> {
    if delete_namespace && release_namespace == cronjob_namespace {
        return Err(TemplateError::NamespaceConflict(release_namespace.to_string()));
    }
    Ok(())
}

/// Inputs for [`build_cron_job`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronJobOptions {
    pub release: ReleaseRef,
    pub cronjob_namespace: String,
    pub schedule: String,
    pub service_account: String,
    /// Empty selects [`DEFAULT_HELM_IMAGE`]
    pub helm_image: String,
    /// Empty selects [`DEFAULT_KUBECTL_IMAGE`]
    pub kubectl_image: String,
    pub delete_namespace: bool,
}

fn or_default(image: &str, default: &str) -> String {
    let image = if image.is_empty() { default } else { image };
    image.to_string()
}

fn command(args: &[&str]) -> Option<Vec<String>> {
    Some(args.iter().map(|a| a.to_string()).collect())
}

/// Build the teardown CronJob for a release.
pub fn build_cron_job(opts: &CronJobOptions) -> Result<CronJob, TemplateError> {
    let release = &opts.release;
    check_topology(&release.namespace, &opts.cronjob_namespace, opts.delete_namespace)?;
    let name = release.resource_name()?;

    let helm_image = or_default(&opts.helm_image, DEFAULT_HELM_IMAGE);
    let kubectl_image = or_default(&opts.kubectl_image, DEFAULT_KUBECTL_IMAGE);
    let labels = labels::cronjob_labels(
        &release.name,
        &release.namespace,
        &opts.cronjob_namespace,
        opts.delete_namespace,
    );

    let mut init_containers = vec![Container {
        name: HELM_UNINSTALL_CONTAINER.to_string(),
        image: Some(helm_image),
        command: command(&["helm", "uninstall", &release.name, "--namespace", &release.namespace]),
        ..Default::default()
    }];
    if opts.delete_namespace {
        init_containers.push(Container {
            name: DELETE_NAMESPACE_CONTAINER.to_string(),
            image: Some(kubectl_image.clone()),
            command: command(&["kubectl", "delete", "namespace", &release.namespace]),
            ..Default::default()
        });
    }

    let self_cleanup = Container {
        name: SELF_CLEANUP_CONTAINER.to_string(),
        image: Some(kubectl_image),
        command: command(&[
            "kubectl",
            "delete",
            "cronjob",
            &name,
            "--namespace",
            &opts.cronjob_namespace,
        ]),
        ..Default::default()
    };

    Ok(CronJob {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(opts.cronjob_namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule: opts.schedule.clone(),
            time_zone: Some(CRON_TIME_ZONE.to_string()),
            concurrency_policy: Some("Forbid".to_string()),
            failed_jobs_history_limit: Some(0),
            successful_jobs_history_limit: Some(1),
            job_template: JobTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels.clone()), ..Default::default() }),
                spec: Some(JobSpec {
                    backoff_limit: Some(0),
                    template: PodTemplateSpec {
                        metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                        spec: Some(PodSpec {
                            service_account_name: Some(opts.service_account.clone()),
                            restart_policy: Some("Never".to_string()),
                            init_containers: Some(init_containers),
                            containers: vec![self_cleanup],
                            ..Default::default()
                        }),
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Materialize a one-shot Job from a CronJob's job template.
///
/// The `self-cleanup` container becomes a no-op because `run` deletes the
/// CronJob itself during cleanup.
pub fn build_job_from_cron_job(cron_job: &CronJob, run_name: &str) -> Job {
    let template = cron_job.spec.as_ref().map(|s| s.job_template.clone()).unwrap_or_default();
    let mut spec = template.spec.unwrap_or_default();

    if let Some(pod_spec) = spec.template.spec.as_mut() {
        for container in &mut pod_spec.containers {
            if container.name == SELF_CLEANUP_CONTAINER {
                container.command = command(&["echo", RUN_NOOP_MESSAGE]);
            }
        }
    }

    let mut job_labels = cron_job.metadata.labels.clone().unwrap_or_default();
    job_labels.insert(TRIGGERED_BY.to_string(), TRIGGERED_BY_RUN.to_string());

    let pod_meta = spec.template.metadata.get_or_insert_with(Default::default);
    pod_meta
        .labels
        .get_or_insert_with(Default::default)
        .insert(TRIGGERED_BY.to_string(), TRIGGERED_BY_RUN.to_string());

    Job {
        metadata: ObjectMeta {
            name: Some(run_name.to_string()),
            namespace: cron_job.metadata.namespace.clone(),
            labels: Some(job_labels),
            ..Default::default()
        },
        spec: Some(spec),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
