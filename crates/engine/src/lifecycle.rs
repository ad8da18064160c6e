// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set, inspect and remove release TTLs.

use crate::access::Access;
use crate::error::{best_effort, TtlError};
use crate::template::{build_cron_job, check_topology, CronJobOptions};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::ServiceAccount;
use std::time::Duration;
use ttl_adapters::{ClusterApi, LogFetcher, Propagation, ReleaseStore};
use ttl_core::{
    labels, parse_schedule, parse_time_input, time_to_schedule, Clock, ReleaseRef, TtlInfo,
};

/// Service account name that means "not chosen by the user".
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Adapters a [`TtlManager`] drives.
pub struct TtlDeps<C, R, L> {
    pub cluster: C,
    pub releases: R,
    pub logs: L,
}

/// Timing knobs for the synchronous run path.
#[derive(Debug, Clone)]
pub struct TtlConfig {
    /// Delay between pod and container status polls.
    pub poll_interval: Duration,
    /// Deadline for the cleanup that follows every run.
    pub cleanup_timeout: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1), cleanup_timeout: Duration::from_secs(30) }
    }
}

/// Parameters of [`TtlManager::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOptions {
    pub release: ReleaseRef,
    pub cronjob_namespace: String,
    /// TTL expression such as `7d` or `next monday`.
    pub duration: String,
    pub service_account: String,
    pub create_service_account: bool,
    pub helm_image: String,
    pub kubectl_image: String,
    pub delete_namespace: bool,
}

/// Coordinates the CronJob, its RBAC bundle and on-demand runs
pub struct TtlManager<C: ClusterApi, R, L, K: Clock> {
    pub(crate) cluster: C,
    releases: R,
    pub(crate) logs: L,
    pub(crate) access: Access<C>,
    clock: K,
    pub(crate) config: TtlConfig,
}

impl<C, R, L, K> TtlManager<C, R, L, K>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    pub fn new(deps: TtlDeps<C, R, L>, clock: K, config: TtlConfig) -> Self {
        Self {
            access: Access::new(deps.cluster.clone()),
            cluster: deps.cluster,
            releases: deps.releases,
            logs: deps.logs,
            clock,
            config,
        }
    }

    pub fn access(&self) -> &Access<C> {
        &self.access
    }

    /// Whether the Helm release is still installed.
    pub async fn release_exists(&self, release: &ReleaseRef) -> Result<bool, TtlError> {
        Ok(self.releases.exists(release).await?)
    }

    /// Schedule (or reschedule) the teardown of a release.
    pub async fn set(&self, opts: &SetOptions) -> Result<TtlInfo, TtlError> {
        let release = &opts.release;
        let cronjob_ns = opts.cronjob_namespace.as_str();

        if !self.releases.exists(release).await? {
            return Err(TtlError::ReleaseNotFound {
                release: release.name.clone(),
                namespace: release.namespace.clone(),
            });
        }
        check_topology(&release.namespace, cronjob_ns, opts.delete_namespace)?;

        let at = parse_time_input(&opts.duration, self.clock.now())?;
        let schedule = time_to_schedule(at);
        let name = release.resource_name()?;

        let service_account =
            if opts.create_service_account && opts.service_account == DEFAULT_SERVICE_ACCOUNT {
                name.clone()
            } else {
                opts.service_account.clone()
            };

        if opts.create_service_account {
            self.access
                .provision(release, cronjob_ns, &service_account, opts.delete_namespace)
                .await?;
        } else {
            self.check_service_account(&service_account, cronjob_ns).await?;
        }

        let cron_job = build_cron_job(&CronJobOptions {
            release: release.clone(),
            cronjob_namespace: cronjob_ns.to_string(),
            schedule: schedule.clone(),
            service_account,
            helm_image: opts.helm_image.clone(),
            kubectl_image: opts.kubectl_image.clone(),
            delete_namespace: opts.delete_namespace,
        })?;
        self.upsert_cron_job(cron_job, &name, cronjob_ns).await?;

        tracing::info!(release = %release, cronjob_namespace = cronjob_ns, %schedule, "TTL set");
        Ok(TtlInfo {
            release_name: release.name.clone(),
            release_namespace: release.namespace.clone(),
            cronjob_namespace: cronjob_ns.to_string(),
            scheduled_date: format_date(
                at.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(at),
            ),
            cron_schedule: schedule,
            delete_namespace: opts.delete_namespace,
        })
    }

    /// Describe the TTL currently scheduled for a release.
    pub async fn get(&self, release: &ReleaseRef, cronjob_ns: &str) -> Result<TtlInfo, TtlError> {
        let cron_job = self.fetch_cron_job(release, cronjob_ns).await?;
        let schedule = cron_job.spec.map(|s| s.schedule).unwrap_or_default();
        let at = parse_schedule(&schedule, self.clock.now())?;

        Ok(TtlInfo {
            release_name: release.name.clone(),
            release_namespace: release.namespace.clone(),
            cronjob_namespace: cronjob_ns.to_string(),
            scheduled_date: format_date(at),
            cron_schedule: schedule,
            delete_namespace: labels::delete_namespace_flag(cron_job.metadata.labels.as_ref()),
        })
    }

    /// Remove a release's TTL. RBAC teardown failures are only logged.
    pub async fn unset(&self, release: &ReleaseRef, cronjob_ns: &str) -> Result<(), TtlError> {
        let name = release.resource_name()?;
        match self.cluster.delete::<CronJob>(Some(cronjob_ns), &name, Propagation::Default).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(ttl_not_found(release)),
            Err(e) => return Err(TtlError::cluster("delete CronJob", e)),
        }

        best_effort("tear down RBAC", self.access.teardown(release, cronjob_ns).await);
        tracing::info!(release = %release, cronjob_namespace = cronjob_ns, "TTL unset");
        Ok(())
    }

    pub(crate) async fn fetch_cron_job(
        &self,
        release: &ReleaseRef,
        cronjob_ns: &str,
    ) -> Result<CronJob, TtlError> {
        let name = release.resource_name()?;
        match self.cluster.get::<CronJob>(Some(cronjob_ns), &name).await {
            Ok(cron_job) => Ok(cron_job),
            Err(e) if e.is_not_found() => Err(ttl_not_found(release)),
            Err(e) => Err(TtlError::cluster("get CronJob", e)),
        }
    }

    async fn check_service_account(&self, name: &str, namespace: &str) -> Result<(), TtlError> {
        match self.cluster.get::<ServiceAccount>(Some(namespace), name).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Err(TtlError::ServiceAccountNotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            Err(source) => {
                Err(TtlError::ServiceAccountCheckFailed { name: name.to_string(), source })
            }
        }
    }

    /// Create the CronJob, or replace the spec and labels of an existing one.
    async fn upsert_cron_job(
        &self,
        desired: CronJob,
        name: &str,
        namespace: &str,
    ) -> Result<(), TtlError> {
        match self.cluster.get::<CronJob>(Some(namespace), name).await {
            Ok(mut existing) => {
                existing.spec = desired.spec;
                existing.metadata.labels = desired.metadata.labels;
                self.cluster
                    .replace(&existing)
                    .await
                    .map_err(|e| TtlError::cluster("update CronJob", e))?;
            }
            Err(e) if e.is_not_found() => {
                self.cluster
                    .create(&desired)
                    .await
                    .map_err(|e| TtlError::cluster("create CronJob", e))?;
            }
            Err(e) => return Err(TtlError::cluster("check existing CronJob", e)),
        }
        Ok(())
    }
}

pub(crate) fn ttl_not_found(release: &ReleaseRef) -> TtlError {
    TtlError::TtlNotFound { release: release.name.clone(), namespace: release.namespace.clone() }
}

/// RFC 3339 with a `Z` suffix and whole seconds.
fn format_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
