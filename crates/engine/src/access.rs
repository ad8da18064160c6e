// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RBAC scaffolding for TTL CronJobs.
//!
//! Every object in a release's bundle is named after the release's resource
//! name and carries the bookkeeping labels, which is how [`Access::find_orphans`]
//! links it back to the CronJob it was created for.

use crate::error::TtlError;
use crate::template::check_topology;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{Namespace, ServiceAccount};
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use thiserror::Error;
use ttl_adapters::{ClusterApi, ClusterError, ClusterObject, Propagation};
use ttl_core::labels::{self, owner_cronjob};
use ttl_core::{resource_name, OrphanedResource, ReleaseRef};

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Namespaces inspected by an orphan sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepScope {
    Namespaces(Vec<String>),
    /// Every namespace the API server lists.
    AllNamespaces,
}

/// A sweep that stopped early, with whatever it found before failing.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct SweepError {
    pub found: Vec<OrphanedResource>,
    #[source]
    pub source: TtlError,
}

/// Objects whose managed fields are overwritten when they already exist.
trait Managed: ClusterObject {
    fn adopt(&mut self, desired: &Self);
}

impl Managed for ServiceAccount {
    fn adopt(&mut self, desired: &Self) {
        self.metadata.labels = desired.metadata.labels.clone();
    }
}

impl Managed for Role {
    fn adopt(&mut self, desired: &Self) {
        self.metadata.labels = desired.metadata.labels.clone();
        self.rules = desired.rules.clone();
    }
}

impl Managed for ClusterRole {
    fn adopt(&mut self, desired: &Self) {
        self.metadata.labels = desired.metadata.labels.clone();
        self.rules = desired.rules.clone();
    }
}

impl Managed for RoleBinding {
    fn adopt(&mut self, desired: &Self) {
        self.metadata.labels = desired.metadata.labels.clone();
        self.subjects = desired.subjects.clone();
        self.role_ref = desired.role_ref.clone();
    }
}

impl Managed for ClusterRoleBinding {
    fn adopt(&mut self, desired: &Self) {
        self.metadata.labels = desired.metadata.labels.clone();
        self.subjects = desired.subjects.clone();
        self.role_ref = desired.role_ref.clone();
    }
}

fn rule(api_group: &str, resource: &str, verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(vec![api_group.to_string()]),
        resources: Some(vec![resource.to_string()]),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

fn secrets_rule() -> PolicyRule {
    rule("", "secrets", &["get", "list", "delete"])
}

fn cronjobs_rule() -> PolicyRule {
    rule("batch", "cronjobs", &["get", "delete"])
}

fn namespaces_rule() -> PolicyRule {
    rule("", "namespaces", &["get", "delete"])
}

fn meta(name: &str, namespace: Option<&str>, labels: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(String::from),
        labels: Some(labels.clone()),
        ..Default::default()
    }
}

/// Describes the bundle for one release, ready to be materialized.
struct Bundle<'a> {
    name: String,
    release: &'a ReleaseRef,
    cronjob_namespace: &'a str,
    service_account: &'a str,
    labels: BTreeMap<String, String>,
}

impl Bundle<'_> {
    fn subject(&self) -> Subject {
        Subject {
            kind: "ServiceAccount".to_string(),
            name: self.service_account.to_string(),
            namespace: Some(self.cronjob_namespace.to_string()),
            ..Default::default()
        }
    }

    fn role_ref(&self, kind: &str) -> RoleRef {
        RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: kind.to_string(),
            name: self.name.clone(),
        }
    }

    fn service_account(&self) -> ServiceAccount {
        ServiceAccount {
            metadata: meta(self.service_account, Some(self.cronjob_namespace), &self.labels),
            ..Default::default()
        }
    }

    fn role(&self, namespace: &str, rules: Vec<PolicyRule>) -> Role {
        Role { metadata: meta(&self.name, Some(namespace), &self.labels), rules: Some(rules) }
    }

    fn role_binding(&self, namespace: &str) -> RoleBinding {
        RoleBinding {
            metadata: meta(&self.name, Some(namespace), &self.labels),
            role_ref: self.role_ref("Role"),
            subjects: Some(vec![self.subject()]),
        }
    }

    fn cluster_role(&self) -> ClusterRole {
        ClusterRole {
            metadata: meta(&self.name, None, &self.labels),
            rules: Some(vec![namespaces_rule()]),
            ..Default::default()
        }
    }

    fn cluster_role_binding(&self) -> ClusterRoleBinding {
        ClusterRoleBinding {
            metadata: meta(&self.name, None, &self.labels),
            role_ref: self.role_ref("ClusterRole"),
            subjects: Some(vec![self.subject()]),
        }
    }
}

/// Provisions, tears down and sweeps the RBAC bundles of TTL CronJobs.
#[derive(Clone)]
pub struct Access<C: ClusterApi> {
    cluster: C,
}

impl<C: ClusterApi> Access<C> {
    pub fn new(cluster: C) -> Self {
        Self { cluster }
    }

    /// Create or update everything the CronJob needs to run unattended.
    ///
    /// Idempotent: existing objects have their labels, rules, subjects and
    /// role refs overwritten and everything else left alone.
    pub async fn provision(
        &self,
        release: &ReleaseRef,
        cronjob_namespace: &str,
        service_account: &str,
        delete_namespace: bool,
    ) -> Result<(), TtlError> {
        check_topology(&release.namespace, cronjob_namespace, delete_namespace)?;
        let bundle = Bundle {
            name: release.resource_name()?,
            release,
            cronjob_namespace,
            service_account,
            labels: labels::bundle_labels(&release.name, &release.namespace, cronjob_namespace),
        };

        self.create_or_update(bundle.service_account(), "service account").await?;

        let release_ns = release.namespace.as_str();
        if release_ns == cronjob_namespace {
            let role = bundle.role(release_ns, vec![secrets_rule(), cronjobs_rule()]);
            self.create_or_update(role, "role").await?;
            self.create_or_update(bundle.role_binding(release_ns), "role binding").await?;
        } else {
            let role = bundle.role(release_ns, vec![secrets_rule()]);
            self.create_or_update(role, "role in release namespace").await?;
            let binding = bundle.role_binding(release_ns);
            self.create_or_update(binding, "role binding in release namespace").await?;

            let role = bundle.role(cronjob_namespace, vec![cronjobs_rule()]);
            self.create_or_update(role, "role in CronJob namespace").await?;
            self.create_or_update(
                bundle.role_binding(cronjob_namespace),
                "role binding in CronJob namespace",
            )
            .await?;

            if delete_namespace {
                self.create_or_update(bundle.cluster_role(), "cluster role").await?;
                self.create_or_update(bundle.cluster_role_binding(), "cluster role binding").await?;
            }
        }

        tracing::info!(
            release = %bundle.release,
            cronjob_namespace,
            service_account,
            delete_namespace,
            "provisioned access bundle"
        );
        Ok(())
    }

    /// Delete a release's bundle. Objects that are already gone are skipped.
    pub async fn teardown(
        &self,
        release: &ReleaseRef,
        cronjob_namespace: &str,
    ) -> Result<(), TtlError> {
        let name = release.resource_name()?;

        self.delete_if_present::<ClusterRoleBinding>(None, &name, "cluster role binding").await?;
        self.delete_if_present::<ClusterRole>(None, &name, "cluster role").await?;

        self.delete_namespaced_rbac(&name, &release.namespace).await?;
        if cronjob_namespace != release.namespace {
            self.delete_namespaced_rbac(&name, cronjob_namespace).await?;
        }

        self.delete_if_present::<ServiceAccount>(Some(cronjob_namespace), &name, "service account")
            .await?;

        tracing::info!(release = %release, cronjob_namespace, "tore down access bundle");
        Ok(())
    }

    /// Find managed RBAC objects whose CronJob no longer exists, deleting
    /// each one as it is found unless `dry_run`.
    ///
    /// Cluster-scoped objects come first, then per namespace role bindings,
    /// roles and service accounts.
    pub async fn find_orphans(
        &self,
        scope: SweepScope,
        dry_run: bool,
    ) -> Result<Vec<OrphanedResource>, SweepError> {
        let mut found = Vec::new();
        match self.sweep(scope, dry_run, &mut found).await {
            Ok(()) => Ok(found),
            Err(source) => Err(SweepError { found, source }),
        }
    }

    async fn sweep(
        &self,
        scope: SweepScope,
        dry_run: bool,
        found: &mut Vec<OrphanedResource>,
    ) -> Result<(), TtlError> {
        let namespaces = match scope {
            SweepScope::Namespaces(namespaces) => namespaces,
            SweepScope::AllNamespaces => self
                .cluster
                .list::<Namespace>(None, None)
                .await
                .map_err(|e| TtlError::cluster("list namespaces", e))?
                .into_iter()
                .filter_map(|ns| ns.metadata.name)
                .collect(),
        };

        self.sweep_kind::<ClusterRoleBinding>(None, dry_run, found).await?;
        self.sweep_kind::<ClusterRole>(None, dry_run, found).await?;
        for ns in &namespaces {
            self.sweep_kind::<RoleBinding>(Some(ns), dry_run, found).await?;
            self.sweep_kind::<Role>(Some(ns), dry_run, found).await?;
            self.sweep_kind::<ServiceAccount>(Some(ns), dry_run, found).await?;
        }

        tracing::info!(orphans = found.len(), dry_run, "orphan sweep finished");
        Ok(())
    }

    async fn sweep_kind<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        dry_run: bool,
        found: &mut Vec<OrphanedResource>,
    ) -> Result<(), TtlError> {
        let kind = K::kind_name();
        let selector = labels::managed_selector();
        let objects = self.cluster.list::<K>(namespace, Some(&selector)).await.map_err(|e| {
            let scope = namespace.map(|ns| format!(" in {}", ns)).unwrap_or_default();
            TtlError::cluster(format!("list {}s{}", kind, scope), e)
        })?;

        for object in objects {
            if !self.is_orphaned(object.meta().labels.as_ref()).await {
                continue;
            }
            let name = object.meta().name.clone().unwrap_or_default();
            found.push(OrphanedResource {
                kind: kind.clone(),
                name: name.clone(),
                namespace: namespace.map(String::from),
            });
            if dry_run {
                continue;
            }
            match self.cluster.delete::<K>(namespace, &name, Propagation::Default).await {
                Ok(()) => tracing::info!(%kind, %name, namespace, "deleted orphaned object"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(TtlError::cluster(format!("delete {} {}", kind, name), e)),
            }
        }
        Ok(())
    }

    /// An object is orphaned only when its CronJob is positively gone.
    async fn is_orphaned(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        let Some((release, release_ns, cronjob_ns)) = labels.and_then(owner_cronjob) else {
            return false;
        };
        let Ok(name) = resource_name(&release, &release_ns) else {
            return false;
        };
        match self.cluster.get::<CronJob>(Some(&cronjob_ns), &name).await {
            Ok(_) => false,
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                tracing::warn!(
                    cronjob = %name,
                    namespace = %cronjob_ns,
                    error = %e,
                    "could not check CronJob; keeping its RBAC"
                );
                false
            }
        }
    }

    async fn delete_namespaced_rbac(&self, name: &str, namespace: &str) -> Result<(), TtlError> {
        let what = format!("role binding in namespace {}", namespace);
        self.delete_if_present::<RoleBinding>(Some(namespace), name, &what).await?;
        let what = format!("role in namespace {}", namespace);
        self.delete_if_present::<Role>(Some(namespace), name, &what).await
    }

    async fn delete_if_present<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
        what: &str,
    ) -> Result<(), TtlError> {
        match self.cluster.delete::<K>(namespace, name, Propagation::Default).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(TtlError::cluster(format!("delete {}", what), e)),
        }
    }

    async fn create_or_update<K: Managed>(&self, desired: K, what: &str) -> Result<(), TtlError> {
        let result = match self.cluster.create(&desired).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_already_exists() => self.update(&desired).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| TtlError::cluster(format!("create {}", what), e))
    }

    async fn update<K: Managed>(&self, desired: &K) -> Result<(), ClusterError> {
        let meta = desired.meta();
        let name = meta.name.as_deref().unwrap_or_default();
        let mut existing: K = self.cluster.get(meta.namespace.as_deref(), name).await?;
        existing.adopt(desired);
        self.cluster.replace(&existing).await?;
        tracing::debug!(kind = %K::kind_name(), name, "updated existing object");
        Ok(())
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
