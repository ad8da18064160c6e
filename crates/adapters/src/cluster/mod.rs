// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster API seam.
//!
//! Everything the engine does to the cluster goes through [`ClusterApi`]:
//! typed get/create/replace/delete/list keyed by (namespace, name), with
//! "not found" and "already exists" distinguishable from other failures.

mod k8s;

pub use k8s::KubeCluster;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::api::Api;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use thiserror::Error;

/// Errors from cluster operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: String, name: String },
    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: String, name: String },
    #[error("{0}")]
    Request(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }
}

/// How dependents of a deleted object are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Server default for the kind
    #[default]
    Default,
    /// Delete the owner now, garbage-collect dependents afterwards
    Background,
}

/// A Kubernetes object kind the cluster seam knows how to address.
pub trait ClusterObject:
    Resource<DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Whether objects of this kind live inside a namespace.
    const NAMESPACED: bool;

    /// A typed API handle; `None` addresses every namespace (or the cluster
    /// scope for cluster-scoped kinds).
    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;

    fn kind_name() -> String {
        Self::kind(&()).into_owned()
    }
}

macro_rules! namespaced_objects {
    ($($ty:ty),* $(,)?) => {$(
        impl ClusterObject for $ty {
            const NAMESPACED: bool = true;

            fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
                match namespace {
                    Some(ns) => Api::namespaced(client, ns),
                    None => Api::all(client),
                }
            }
        }
    )*};
}

macro_rules! cluster_objects {
    ($($ty:ty),* $(,)?) => {$(
        impl ClusterObject for $ty {
            const NAMESPACED: bool = false;

            fn api(client: Client, _namespace: Option<&str>) -> Api<Self> {
                Api::all(client)
            }
        }
    )*};
}

namespaced_objects!(CronJob, Job, Pod, ServiceAccount, Role, RoleBinding, Secret, ConfigMap);
cluster_objects!(ClusterRole, ClusterRoleBinding, Namespace);

/// Adapter for the Kubernetes API server
///
/// `create` and `replace` read the namespace and name from the object's
/// metadata. `namespace` arguments are ignored for cluster-scoped kinds.
#[async_trait]
pub trait ClusterApi: Clone + Send + Sync + 'static {
    async fn get<K: ClusterObject>(&self, namespace: Option<&str>, name: &str)
        -> Result<K, ClusterError>;

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError>;

    async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError>;

    async fn delete<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError>;

    /// List objects, optionally filtered by an equality label selector
    /// (`k1=v1,k2=v2`). `namespace = None` lists across all namespaces.
    async fn list<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<K>, ClusterError>;
}

/// Whether `labels` satisfy an equality-based selector such as `a=b,c=d`.
///
/// Bare keys in the selector only require the label to be present.
pub fn selector_matches(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    selector.split(',').map(str::trim).filter(|term| !term.is_empty()).all(|term| {
        match term.split_once('=') {
            Some((key, value)) => {
                labels.and_then(|l| l.get(key.trim())).map(String::as_str) == Some(value.trim())
            }
            None => labels.is_some_and(|l| l.contains_key(term)),
        }
    })
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClusterCall, FakeCluster, JobPods, Verb};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
