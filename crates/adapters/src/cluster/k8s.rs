// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster adapter backed by kube-rs.

use super::{ClusterApi, ClusterError, ClusterObject, Propagation};
use async_trait::async_trait;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::Client;

/// Cluster adapter talking to a real API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a kube error onto the adapter's taxonomy.
fn map_error<K: ClusterObject>(verb: &str, name: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => {
            ClusterError::NotFound { kind: K::kind_name(), name: name.to_string() }
        }
        kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
            ClusterError::AlreadyExists { kind: K::kind_name(), name: name.to_string() }
        }
        other => ClusterError::Request(format!(
            "failed to {} {} {:?}: {}",
            verb,
            K::kind_name(),
            name,
            other
        )),
    }
}

fn object_key<K: ClusterObject>(object: &K) -> (Option<&str>, &str) {
    let meta = object.meta();
    (meta.namespace.as_deref(), meta.name.as_deref().unwrap_or_default())
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn get<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<K, ClusterError> {
        K::api(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| map_error::<K>("get", name, e))
    }

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError> {
        let (namespace, name) = object_key(object);
        tracing::debug!(kind = %K::kind_name(), ?namespace, %name, "creating object");
        K::api(self.client.clone(), namespace)
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| map_error::<K>("create", name, e))
    }

    async fn replace<K: ClusterObject>(&self, object: &K) -> Result<K, ClusterError> {
        let (namespace, name) = object_key(object);
        tracing::debug!(kind = %K::kind_name(), ?namespace, %name, "replacing object");
        K::api(self.client.clone(), namespace)
            .replace(name, &PostParams::default(), object)
            .await
            .map_err(|e| map_error::<K>("replace", name, e))
    }

    async fn delete<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        name: &str,
        propagation: Propagation,
    ) -> Result<(), ClusterError> {
        let dp = match propagation {
            Propagation::Default => DeleteParams::default(),
            Propagation::Background => DeleteParams::background(),
        };
        tracing::debug!(kind = %K::kind_name(), ?namespace, %name, "deleting object");
        K::api(self.client.clone(), namespace)
            .delete(name, &dp)
            .await
            .map(|_| ())
            .map_err(|e| map_error::<K>("delete", name, e))
    }

    async fn list<K: ClusterObject>(
        &self,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Vec<K>, ClusterError> {
        let lp = match selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        };
        K::api(self.client.clone(), namespace)
            .list(&lp)
            .await
            .map(|list| list.items)
            .map_err(|e| map_error::<K>("list", namespace.unwrap_or("*"), e))
    }
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
