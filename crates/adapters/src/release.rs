// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helm release lookup.
//!
//! Helm 3 stores each release revision as a Secret (or ConfigMap) in the
//! release namespace, labelled `owner=helm,name=<release>`.

use crate::cluster::{ClusterApi, ClusterError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::str::FromStr;
use thiserror::Error;
use ttl_core::ReleaseRef;

/// Errors from release lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseStoreError {
    #[error("helm driver {0:?} keeps releases outside the cluster and is not supported")]
    UnsupportedDriver(String),
    #[error("unknown helm driver {0:?}; valid drivers: secret, secrets, configmap, configmaps")]
    UnknownDriver(String),
    #[error("failed to look up release {release}: {source}")]
    Lookup {
        release: String,
        #[source]
        source: ClusterError,
    },
}

/// Adapter answering whether a Helm release exists
#[async_trait]
pub trait ReleaseStore: Clone + Send + Sync + 'static {
    async fn exists(&self, release: &ReleaseRef) -> Result<bool, ReleaseStoreError>;
}

/// Helm storage backend, as named by `HELM_DRIVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelmDriver {
    #[default]
    Secrets,
    ConfigMaps,
}

impl FromStr for HelmDriver {
    type Err = ReleaseStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "secret" | "secrets" => Ok(HelmDriver::Secrets),
            "configmap" | "configmaps" => Ok(HelmDriver::ConfigMaps),
            "memory" | "sql" => Err(ReleaseStoreError::UnsupportedDriver(s.to_string())),
            _ => Err(ReleaseStoreError::UnknownDriver(s.to_string())),
        }
    }
}

/// Release store reading Helm's own storage objects through the cluster API.
#[derive(Clone)]
pub struct HelmReleaseStore<C: ClusterApi> {
    cluster: C,
    driver: HelmDriver,
}

impl<C: ClusterApi> HelmReleaseStore<C> {
    pub fn new(cluster: C, driver: HelmDriver) -> Self {
        Self { cluster, driver }
    }
}

fn release_selector(name: &str) -> String {
    format!("owner=helm,name={}", name)
}

#[async_trait]
impl<C: ClusterApi> ReleaseStore for HelmReleaseStore<C> {
    async fn exists(&self, release: &ReleaseRef) -> Result<bool, ReleaseStoreError> {
        let selector = release_selector(&release.name);
        let ns = Some(release.namespace.as_str());
        let found = match self.driver {
            HelmDriver::Secrets => {
                self.cluster.list::<Secret>(ns, Some(&selector)).await.map(|l| !l.is_empty())
            }
            HelmDriver::ConfigMaps => {
                self.cluster.list::<ConfigMap>(ns, Some(&selector)).await.map(|l| !l.is_empty())
            }
        };
        found.map_err(|source| ReleaseStoreError::Lookup { release: release.to_string(), source })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ReleaseStore, ReleaseStoreError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;
    use ttl_core::ReleaseRef;

    /// Fake release store holding a fixed set of releases
    #[derive(Clone, Default)]
    pub struct FakeReleaseStore {
        releases: Arc<Mutex<HashSet<ReleaseRef>>>,
    }

    impl FakeReleaseStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a deployed release
        pub fn add(&self, name: &str, namespace: &str) {
            self.releases.lock().insert(ReleaseRef::new(name, namespace));
        }

        /// Forget a release, as `helm uninstall` would
        pub fn remove(&self, name: &str, namespace: &str) {
            self.releases.lock().remove(&ReleaseRef::new(name, namespace));
        }

        /// Builder form of [`FakeReleaseStore::add`]
        pub fn with_release(self, name: &str, namespace: &str) -> Self {
            self.add(name, namespace);
            self
        }
    }

    #[async_trait]
    impl ReleaseStore for FakeReleaseStore {
        async fn exists(&self, release: &ReleaseRef) -> Result<bool, ReleaseStoreError> {
            Ok(self.releases.lock().contains(release))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReleaseStore;

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
