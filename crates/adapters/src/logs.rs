// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container log retrieval.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams};
use kube::Client;
use thiserror::Error;

/// Errors from log retrieval
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("failed to fetch logs for {pod}/{container}: {message}")]
    FetchFailed { pod: String, container: String, message: String },
}

/// Adapter for reading the output of a finished container
#[async_trait]
pub trait LogFetcher: Clone + Send + Sync + 'static {
    async fn fetch(&self, namespace: &str, pod: &str, container: &str) -> Result<String, LogError>;
}

/// Log fetcher using the pod `log` subresource.
#[derive(Clone)]
pub struct KubeLogFetcher {
    client: Client,
}

impl KubeLogFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogFetcher for KubeLogFetcher {
    async fn fetch(&self, namespace: &str, pod: &str, container: &str) -> Result<String, LogError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams { container: Some(container.to_string()), ..Default::default() };
        pods.logs(pod, &lp).await.map_err(|e| LogError::FetchFailed {
            pod: pod.to_string(),
            container: container.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{LogError, LogFetcher};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    /// Recorded log fetch
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LogCall {
        pub namespace: String,
        pub pod: String,
        pub container: String,
    }

    #[derive(Default)]
    struct FakeLogState {
        logs: HashMap<String, String>,
        failing: HashSet<String>,
        calls: Vec<LogCall>,
    }

    /// Fake log fetcher keyed by container name
    #[derive(Clone, Default)]
    pub struct FakeLogFetcher {
        inner: Arc<Mutex<FakeLogState>>,
    }

    impl FakeLogFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the log returned for a container
        pub fn set_log(&self, container: &str, log: &str) {
            self.inner.lock().logs.insert(container.to_string(), log.to_string());
        }

        /// Make fetches for a container fail
        pub fn fail(&self, container: &str) {
            self.inner.lock().failing.insert(container.to_string());
        }

        /// Get all recorded fetches
        pub fn calls(&self) -> Vec<LogCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl LogFetcher for FakeLogFetcher {
        async fn fetch(
            &self,
            namespace: &str,
            pod: &str,
            container: &str,
        ) -> Result<String, LogError> {
            let mut state = self.inner.lock();
            state.calls.push(LogCall {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                container: container.to_string(),
            });
            if state.failing.contains(container) {
                return Err(LogError::FetchFailed {
                    pod: pod.to_string(),
                    container: container.to_string(),
                    message: "log backend unavailable".to_string(),
                });
            }
            Ok(state.logs.get(container).cloned().unwrap_or_default())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLogFetcher, LogCall};

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
