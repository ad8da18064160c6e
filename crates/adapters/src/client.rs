// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes client construction from explicit connection settings.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from client construction
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to read kubeconfig {path}: {message}")]
    Kubeconfig { path: String, message: String },
    #[error("failed to load cluster configuration: {0}")]
    Config(String),
    #[error("failed to create kube client: {0}")]
    Client(#[from] kube::Error),
}

/// Where to find the cluster.
///
/// Empty settings fall back to kube's own inference (`$KUBECONFIG`,
/// `~/.kube/config`, then in-cluster service account).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeTarget {
    /// Kubeconfig files, merged in order
    pub kubeconfig: Vec<PathBuf>,
    /// Context to use instead of the current-context
    pub context: Option<String>,
}

impl KubeTarget {
    /// Resolve the target into a client configuration.
    pub async fn config(&self) -> Result<Config, ClientError> {
        let options = KubeConfigOptions { context: self.context.clone(), ..Default::default() };
        let mut config = match (self.kubeconfig.as_slice(), &self.context) {
            ([], None) => Config::infer().await.map_err(|e| ClientError::Config(e.to_string()))?,
            ([], Some(_)) => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ClientError::Config(e.to_string()))?,
            (paths, _) => {
                let kubeconfig = read_kubeconfigs(paths)?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ClientError::Config(e.to_string()))?
            }
        };
        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);
        Ok(config)
    }

    /// Build a client for the target.
    pub async fn client(&self) -> Result<Client, ClientError> {
        let config = self.config().await?;
        tracing::debug!(cluster = %config.cluster_url, "connecting to cluster");
        Ok(Client::try_from(config)?)
    }
}

fn read_kubeconfigs(paths: &[PathBuf]) -> Result<Kubeconfig, ClientError> {
    let mut merged: Option<Kubeconfig> = None;
    for path in paths {
        let read_error = |message: String| ClientError::Kubeconfig {
            path: path.display().to_string(),
            message,
        };
        let next = Kubeconfig::read_from(path).map_err(|e| read_error(e.to_string()))?;
        merged = Some(match merged {
            Some(current) => current.merge(next).map_err(|e| read_error(e.to_string()))?,
            None => next,
        });
    }
    merged.ok_or_else(|| ClientError::Config("no kubeconfig files given".to_string()))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
