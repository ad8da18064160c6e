// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.
//!
//! Helm exports these to plugins. They are read once in `main`; nothing
//! below the CLI looks at the environment.

use std::path::PathBuf;

/// Log filter override, e.g. `HELM_TTL_LOG=debug` or `HELM_TTL_LOG=ttl_engine=trace`
pub const LOG_ENV: &str = "HELM_TTL_LOG";

/// Snapshot of the Helm plugin environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelmEnv {
    /// `HELM_NAMESPACE`
    pub namespace: Option<String>,
    /// `HELM_DRIVER`
    pub driver: Option<String>,
    /// `HELM_KUBECONTEXT`
    pub kube_context: Option<String>,
    /// `KUBECONFIG`, split on the platform path separator
    pub kubeconfig: Vec<PathBuf>,
}

impl HelmEnv {
    pub fn read() -> Self {
        Self {
            namespace: non_empty("HELM_NAMESPACE"),
            driver: non_empty("HELM_DRIVER"),
            kube_context: non_empty("HELM_KUBECONTEXT"),
            kubeconfig: kubeconfig_paths(),
        }
    }
}

/// Log filter from [`LOG_ENV`]
pub fn log_filter() -> Option<String> {
    non_empty(LOG_ENV)
}

fn kubeconfig_paths() -> Vec<PathBuf> {
    std::env::var_os("KUBECONFIG")
        .map(|value| {
            std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()).collect()
        })
        .unwrap_or_default()
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
