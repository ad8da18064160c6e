// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection and namespace settings resolved from flags and the Helm
//! plugin environment.

use crate::env::HelmEnv;
use clap::Args;
use std::path::PathBuf;
use ttl_adapters::{HelmDriver, KubeTarget, ReleaseStoreError};

const DEFAULT_NAMESPACE: &str = "default";

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Kubernetes context to use (defaults to $HELM_KUBECONTEXT)
    #[arg(long, global = true)]
    pub kube_context: Option<String>,

    /// Path to the kubeconfig file (defaults to $KUBECONFIG)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace of the Helm release (defaults to $HELM_NAMESPACE)
    #[arg(
        short = 'n',
        long = "namespace",
        visible_alias = "release-namespace",
        global = true
    )]
    pub namespace: Option<String>,

    /// Log filter, e.g. `debug` or `ttl_engine=trace` (defaults to $HELM_TTL_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub release_namespace: String,
    pub target: KubeTarget,
    pub driver: HelmDriver,
}

impl Config {
    /// Flags win over the environment, which wins over defaults.
    pub fn resolve(args: &GlobalArgs, env: &HelmEnv) -> Result<Self, ReleaseStoreError> {
        let release_namespace = args
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .or_else(|| env.namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let kubeconfig = match &args.kubeconfig {
            Some(path) => vec![path.clone()],
            None => env.kubeconfig.clone(),
        };
        let context = args.kube_context.clone().or_else(|| env.kube_context.clone());

        let driver = match &env.driver {
            Some(driver) => driver.parse()?,
            None => HelmDriver::default(),
        };

        Ok(Self { release_namespace, target: KubeTarget { kubeconfig, context }, driver })
    }

    /// Namespace for the CronJob, defaulting to the release namespace.
    pub fn cronjob_namespace(&self, flag: Option<&str>) -> String {
        match flag {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => self.release_namespace.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
