// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm ttl set`

use anyhow::Result;
use clap::Args;
use std::io::Write;
use ttl_adapters::{ClusterApi, LogFetcher, ReleaseStore};
use ttl_core::{Clock, ReleaseRef};
use ttl_engine::{
    SetOptions, TtlManager, DEFAULT_HELM_IMAGE, DEFAULT_KUBECTL_IMAGE, DEFAULT_SERVICE_ACCOUNT,
};

use crate::config::Config;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Helm release name
    pub release: String,

    /// When to uninstall: 30m, 2h, 7d, "2 weeks", "next monday", "in 3 days"
    pub duration: String,

    /// Service account the CronJob runs as
    #[arg(long, default_value = DEFAULT_SERVICE_ACCOUNT)]
    pub service_account: String,

    /// Create the service account and its RBAC instead of requiring it
    #[arg(long)]
    pub create_service_account: bool,

    /// Image providing the helm binary
    #[arg(long, default_value = DEFAULT_HELM_IMAGE)]
    pub helm_image: String,

    /// Image providing the kubectl binary
    #[arg(long, default_value = DEFAULT_KUBECTL_IMAGE)]
    pub kubectl_image: String,

    /// Namespace for the CronJob (defaults to the release namespace)
    #[arg(long)]
    pub cronjob_namespace: Option<String>,

    /// Also delete the release namespace after uninstalling
    #[arg(long)]
    pub delete_namespace: bool,
}

pub async fn handle<C, R, L, K>(
    ttl: &TtlManager<C, R, L, K>,
    config: &Config,
    args: SetArgs,
    out: &mut impl Write,
) -> Result<()>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    let opts = SetOptions {
        cronjob_namespace: config.cronjob_namespace(args.cronjob_namespace.as_deref()),
        release: ReleaseRef::new(args.release, config.release_namespace.clone()),
        duration: args.duration,
        service_account: args.service_account,
        create_service_account: args.create_service_account,
        helm_image: args.helm_image,
        kubectl_image: args.kubectl_image,
        delete_namespace: args.delete_namespace,
    };
    let info = ttl.set(&opts).await?;

    writeln!(
        out,
        "TTL set for release {:?} in namespace {:?}",
        info.release_name, info.release_namespace
    )?;
    writeln!(out, "Scheduled for {} (cron {:?})", info.scheduled_date, info.cron_schedule)?;
    Ok(())
}

#[cfg(test)]
#[path = "set_tests.rs"]
mod tests;
