// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm ttl unset`

use anyhow::Result;
use clap::Args;
use std::io::Write;
use ttl_adapters::{ClusterApi, LogFetcher, ReleaseStore};
use ttl_core::{Clock, ReleaseRef};
use ttl_engine::TtlManager;

use crate::config::Config;

#[derive(Debug, Args)]
pub struct UnsetArgs {
    /// Helm release name
    pub release: String,

    /// Namespace of the CronJob (defaults to the release namespace)
    #[arg(long)]
    pub cronjob_namespace: Option<String>,
}

pub async fn handle<C, R, L, K>(
    ttl: &TtlManager<C, R, L, K>,
    config: &Config,
    args: UnsetArgs,
    out: &mut impl Write,
) -> Result<()>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    let release = ReleaseRef::new(args.release, config.release_namespace.clone());
    let cronjob_ns = config.cronjob_namespace(args.cronjob_namespace.as_deref());
    ttl.unset(&release, &cronjob_ns).await?;
    writeln!(
        out,
        "TTL removed for release {:?} in namespace {:?}",
        release.name, release.namespace
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "unset_tests.rs"]
mod tests;
