// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm ttl get`

use anyhow::Result;
use clap::Args;
use std::io::Write;
use ttl_adapters::{ClusterApi, LogFetcher, ReleaseStore};
use ttl_core::{Clock, ReleaseRef};
use ttl_engine::TtlManager;

use crate::config::Config;
use crate::output::{format_ttl_info, OutputFormat};

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Helm release name
    pub release: String,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Namespace of the CronJob (defaults to the release namespace)
    #[arg(long)]
    pub cronjob_namespace: Option<String>,
}

pub async fn handle<C, R, L, K>(
    ttl: &TtlManager<C, R, L, K>,
    config: &Config,
    args: GetArgs,
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
    let info = ttl.get(&release, &cronjob_ns).await?;
    out.write_all(format_ttl_info(&info, args.format)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
#[path = "get_tests.rs"]
mod tests;
