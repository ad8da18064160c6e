// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm ttl cleanup-rbac`

use anyhow::Result;
use clap::Args;
use std::io::Write;
use ttl_adapters::{ClusterApi, LogFetcher, ReleaseStore};
use ttl_core::Clock;
use ttl_engine::{SweepScope, TtlManager};

use crate::config::Config;
use crate::output::format_orphans;

#[derive(Debug, Args)]
pub struct CleanupRbacArgs {
    /// List orphaned resources without deleting them
    #[arg(long)]
    pub dry_run: bool,

    /// Sweep every namespace instead of only the release namespace
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,
}

pub async fn handle<C, R, L, K>(
    ttl: &TtlManager<C, R, L, K>,
    config: &Config,
    args: CleanupRbacArgs,
    out: &mut impl Write,
) -> Result<()>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    let scope = if args.all_namespaces {
        SweepScope::AllNamespaces
    } else {
        SweepScope::Namespaces(vec![config.release_namespace.clone()])
    };

    match ttl.access().find_orphans(scope, args.dry_run).await {
        Ok(orphans) => {
            out.write_all(format_orphans(&orphans, args.dry_run).as_bytes())?;
            Ok(())
        }
        Err(sweep) => {
            for orphan in &sweep.found {
                writeln!(out, "Found {}", orphan)?;
            }
            Err(sweep.source.into())
        }
    }
}

#[cfg(test)]
#[path = "cleanup_rbac_tests.rs"]
mod tests;
