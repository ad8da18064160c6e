// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm ttl run`

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ttl_adapters::{ClusterApi, LogFetcher, ReleaseStore};
use ttl_core::{Clock, ReleaseRef};
use ttl_engine::{TtlError, TtlManager};

use crate::config::Config;
use crate::exit_error::{ExitError, EXIT_JOB_FAILED, EXIT_TIMEOUT};
use crate::output::format_run_summary;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Helm release name
    pub release: String,

    /// Namespace of the CronJob (defaults to the release namespace)
    #[arg(long)]
    pub cronjob_namespace: Option<String>,

    /// How long to wait for the teardown Job, e.g. 10m or 1h30m
    #[arg(long, default_value = "10m", value_parser = parse_timeout)]
    pub timeout: Duration,
}

fn parse_timeout(input: &str) -> Result<Duration, String> {
    let delta = ttl_core::parse_duration(input).map_err(|e| e.to_string())?;
    delta.to_std().map_err(|e| e.to_string())
}

/// Container logs go to `out` as they complete, warnings to `err`.
pub async fn handle<C, R, L, K>(
    ttl: &TtlManager<C, R, L, K>,
    config: &Config,
    args: RunArgs,
    cancel: &CancellationToken,
    out: &mut (impl Write + Send),
    err: &mut impl Write,
) -> Result<()>
where
    C: ClusterApi,
    R: ReleaseStore,
    L: LogFetcher,
    K: Clock,
{
    let release = ReleaseRef::new(args.release, config.release_namespace.clone());
    let cronjob_ns = config.cronjob_namespace(args.cronjob_namespace.as_deref());

    if !ttl.release_exists(&release).await? {
        writeln!(
            err,
            "Warning: release {:?} not found in namespace {:?}; cleaning up its TTL anyway",
            release.name, release.namespace
        )?;
    }

    let cancel = cancel.child_token();
    let deadline = cancel.clone();
    let timeout = args.timeout;
    let timer = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        deadline.cancel();
    });
    let (result, error) = ttl.run_now(&release, &cronjob_ns, &mut *out, &cancel).await;
    timer.abort();

    let ran = matches!(
        error,
        None | Some(
            TtlError::JobFailed
                | TtlError::PodWaitTimeout { .. }
                | TtlError::ContainerWaitTimeout { .. }
        )
    );
    if ran {
        out.write_all(format_run_summary(&result).as_bytes())?;
    }

    match error {
        None => Ok(()),
        Some(TtlError::JobFailed) => Err(ExitError::new(
            EXIT_JOB_FAILED,
            format!("teardown of release {:?} failed; see container logs above", release.name),
        )
        .into()),
        Some(e @ (TtlError::PodWaitTimeout { .. } | TtlError::ContainerWaitTimeout { .. })) => {
            Err(ExitError::new(EXIT_TIMEOUT, e.to_string()).into())
        }
        Some(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
