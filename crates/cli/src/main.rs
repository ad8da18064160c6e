// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `helm-ttl`: schedule automatic teardown of Helm releases.
//!
//! Runs as a Helm plugin (`helm ttl ...`) or standalone.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod config;
mod env;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use ttl_adapters::{HelmReleaseStore, KubeCluster, KubeLogFetcher};
use ttl_core::SystemClock;
use ttl_engine::{TtlConfig, TtlDeps, TtlManager};

use crate::commands::{cleanup_rbac, get, run, set, unset};
use crate::config::{Config, GlobalArgs};
use crate::env::HelmEnv;

/// Manager wired to a live cluster
type HelmTtl = TtlManager<KubeCluster, HelmReleaseStore<KubeCluster>, KubeLogFetcher, SystemClock>;

#[derive(Parser)]
#[command(
    name = "helm-ttl",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("HELM_TTL_GIT_HASH"), ")"),
    about = "Schedule automatic teardown of Helm releases"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a release to be uninstalled after a duration
    Set(set::SetArgs),
    /// Show the TTL scheduled for a release
    Get(get::GetArgs),
    /// Remove a release's TTL and its RBAC
    Unset(unset::UnsetArgs),
    /// Uninstall a release now using its TTL, waiting for completion
    Run(run::RunArgs),
    /// Remove RBAC objects whose TTL CronJob no longer exists
    CleanupRbac(cleanup_rbac::CleanupRbacArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.log_level.clone().or_else(env::log_filter));

    // Library errors already embed their causes in their messages
    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(exit_error::exit_code(&e));
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging(level: Option<String>) {
    let level = level.unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::resolve(&cli.global, &HelmEnv::read())?;
    let ttl = connect(&config).await?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Set(args) => set::handle(&ttl, &config, args, &mut stdout).await,
        Commands::Get(args) => get::handle(&ttl, &config, args, &mut stdout).await,
        Commands::Unset(args) => unset::handle(&ttl, &config, args, &mut stdout).await,
        Commands::Run(args) => {
            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted; cleaning up");
                    interrupt.cancel();
                }
            });
            run::handle(&ttl, &config, args, &cancel, &mut stdout, &mut std::io::stderr()).await
        }
        Commands::CleanupRbac(args) => cleanup_rbac::handle(&ttl, &config, args, &mut stdout).await,
    }
}

async fn connect(config: &Config) -> Result<HelmTtl> {
    let client = config.target.client().await?;
    tracing::debug!(namespace = %config.release_namespace, driver = ?config.driver, "connected");

    let cluster = KubeCluster::new(client.clone());
    let deps = TtlDeps {
        releases: HelmReleaseStore::new(cluster.clone(), config.driver),
        logs: KubeLogFetcher::new(client),
        cluster,
    };
    Ok(TtlManager::new(deps, SystemClock, TtlConfig::default()))
}
