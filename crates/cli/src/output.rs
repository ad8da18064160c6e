// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering of command results for stdout.

use clap::ValueEnum;
use ttl_core::{OrphanedResource, RunResult, TtlInfo};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Render a TTL description, always newline-terminated.
pub fn format_ttl_info(info: &TtlInfo, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Release:           {}\n\
             Release Namespace: {}\n\
             CronJob Namespace: {}\n\
             Scheduled Date:    {}\n\
             Cron Schedule:     {}\n\
             Delete Namespace:  {}\n",
            info.release_name,
            info.release_namespace,
            info.cronjob_namespace,
            info.scheduled_date,
            info.cron_schedule,
            yes_no(info.delete_namespace),
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(info)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(info)?),
    }
}

/// Per-container exit codes followed by the namespace outcome.
pub fn format_run_summary(result: &RunResult) -> String {
    let mut out = format!(
        "TTL executed for release {:?} in namespace {:?}\n",
        result.release_name, result.release_namespace
    );
    let width = result.containers.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for container in &result.containers {
        let status = if container.exit_code == 0 { "ok" } else { "failed" };
        out.push_str(&format!(
            "  {:<width$}  exit {:<3} {}\n",
            container.name,
            container.exit_code,
            status,
            width = width
        ));
    }
    if result.deleted_namespace {
        out.push_str(&format!("Namespace {:?} deleted\n", result.release_namespace));
    }
    out
}

/// One line per orphan, or a note that nothing was found.
pub fn format_orphans(orphans: &[OrphanedResource], dry_run: bool) -> String {
    if orphans.is_empty() {
        return "No orphaned resources found\n".to_string();
    }
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    orphans.iter().map(|orphan| format!("{} {}\n", verb, orphan)).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
