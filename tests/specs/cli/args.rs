// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument validation that fails before any cluster call.

use crate::prelude::*;

#[test]
fn no_subcommand_prints_usage() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn set_requires_duration() {
    cli().args(&["set", "myapp"]).fails_with(2).stderr_has("<DURATION>").stdout_is_empty();
}

#[test]
fn unknown_output_format_is_rejected() {
    cli()
        .args(&["get", "myapp", "-o", "xml"])
        .fails_with(2)
        .stderr_has("invalid value 'xml'")
        .stderr_has("text, json, yaml");
}

#[test]
fn run_timeout_must_be_a_plain_duration() {
    cli().args(&["run", "myapp", "--timeout", "7d"]).fails_with(2).stderr_has("--timeout");
}

#[test]
fn unknown_subcommand_is_rejected() {
    cli().args(&["extend", "myapp"]).fails_with(2).stderr_has("unrecognized subcommand");
}
