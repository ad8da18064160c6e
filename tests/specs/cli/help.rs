// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output.

use crate::prelude::*;

#[test]
fn binary_is_taken_from_the_target_dir() {
    let path = binary_path();
    assert_ne!(path.parent().and_then(|p| p.file_name()), Some(std::ffi::OsStr::new("deps")));
    assert!(path.file_stem().is_some_and(|stem| stem == "helm-ttl"), "{}", path.display());
}

#[test]
fn help_lists_every_subcommand() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("set")
        .stdout_has("get")
        .stdout_has("unset")
        .stdout_has("run")
        .stdout_has("cleanup-rbac");
}

#[test]
fn version_matches_package() {
    cli().args(&["--version"]).passes().stdout_has("helm-ttl 0.2.0");
}

#[test]
fn set_help_shows_options() {
    cli()
        .args(&["set", "--help"])
        .passes()
        .stdout_has("<RELEASE>")
        .stdout_has("<DURATION>")
        .stdout_has("--create-service-account")
        .stdout_has("--cronjob-namespace")
        .stdout_has("--delete-namespace")
        .stdout_has("alpine/helm:latest");
}

#[test]
fn get_help_shows_formats() {
    cli()
        .args(&["get", "--help"])
        .passes()
        .stdout_has("text")
        .stdout_has("json")
        .stdout_has("yaml");
}

#[test]
fn run_help_shows_default_timeout() {
    cli().args(&["run", "--help"]).passes().stdout_has("--timeout").stdout_has("10m");
}

#[test]
fn cleanup_help_shows_scope_flags() {
    cli()
        .args(&["cleanup-rbac", "--help"])
        .passes()
        .stdout_has("--dry-run")
        .stdout_has("--all-namespaces");
}

#[test]
fn global_flags_appear_on_subcommands() {
    cli()
        .args(&["unset", "--help"])
        .passes()
        .stdout_has("--namespace")
        .stdout_has("--kube-context")
        .stdout_has("--kubeconfig");
}
