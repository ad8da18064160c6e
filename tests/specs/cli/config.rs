// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors surface before the cluster is contacted.

use crate::prelude::*;

#[test]
fn unsupported_helm_driver_fails() {
    cli()
        .args(&["get", "myapp"])
        .env("HELM_DRIVER", "sql")
        .fails_with(1)
        .stderr_has("Error: helm driver \"sql\"")
        .stdout_is_empty();
}

#[test]
fn unknown_helm_driver_fails() {
    cli()
        .args(&["unset", "myapp"])
        .env("HELM_DRIVER", "etcd")
        .fails_with(1)
        .stderr_has("unknown helm driver \"etcd\"");
}

#[test]
fn missing_kubeconfig_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    cli()
        .args(&["get", "myapp", "--kubeconfig", missing.to_str().unwrap()])
        .fails_with(1)
        .stderr_has("failed to read kubeconfig")
        .stdout_is_empty();
}
