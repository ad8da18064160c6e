// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping labels.
//!
//! Labels are the only link between a TTL CronJob and the RBAC objects
//! created for it; the orphan sweep reads them back to find the CronJob.

use std::collections::BTreeMap;

/// Standard Kubernetes label for resource management.
pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
/// Value of [`MANAGED_BY`] on everything this tool creates.
pub const MANAGED_BY_VALUE: &str = "helm-ttl";
pub const RELEASE: &str = "helm-ttl/release";
pub const RELEASE_NAMESPACE: &str = "helm-ttl/release-namespace";
pub const CRONJOB_NAMESPACE: &str = "helm-ttl/cronjob-namespace";
pub const DELETE_NAMESPACE: &str = "helm-ttl/delete-namespace";
/// Marks Jobs created by `helm-ttl run` rather than by the CronJob controller.
pub const TRIGGERED_BY: &str = "helm-ttl/triggered-by";
pub const TRIGGERED_BY_RUN: &str = "run";

/// Label the Job controller puts on the pods it creates.
pub const JOB_NAME: &str = "job-name";

/// Selector matching every object managed by this tool.
pub fn managed_selector() -> String {
    format!("{}={}", MANAGED_BY, MANAGED_BY_VALUE)
}

/// Labels shared by the RBAC bundle of a release.
pub fn bundle_labels(
    release: &str,
    release_namespace: &str,
    cronjob_namespace: &str,
) -> BTreeMap<String, String> {
    [
        (MANAGED_BY, MANAGED_BY_VALUE),
        (RELEASE, release),
        (RELEASE_NAMESPACE, release_namespace),
        (CRONJOB_NAMESPACE, cronjob_namespace),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Labels for the CronJob and its templates: the bundle labels plus the
/// delete-namespace flag.
pub fn cronjob_labels(
    release: &str,
    release_namespace: &str,
    cronjob_namespace: &str,
    delete_namespace: bool,
) -> BTreeMap<String, String> {
    let mut labels = bundle_labels(release, release_namespace, cronjob_namespace);
    labels.insert(DELETE_NAMESPACE.to_string(), delete_namespace.to_string());
    labels
}

/// Read the delete-namespace flag back from a label map.
pub fn delete_namespace_flag(labels: Option<&BTreeMap<String, String>>) -> bool {
    labels.and_then(|l| l.get(DELETE_NAMESPACE)).is_some_and(|v| v == "true")
}

/// Where the CronJob owning a labelled object lives, if the labels say.
///
/// Objects created before the cronjob-namespace label existed fall back to
/// the release namespace.
pub fn owner_cronjob(labels: &BTreeMap<String, String>) -> Option<(String, String, String)> {
    let release = labels.get(RELEASE)?;
    let release_ns = labels.get(RELEASE_NAMESPACE)?;
    let cronjob_ns = labels
        .get(CRONJOB_NAMESPACE)
        .filter(|ns| !ns.is_empty())
        .unwrap_or(release_ns);
    Some((release.clone(), release_ns.clone(), cronjob_ns.clone()))
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
