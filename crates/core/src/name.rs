// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic naming for every object owned by a release TTL.

use thiserror::Error;

/// Max length for CronJob names.
///
/// The CronJob controller appends `-<10 digit timestamp>` to name Jobs, and
/// the Job controller appends a 5-char suffix to name Pods. Keeping the
/// CronJob name at 52 leaves room for both inside the 63-char label limit.
pub const MAX_RESOURCE_NAME_LEN: usize = 52;

/// Suffix appended to the one-shot Job created by `helm-ttl run`.
pub const RUN_JOB_SUFFIX: &str = "-run";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error(
        "resource name {name:?} exceeds maximum length of {max} characters (got {len}); \
         use shorter release or namespace names"
    )]
    TooLong { name: String, len: usize, max: usize },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Standard resource name for a release TTL: `<release>-<namespace>-ttl`.
///
/// The same name is shared by the CronJob, the ServiceAccount and every
/// Role/Binding created for the release.
pub fn resource_name(release: &str, namespace: &str) -> Result<String, NameError> {
    if release.is_empty() {
        return Err(NameError::Empty("release name"));
    }
    if namespace.is_empty() {
        return Err(NameError::Empty("release namespace"));
    }

    let name = format!("{}-{}-ttl", release, namespace);
    if name.len() > MAX_RESOURCE_NAME_LEN {
        return Err(NameError::TooLong { len: name.len(), name, max: MAX_RESOURCE_NAME_LEN });
    }
    Ok(name)
}

/// Name of the one-shot Job materialized from a TTL CronJob.
pub fn run_job_name(resource_name: &str) -> String {
    format!("{}{}", resource_name, RUN_JOB_SUFFIX)
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
