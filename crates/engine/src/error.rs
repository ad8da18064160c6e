// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by TTL operations.

use crate::template::TemplateError;
use std::fmt::Display;
use thiserror::Error;
use ttl_adapters::{ClusterError, ReleaseStoreError};
use ttl_core::{NameError, ScheduleError, TimeInputError};

/// Errors from lifecycle, access and run operations
#[derive(Debug, Error)]
pub enum TtlError {
    #[error("release {release:?} not found in namespace {namespace:?}")]
    ReleaseNotFound { release: String, namespace: String },
    #[error("no TTL set for release {release:?} in namespace {namespace:?}")]
    TtlNotFound { release: String, namespace: String },
    #[error(
        "service account {name:?} not found in namespace {namespace:?}; \
         use --create-service-account to create it"
    )]
    ServiceAccountNotFound { name: String, namespace: String },
    #[error("failed to check service account {name:?}: {source}")]
    ServiceAccountCheckFailed {
        name: String,
        #[source]
        source: ClusterError,
    },
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] TimeInputError),
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),
    #[error(transparent)]
    ReleaseLookup(#[from] ReleaseStoreError),
    #[error("failed to {action}: {source}")]
    Cluster {
        action: String,
        #[source]
        source: ClusterError,
    },
    #[error("timed out waiting for pod (job {job})")]
    PodWaitTimeout { job: String },
    #[error("timed out waiting for container {container} in pod {pod}")]
    ContainerWaitTimeout { pod: String, container: String },
    #[error("job failed: one or more containers exited with non-zero status")]
    JobFailed,
}

impl TtlError {
    /// Wrap a cluster failure with the operation that was attempted.
    pub fn cluster(action: impl Into<String>, source: ClusterError) -> Self {
        TtlError::Cluster { action: action.into(), source }
    }

    /// Whether the error means "nothing to operate on" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TtlError::ReleaseNotFound { .. }
                | TtlError::TtlNotFound { .. }
                | TtlError::ServiceAccountNotFound { .. }
        )
    }
}

/// Log a failed step whose outcome must not fail the surrounding operation.
///
/// Returns the value on success so callers can still record it.
pub(crate) fn best_effort<T, E: Display>(step: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "best-effort step failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
