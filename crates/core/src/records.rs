// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value types shared between the engine and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Helm release, identified by name and namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseRef {
    pub name: String,
    pub namespace: String,
}

impl ReleaseRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }

    /// Name shared by the CronJob and every RBAC object of this release.
    pub fn resource_name(&self) -> Result<String, crate::NameError> {
        crate::resource_name(&self.name, &self.namespace)
    }
}

impl fmt::Display for ReleaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What `get` reports about a scheduled TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlInfo {
    pub release_name: String,
    pub release_namespace: String,
    pub cronjob_namespace: String,
    /// RFC 3339 instant the CronJob fires at.
    pub scheduled_date: String,
    pub cron_schedule: String,
    pub delete_namespace: bool,
}

/// Exit status of one container of a `run` pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResult {
    pub name: String,
    pub exit_code: i32,
}

/// Outcome of a synchronous `run`, gathered even when the run fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub release_name: String,
    pub release_namespace: String,
    pub deleted_namespace: bool,
    pub job_failed: bool,
    /// Init containers first, in pod order.
    pub containers: Vec<ContainerResult>,
}

impl RunResult {
    pub fn for_release(release: &ReleaseRef) -> Self {
        Self {
            release_name: release.name.clone(),
            release_namespace: release.namespace.clone(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, name: impl Into<String>, exit_code: i32) {
        if exit_code != 0 {
            self.job_failed = true;
        }
        self.containers.push(ContainerResult { name: name.into(), exit_code });
    }
}

/// A managed object whose owning CronJob no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedResource {
    pub kind: String,
    pub name: String,
    /// `None` for cluster-scoped objects.
    pub namespace: Option<String>,
}

impl fmt::Display for OrphanedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {} in namespace {}", self.kind, self.name, ns),
            None => write!(f, "{} {} (cluster-scoped)", self.kind, self.name),
        }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
