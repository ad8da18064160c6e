// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ttl-engine: CronJob templates, RBAC provisioning and the TTL lifecycle

pub mod access;
pub mod error;
pub mod lifecycle;
mod run;
pub mod template;

pub use access::{Access, SweepError, SweepScope};
pub use error::TtlError;
pub use lifecycle::{SetOptions, TtlConfig, TtlDeps, TtlManager, DEFAULT_SERVICE_ACCOUNT};
pub use template::{
    build_cron_job, build_job_from_cron_job, CronJobOptions, TemplateError, DEFAULT_HELM_IMAGE,
    DEFAULT_KUBECTL_IMAGE,
};
