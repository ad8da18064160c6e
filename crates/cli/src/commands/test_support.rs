// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake-backed manager shared by the command tests.

use chrono::{TimeZone, Utc};
use ttl_adapters::{FakeCluster, FakeLogFetcher, FakeReleaseStore, HelmDriver, JobPods, KubeTarget};
use ttl_core::FakeClock;
use ttl_engine::{TtlConfig, TtlDeps, TtlManager};

use crate::config::Config;

pub(crate) type FakeTtl = TtlManager<FakeCluster, FakeReleaseStore, FakeLogFetcher, FakeClock>;

pub(crate) struct Harness {
    pub cluster: FakeCluster,
    pub releases: FakeReleaseStore,
    pub logs: FakeLogFetcher,
    pub ttl: FakeTtl,
    pub config: Config,
}

/// Release `myapp` installed in `staging`, clock at 2025-06-11T10:00Z.
pub(crate) fn harness(job_pods: JobPods) -> Harness {
    let cluster = FakeCluster::new().with_job_pods(job_pods);
    let releases = FakeReleaseStore::new().with_release("myapp", "staging");
    let logs = FakeLogFetcher::new();
    let deps = TtlDeps { cluster: cluster.clone(), releases: releases.clone(), logs: logs.clone() };
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap());
    let ttl = TtlManager::new(deps, clock, TtlConfig::default());
    let config = Config {
        release_namespace: "staging".to_string(),
        target: KubeTarget::default(),
        driver: HelmDriver::Secrets,
    };
    Harness { cluster, releases, logs, ttl, config }
}

pub(crate) fn text(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}
