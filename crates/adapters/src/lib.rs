// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ttl-adapters: cluster, log and release-store adapters for helm-ttl

pub mod client;
pub mod cluster;
pub mod logs;
pub mod release;

pub use client::{ClientError, KubeTarget};
pub use cluster::{ClusterApi, ClusterError, ClusterObject, KubeCluster, Propagation};
pub use logs::{KubeLogFetcher, LogError, LogFetcher};
pub use release::{HelmDriver, HelmReleaseStore, ReleaseStore, ReleaseStoreError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use cluster::{ClusterCall, FakeCluster, JobPods, Verb};
#[cfg(any(test, feature = "test-support"))]
pub use logs::{FakeLogFetcher, LogCall};
#[cfg(any(test, feature = "test-support"))]
pub use release::FakeReleaseStore;
