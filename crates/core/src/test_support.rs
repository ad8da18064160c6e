// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::ReleaseRef;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for release identities and schedule instants.
pub mod strategies {
    use crate::ReleaseRef;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    /// DNS-label-ish component without hyphens.
    pub fn arb_name_component() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,19}"
    }

    /// Releases whose resource name always fits.
    pub fn arb_release_ref() -> impl Strategy<Value = ReleaseRef> {
        (arb_name_component(), arb_name_component())
            .prop_map(|(name, namespace)| ReleaseRef::new(name, namespace))
    }

    /// Whole-minute instants between 1970 and roughly 2096.
    pub fn arb_minute_instant() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..66_000_000).prop_filter_map("in range", |minutes| {
            DateTime::from_timestamp(minutes * 60, 0)
        })
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// The release used throughout the end-to-end tests.
pub fn myapp_staging() -> ReleaseRef {
    ReleaseRef::new("myapp", "staging")
}
