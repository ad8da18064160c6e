// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ttl-core: naming, schedule encoding and shared types for helm-ttl

pub mod clock;
pub mod labels;
pub mod name;
pub mod records;
pub mod schedule;
pub mod time_input;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use name::{resource_name, run_job_name, NameError, MAX_RESOURCE_NAME_LEN};
pub use records::{ContainerResult, OrphanedResource, ReleaseRef, RunResult, TtlInfo};
pub use schedule::{parse_schedule, time_to_schedule, ScheduleError};
pub use time_input::{parse_duration, parse_time_input, TimeInputError, MAX_TTL_DAYS};
