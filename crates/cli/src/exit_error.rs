// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error carrying the process exit code.
//!
//! Commands return it instead of exiting so `main()` owns termination.

use std::fmt;

/// Generic failure
pub const EXIT_FAILURE: i32 = 1;
/// The teardown Job ran but a container exited non-zero
pub const EXIT_JOB_FAILED: i32 = 2;
/// Waiting for the teardown Job timed out or was interrupted
pub const EXIT_TIMEOUT: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}

/// Exit code for an error returned by a command.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error.downcast_ref::<ExitError>().map_or(EXIT_FAILURE, |e| e.code)
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
