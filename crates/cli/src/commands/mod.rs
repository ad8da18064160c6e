// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations
//!
//! Handlers are generic over the engine's adapters and write to the
//! writers they are given, so tests drive them against the fakes.

pub mod cleanup_rbac;
pub mod get;
pub mod run;
pub mod set;
pub mod unset;

#[cfg(test)]
pub(crate) mod test_support;
