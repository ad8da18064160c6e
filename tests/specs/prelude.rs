// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fluent wrapper around `assert_cmd` for the specs.

use std::path::PathBuf;

use assert_cmd::Command;

/// Helm plugin variables that would otherwise leak in from the host
const HOST_VARS: [&str; 5] =
    ["HELM_NAMESPACE", "HELM_DRIVER", "HELM_KUBECONTEXT", "KUBECONFIG", "HELM_TTL_LOG"];

pub struct Cli {
    cmd: Command,
}

/// The `helm-ttl` binary lives in another workspace package, so cargo does not
/// export its path to this test. It sits next to the `deps/` directory holding
/// this test executable.
pub fn binary_path() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let target_dir = exe.parent().and_then(|deps| deps.parent()).unwrap();
    let path = target_dir.join(format!("helm-ttl{}", std::env::consts::EXE_SUFFIX));
    assert!(path.is_file(), "{} not built; run the workspace tests", path.display());
    path
}

pub fn cli() -> Cli {
    let mut cmd = Command::new(binary_path());
    for var in HOST_VARS {
        cmd.env_remove(var);
    }
    Cli { cmd }
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Outcome {
        let output = self.cmd.output().unwrap();
        assert!(
            output.status.success(),
            "expected success, got {:?}\n{}",
            output.status,
            stderr(&output)
        );
        Outcome { output }
    }

    pub fn fails_with(mut self, code: i32) -> Outcome {
        let output = self.cmd.output().unwrap();
        assert_eq!(output.status.code(), Some(code), "{}", stderr(&output));
        Outcome { output }
    }
}

pub struct Outcome {
    output: std::process::Output,
}

impl Outcome {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout).to_string();
        assert!(stdout.contains(needle), "stdout missing {:?}:\n{}", needle, stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = stderr(&self.output);
        assert!(stderr.contains(needle), "stderr missing {:?}:\n{}", needle, stderr);
        self
    }

    pub fn stdout_is_empty(self) -> Self {
        similar_asserts::assert_eq!(String::from_utf8_lossy(&self.output.stdout), "");
        self
    }
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
