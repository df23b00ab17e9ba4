// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use std::{
    io,
    process::{ExitStatus, Stdio},
};

/// A to-be-run test process: an argv plus environment overrides.
///
/// Overrides are applied to the child only. The environment of the current process is never
/// modified.
pub(crate) struct TestCommand {
    command: std::process::Command,
}

impl TestCommand {
    /// Creates a new test command. `program` is looked up in `PATH` if it has no directory
    /// component.
    pub(crate) fn new(program: &str, args: &[String], env: &IndexMap<String, String>) -> Self {
        let mut command = std::process::Command::new(program);
        command
            .args(args)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Self { command }
    }

    /// Runs the command to completion, capturing its output.
    pub(crate) fn output(mut self) -> io::Result<ChildOutput> {
        let output = self.command.output()?;
        Ok(ChildOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            returncode: returncode(output.status),
        })
    }
}

/// The captured result of a test process.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChildOutput {
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    /// `None` if no process ran.
    pub(crate) returncode: Option<i32>,
}

impl ChildOutput {
    /// Output for a test that never ran, with stdout set to `stdout`.
    pub(crate) fn synthetic(stdout: &str) -> Self {
        Self {
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
            returncode: None,
        }
    }
}

/// Converts an exit status to a return code. A process killed by signal `n` returns `-n`.
fn returncode(status: ExitStatus) -> Option<i32> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::process::ExitStatusExt;
            status.code().or_else(|| status.signal().map(|signal| -signal))
        } else {
            status.code()
        }
    }
}
