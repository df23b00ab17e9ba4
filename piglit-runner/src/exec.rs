// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running external test executables and classifying their outcome.
//!
//! [`ExecTest`] spawns a process, retries it if it hit a known windowing-system glitch, and turns
//! its exit code and output into a [`ResultRecord`]. The output itself is interpreted by an
//! [`InterpretResult`] implementation, [`PiglitProtocol`] by default.

use crate::{
    config::ExecEnvironment,
    errors::{CommandParseError, RunError},
    platform::{Platform, check_for_skip_scenario},
    protocol::{InterpretResult, PiglitProtocol},
    test_case::{TestCase, TestOutput},
    test_command::{ChildOutput, TestCommand},
};
use bstr::ByteSlice;
use camino::Utf8Path;
use indexmap::IndexMap;
use piglit_metadata::{CrashCode, ResultRecord, TestStatus};
use std::{fmt, io};
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// Output that marks a run as having hit a spurious window resize.
///
/// Some window managers resize windows right after they're mapped, which makes tests that read
/// back the framebuffer fail. Tests print this marker when they detect it, and are re-run. This
/// is a workaround for one specific defect, not a general retry policy.
pub const SPURIOUS_WINDOW_RESIZE_MARKER: &str = "Got spurious window resize";

/// The maximum number of times a test is run while it reports
/// [`SPURIOUS_WINDOW_RESIZE_MARKER`]. The output of the last attempt is accepted as-is.
pub const MAX_ATTEMPTS: usize = 5;

/// The command prepended to tests run under valgrind.
pub const VALGRIND_PREFIX: &[&str] = &[
    "valgrind",
    "--quiet",
    "--error-exitcode=1",
    "--tool=memcheck",
];

/// The output synthesized for a test skipped on the current platform.
pub const SKIP_OUTPUT: &str = "PIGLIT: {'result': 'skip'}\n";

/// The output synthesized for a test whose executable doesn't exist.
///
/// Different build configurations produce different sets of test executables, so a missing
/// executable is a skip rather than a failure.
pub const NOT_FOUND_OUTPUT: &str = "PIGLIT: {'result': 'skip'}\nTest executable not found.\n";

/// A test that runs an external executable.
#[derive(Clone, Debug)]
pub struct ExecTest<I = PiglitProtocol> {
    command: Vec<String>,
    env: IndexMap<String, String>,
    skip_test: bool,
    run_concurrent: bool,
    interpreter: I,
}

impl ExecTest {
    /// Creates a new test from an argv.
    ///
    /// Whether the test is skipped on `platform` is decided here, once.
    pub fn new(command: Vec<String>, platform: &Platform) -> Self {
        let skip_test = check_for_skip_scenario(platform, &command);
        Self {
            command,
            env: IndexMap::new(),
            skip_test,
            run_concurrent: false,
            interpreter: PiglitProtocol,
        }
    }

    /// Creates a new test from a shell-like command string, e.g. `"glsl-fs-loop -auto"`.
    ///
    /// Quoting is respected when splitting the string into arguments.
    pub fn from_shell(command: &str, platform: &Platform) -> Result<Self, CommandParseError> {
        Ok(Self::new(split_command(command)?, platform))
    }
}

impl<I> ExecTest<I> {
    /// Adds an environment variable that's set for the test process only.
    ///
    /// Setting the same key twice replaces the earlier value while keeping its position.
    pub fn with_env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.env.insert(key.into(), value.to_string());
        self
    }

    /// Replaces the interpreter used to turn the test's output into a result.
    pub fn with_interpreter<J>(self, interpreter: J) -> ExecTest<J> {
        ExecTest {
            command: self.command,
            env: self.env,
            skip_test: self.skip_test,
            run_concurrent: self.run_concurrent,
            interpreter,
        }
    }

    /// Marks whether this test may run alongside other tests.
    pub fn with_run_concurrent(mut self, run_concurrent: bool) -> Self {
        self.run_concurrent = run_concurrent;
        self
    }

    /// The argv for this test, not including any valgrind prefix.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Environment overrides for this test.
    pub fn env(&self) -> &IndexMap<String, String> {
        &self.env
    }

    /// Returns true if this test is skipped on the platform it was created for.
    pub fn skip_test(&self) -> bool {
        self.skip_test
    }
}

impl<I: InterpretResult> ExecTest<I> {
    /// Runs the test process and classifies the outcome.
    ///
    /// The only error returned is a failure to spawn the process for a reason other than the
    /// executable not existing.
    pub fn run_command(&self, env: &ExecEnvironment) -> Result<ResultRecord, RunError> {
        if self.command.is_empty() {
            return Ok(ResultRecord::with_result(TestStatus::Skip));
        }

        let command = self.effective_command(env);
        let output = if self.skip_test {
            debug!("skipping `{}` on platform `{}`", command.join(" "), env.platform);
            ChildOutput::synthetic(SKIP_OUTPUT)
        } else {
            self.run_with_retries(&command[0], &command[1..])?
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut record = ResultRecord::new();
        let stdout = if self.skip_test {
            record.result = Some(TestStatus::Skip);
            stdout.into_owned()
        } else {
            record.result = Some(TestStatus::Fail);
            self.interpreter
                .interpret_result(&stdout, output.returncode, &mut record)
        };

        match output.returncode {
            Some(returncode) if CrashCode::is_crash(returncode) => {
                record.result = Some(TestStatus::Crash);
            }
            Some(returncode) if returncode != 0 => {
                record.note = Some(format!("Returncode was {returncode}"));
            }
            _ => {}
        }

        if env.valgrind {
            record.result = Some(valgrind_result(record.status(), output.returncode));
        }

        if !self.env.is_empty() {
            record.environment = Some(environment_string(&self.env));
        }
        record.info = Some(format!(
            "Returncode: {}\n\nErrors:\n{stderr}\n\nOutput:\n{stdout}",
            DisplayReturncode(output.returncode),
        ));
        record.returncode = output.returncode;
        record.command = Some(command.join(" "));

        Ok(record)
    }

    fn effective_command(&self, env: &ExecEnvironment) -> Vec<String> {
        if env.valgrind {
            VALGRIND_PREFIX
                .iter()
                .map(|arg| (*arg).to_owned())
                .chain(self.command.iter().cloned())
                .collect()
        } else {
            self.command.clone()
        }
    }

    fn run_with_retries(&self, program: &str, args: &[String]) -> Result<ChildOutput, RunError> {
        let mut attempt = 1;
        loop {
            debug!(attempt, "running `{program}`");
            let output = self.spawn(program, args)?;
            if !output.stdout.contains_str(SPURIOUS_WINDOW_RESIZE_MARKER) {
                return Ok(output);
            }

            if attempt >= MAX_ATTEMPTS {
                warn!(
                    "`{program}` reported a spurious window resize on all {MAX_ATTEMPTS} \
                     attempts, accepting the last result"
                );
                return Ok(output);
            }
            debug!(attempt, "spurious window resize, retrying");
            attempt += 1;
        }
    }

    fn spawn(&self, program: &str, args: &[String]) -> Result<ChildOutput, RunError> {
        match TestCommand::new(program, args, &self.env).output() {
            Ok(output) => Ok(output),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("test executable `{program}` not found");
                Ok(ChildOutput::synthetic(NOT_FOUND_OUTPUT))
            }
            Err(error) => {
                let command = std::iter::once(program).chain(args.iter().map(String::as_str));
                Err(RunError::Spawn {
                    command: shell_words::join(command),
                    error,
                })
            }
        }
    }
}

impl<I: InterpretResult> TestCase for ExecTest<I> {
    fn run(&self, env: &ExecEnvironment) -> Result<TestOutput, RunError> {
        self.run_command(env).map(TestOutput::Record)
    }

    fn runs_concurrently(&self) -> bool {
        self.run_concurrent
    }
}

/// A test that runs a native piglit test executable from the test binary directory.
#[derive(Clone, Debug)]
pub struct PlainExecTest<I = PiglitProtocol> {
    inner: ExecTest<I>,
}

impl PlainExecTest {
    /// Creates a new test, resolving `command[0]` relative to `test_bin_dir`.
    pub fn new(mut command: Vec<String>, test_bin_dir: &Utf8Path, platform: &Platform) -> Self {
        // The skip rules only look at the executable name, so they're unaffected by the prefix.
        if let Some(program) = command.first_mut() {
            *program = test_bin_dir.join(program.as_str()).into_string();
        }
        Self {
            inner: ExecTest::new(command, platform),
        }
    }
}

impl<I> PlainExecTest<I> {
    /// Returns the underlying test.
    pub fn inner(&self) -> &ExecTest<I> {
        &self.inner
    }

    /// Applies `f` to the underlying test, e.g. to add environment overrides.
    pub fn map<J>(self, f: impl FnOnce(ExecTest<I>) -> ExecTest<J>) -> PlainExecTest<J> {
        PlainExecTest {
            inner: f(self.inner),
        }
    }
}

impl<I: InterpretResult> TestCase for PlainExecTest<I> {
    fn run(&self, env: &ExecEnvironment) -> Result<TestOutput, RunError> {
        self.inner.run(env)
    }

    fn runs_concurrently(&self) -> bool {
        self.inner.runs_concurrently()
    }
}

/// Splits a shell-like command string into an argv, respecting quoting.
pub fn split_command(command: &str) -> Result<Vec<String>, CommandParseError> {
    shell_words::split(command).map_err(|err| CommandParseError::new(command, err))
}

/// Remaps a result for a test run under valgrind.
///
/// A test that doesn't pass on its own says nothing about memory errors, so it's skipped. A
/// passing test fails if valgrind reported errors through the exit code.
pub fn valgrind_result(result: TestStatus, returncode: Option<i32>) -> TestStatus {
    match (result, returncode) {
        (TestStatus::Pass, Some(0)) => TestStatus::Pass,
        (TestStatus::Pass, _) => TestStatus::Fail,
        _ => TestStatus::Skip,
    }
}

fn environment_string(env: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in env {
        swrite!(out, "{key}=\"{value}\" ");
    }
    out
}

struct DisplayReturncode(Option<i32>);

impl fmt::Display for DisplayReturncode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(returncode) => write!(f, "{returncode}"),
            None => f.write_str("None"),
        }
    }
}
