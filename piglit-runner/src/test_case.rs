// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`TestCase`] trait, and orchestration of a single test execution.
//!
//! [`TestCase::run`] produces a result. [`TestCase::execute`] wraps it: it times the run, fills in
//! missing fields, contains any failure, and hands the result to the logging and reporting
//! collaborators in an [`ExecuteContext`].

use crate::{
    config::ExecEnvironment,
    errors::{DisplayErrorChain, RunError, WriteRecordError},
    reporter::{KernelLog, ResultWriter, TestLog},
    time::stopwatch,
};
use piglit_metadata::{ResultRecord, TestStatus};
use std::{
    any::Any,
    backtrace::Backtrace,
    panic::{self, AssertUnwindSafe},
};
use tracing::warn;

/// The note attached to results that weren't returned as a [`ResultRecord`].
pub const LOOSE_RESULT_NOTE: &str = "Result not returned as a ResultRecord";

/// What a test returned from [`TestCase::run`].
#[derive(Clone, Debug, PartialEq)]
pub enum TestOutput {
    /// A complete result record.
    Record(ResultRecord),

    /// A loosely-typed mapping of result fields.
    ///
    /// This is accepted, but the test is reported as [`TestStatus::Warn`].
    Fields(serde_json::Map<String, serde_json::Value>),
}

impl From<ResultRecord> for TestOutput {
    fn from(record: ResultRecord) -> Self {
        Self::Record(record)
    }
}

/// The collaborators a test reports to while executing.
#[derive(Clone, Copy)]
pub struct ExecuteContext<'a> {
    /// Options shared by every test in the run.
    pub env: &'a ExecEnvironment,

    /// Progress logger.
    pub log: &'a dyn TestLog,

    /// Destination for result records.
    pub writer: &'a dyn ResultWriter,

    /// Kernel log correlation.
    pub kernel_log: &'a dyn KernelLog,
}

/// A test that can be executed by the runner.
pub trait TestCase {
    /// Runs the test and returns its result.
    fn run(&self, env: &ExecEnvironment) -> Result<TestOutput, RunError>;

    /// Returns true if this test may run alongside other tests.
    ///
    /// This is a hint for the scheduler and doesn't affect how the test runs.
    fn runs_concurrently(&self) -> bool {
        false
    }

    /// Called right before [`run`](Self::run). Errors are contained the same way as errors from
    /// `run`.
    fn before_run(&self) -> Result<(), RunError> {
        Ok(())
    }

    /// Executes the test at `path` and reports the result.
    ///
    /// Failures of the test itself are recorded, not returned. The only error returned is a
    /// failure to write the result.
    fn execute(&self, cx: &ExecuteContext<'_>, path: &str) -> Result<(), WriteRecordError> {
        execute_test(self, cx, path)
    }
}

/// The implementation of [`TestCase::execute`].
pub fn execute_test<T: TestCase + ?Sized>(
    test: &T,
    cx: &ExecuteContext<'_>,
    path: &str,
) -> Result<(), WriteRecordError> {
    let handle = cx.log.pre_log(cx.env.verbose.then_some(path));

    if !cx.env.execute {
        cx.log.log(path, TestStatus::DryRun);
        cx.log.post_log(handle, TestStatus::DryRun);
        return Ok(());
    }

    let record = run_contained(test, cx, path);
    let status = record.status();
    cx.log.log(path, status);
    cx.log.post_log(handle, status);

    if record.splits_into_subtests() {
        for (name, record) in record.subtest_records() {
            cx.writer.write_dict_item(&format!("{path}/{name}"), &record)?;
        }
        Ok(())
    } else {
        cx.writer.write_dict_item(path, &record)
    }
}

fn run_contained<T: TestCase + ?Sized>(
    test: &T,
    cx: &ExecuteContext<'_>,
    path: &str,
) -> ResultRecord {
    match panic::catch_unwind(AssertUnwindSafe(|| run_and_complete(test, cx))) {
        Ok(Ok(record)) => record,
        Ok(Err(error)) => {
            warn!("test `{path}` failed to run: {error}");
            error_record(
                format!("RunError::{}: {error}", error.kind_str()),
                DisplayErrorChain::new(&error).to_string(),
            )
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            warn!("test `{path}` panicked: {message}");
            error_record(format!("panic: {message}"), "test panicked".to_owned())
        }
    }
}

fn run_and_complete<T: TestCase + ?Sized>(
    test: &T,
    cx: &ExecuteContext<'_>,
) -> Result<ResultRecord, RunError> {
    let stopwatch = stopwatch();
    cx.kernel_log.update_dmesg();
    test.before_run()?;
    let output = test.run(cx.env)?;

    let (mut record, loose) = match output {
        TestOutput::Record(record) => (record, false),
        TestOutput::Fields(fields) => (
            ResultRecord::from_fields(fields).map_err(RunError::InvalidOutput)?,
            true,
        ),
    };
    cx.kernel_log.update_result(&mut record);

    record
        .time
        .get_or_insert_with(|| stopwatch.snapshot().secs_f64());
    record.result.get_or_insert(TestStatus::Fail);
    if loose {
        record.result = Some(TestStatus::Warn);
        record.note = Some(LOOSE_RESULT_NOTE.to_owned());
    }

    Ok(record)
}

fn error_record(exception: String, chain: String) -> ResultRecord {
    let mut record = ResultRecord::with_result(TestStatus::Fail);
    record.exception = Some(exception);
    record.traceback = Some(format!(
        "{chain}\n\ncontained at:\n{}",
        Backtrace::force_capture()
    ));
    record
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "(non-string panic payload)"
    }
}

/// A test implemented by a closure.
pub struct FnTest<F> {
    f: F,
    run_concurrent: bool,
}

impl<F> FnTest<F>
where
    F: Fn(&ExecEnvironment) -> Result<TestOutput, RunError>,
{
    /// Creates a new test that calls `f` to run.
    pub fn new(f: F) -> Self {
        Self {
            f,
            run_concurrent: false,
        }
    }

    /// Marks whether this test may run alongside other tests.
    pub fn with_run_concurrent(mut self, run_concurrent: bool) -> Self {
        self.run_concurrent = run_concurrent;
        self
    }
}

impl<F> TestCase for FnTest<F>
where
    F: Fn(&ExecEnvironment) -> Result<TestOutput, RunError>,
{
    fn run(&self, env: &ExecEnvironment) -> Result<TestOutput, RunError> {
        (self.f)(env)
    }

    fn runs_concurrently(&self) -> bool {
        self.run_concurrent
    }
}
