// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use piglit_metadata::TestStatus;
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Mutex, PoisonError},
};
use tracing::{debug, info};

/// Identifies a test announced by [`TestLog::pre_log`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct LogHandle(usize);

impl LogHandle {
    /// Creates a new handle with the given identifier.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the identifier for this handle.
    pub fn id(self) -> usize {
        self.0
    }
}

/// Logs the progress of a test run.
///
/// For each executed test, [`pre_log`](Self::pre_log) is called first, then [`log`](Self::log)
/// and [`post_log`](Self::post_log) once the result is known.
pub trait TestLog: Send + Sync {
    /// Announces that a test is starting. `path` is only provided in verbose mode.
    fn pre_log(&self, path: Option<&str>) -> LogHandle;

    /// Logs the result of the test at `path`.
    fn log(&self, path: &str, status: TestStatus);

    /// Marks the test identified by `handle` as complete.
    fn post_log(&self, handle: LogHandle, status: TestStatus);
}

/// A [`TestLog`] that emits `tracing` events and keeps a summary of results.
#[derive(Debug, Default)]
pub struct TracingLog {
    state: Mutex<LogState>,
}

#[derive(Debug, Default)]
struct LogState {
    next_id: usize,
    running: BTreeMap<usize, Option<String>>,
    summary: LogSummary,
}

impl TracingLog {
    /// Creates a new, empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a summary of the tests logged so far.
    pub fn summary(&self) -> LogSummary {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary
            .clone()
    }

    /// Returns the number of tests that were announced but haven't completed.
    pub fn running(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running
            .len()
    }
}

impl TestLog for TracingLog {
    fn pre_log(&self, path: Option<&str>) -> LogHandle {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = state.next_id;
        state.next_id += 1;
        if let Some(path) = path {
            info!("running {path}");
        }
        state.running.insert(id, path.map(str::to_owned));
        LogHandle(id)
    }

    fn log(&self, path: &str, status: TestStatus) {
        info!("{status}: {path}");
    }

    fn post_log(&self, handle: LogHandle, status: TestStatus) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.running.remove(&handle.0).is_none() {
            debug!("post_log called for unknown handle {}", handle.0);
        }
        state.summary.add(status);
        debug!(
            complete = state.summary.total(),
            running = state.running.len(),
            "test complete"
        );
    }
}

/// Counts of completed tests by status.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogSummary {
    counts: BTreeMap<TestStatus, usize>,
}

impl LogSummary {
    fn add(&mut self, status: TestStatus) {
        *self.counts.entry(status).or_default() += 1;
    }

    /// Returns the number of completed tests with the given status.
    pub fn count(&self, status: TestStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or_default()
    }

    /// Returns the total number of completed tests.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        write!(f, "{total} {}", if total == 1 { "test" } else { "tests" })?;
        for (i, (status, count)) in self.counts.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{count} {status}")?;
        }
        Ok(())
    }
}
