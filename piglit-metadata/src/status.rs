// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TestStatusParseError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The classification of a single test or subtest.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestStatus {
    /// The test passed.
    Pass,

    /// The test failed, or produced no usable result.
    Fail,

    /// The test was not run, or doesn't apply to this platform or build.
    Skip,

    /// The test process was terminated by a signal or a structured exception.
    Crash,

    /// The test ran, but something about the way it reported its result was off.
    Warn,

    /// Execution was disabled and the test was only announced.
    DryRun,
}

impl TestStatus {
    /// Returns the string representations of all known statuses.
    pub fn variants() -> &'static [&'static str] {
        &["pass", "fail", "skip", "crash", "warn", "dry-run"]
    }

    /// Returns the string representation used in result records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Crash => "crash",
            Self::Warn => "warn",
            Self::DryRun => "dry-run",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = TestStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "skip" => Self::Skip,
            "crash" => Self::Crash,
            "warn" => Self::Warn,
            "dry-run" => Self::DryRun,
            other => return Err(TestStatusParseError::new(other)),
        };
        Ok(status)
    }
}
