// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::TestStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The structured outcome of a single test invocation.
///
/// A record is created fresh for each test execution and handed to the reporting pipeline once
/// complete. Fields that weren't produced are omitted from the serialized form.
///
/// The embedded result protocol may merge arbitrary primitive fields into a record. Fields that
/// aren't otherwise known are kept in [`extra`](Self::extra) and serialized at the top level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The classification of the test.
    ///
    /// Always set by the time a record reaches a writer. If unset, it is treated as
    /// [`TestStatus::Fail`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TestStatus>,

    /// Named sub-outcomes, if the test reported any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtest: Option<IndexMap<String, TestStatus>>,

    /// The return code, standard error and standard output of the test process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    /// The exit code of the test process. `None` if the process never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,

    /// The command line used to run the test, joined with spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Environment variables injected on top of the inherited environment, as `KEY="value"`
    /// pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Wall-clock time taken by the test, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,

    /// A short diagnostic message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// The error that escaped the test implementation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,

    /// The chain of causes and backtrace for [`exception`](Self::exception).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,

    /// Other fields reported by the test.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ResultRecord {
    /// Creates a new, empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with the given result.
    pub fn with_result(result: TestStatus) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    /// Coerces a loosely-typed mapping into a record.
    ///
    /// Known keys must have the right shape; unknown keys are kept in [`extra`](Self::extra).
    pub fn from_fields(
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(fields))
    }

    /// Returns the result, treating an unset result as [`TestStatus::Fail`].
    pub fn status(&self) -> TestStatus {
        self.result.unwrap_or(TestStatus::Fail)
    }

    /// Returns true if this record should be reported as one entry per subtest.
    pub fn splits_into_subtests(&self) -> bool {
        self.subtest.as_ref().is_some_and(|subtest| subtest.len() > 1)
    }

    /// Returns one record per subtest, each a copy of `self` with `result` replaced by the
    /// subtest's result.
    ///
    /// Returns an empty iterator if there are no subtests.
    pub fn subtest_records(&self) -> impl Iterator<Item = (&str, ResultRecord)> + '_ {
        self.subtest.iter().flatten().map(|(name, status)| {
            let mut record = self.clone();
            record.result = Some(*status);
            (name.as_str(), record)
        })
    }
}
