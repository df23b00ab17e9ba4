// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the piglit runner.

use camino::Utf8PathBuf;
use config::ConfigError;
use piglit_metadata::TestStatusParseError;
use std::{error::Error, fmt};
use thiserror::Error;

/// An error that occurred while loading the execution environment configuration.
#[derive(Debug, Error)]
#[error("failed to load piglit configuration{}", display_config_file(.config_file.as_ref()))]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, err: ConfigError) -> Self {
        Self { config_file, err }
    }

    /// Returns the config file that failed to load, if one was specified.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }
}

fn display_config_file(config_file: Option<&Utf8PathBuf>) -> String {
    match config_file {
        Some(config_file) => format!(" from `{config_file}`"),
        None => String::new(),
    }
}

/// A shell-like command string could not be split into arguments.
#[derive(Debug, Error)]
#[error("failed to split command `{command}` into arguments")]
pub struct CommandParseError {
    command: String,
    #[source]
    err: shell_words::ParseError,
}

impl CommandParseError {
    pub(crate) fn new(command: impl Into<String>, err: shell_words::ParseError) -> Self {
        Self {
            command: command.into(),
            err,
        }
    }
}

/// An error returned by [`TestCase::run`](crate::test_case::TestCase::run).
///
/// These errors never escape [`TestCase::execute`](crate::test_case::TestCase::execute): they are
/// recorded as a failed test with the error attached.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The test process could not be spawned for a reason other than the executable missing.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The command line that was being spawned.
        command: String,

        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// The test's command could not be tokenized.
    #[error(transparent)]
    Command(#[from] CommandParseError),

    /// The test returned loose fields that can't be coerced into a result record.
    #[error("test output could not be converted into a result record")]
    InvalidOutput(#[source] serde_json::Error),

    /// An error raised by a test implementation.
    #[error("test implementation failed")]
    Test(#[source] Box<dyn Error + Send + Sync>),
}

impl RunError {
    /// Wraps an arbitrary error raised by a test implementation.
    pub fn test(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Test(error.into())
    }

    /// Returns a short name for the kind of error, used in result records.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "Spawn",
            Self::Command(_) => "Command",
            Self::InvalidOutput(_) => "InvalidOutput",
            Self::Test(_) => "Test",
        }
    }
}

/// An error encountered while interpreting the embedded result protocol.
///
/// These errors are never propagated to callers. They cause the test to be recorded as failed with
/// a diagnostic note, and are logged at debug level.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ProtocolParseError {
    /// A payload wasn't a valid mapping literal.
    #[error("invalid result literal `{payload}` (at offset {offset})")]
    InvalidLiteral {
        /// The payload following the protocol prefix.
        payload: String,

        /// The byte offset at which parsing failed.
        offset: usize,
    },

    /// A known field had a value of the wrong type.
    #[error("field `{key}` must be {expected}")]
    WrongShape {
        /// The field name.
        key: String,

        /// A description of the expected value.
        expected: &'static str,
    },

    /// A status field held an unknown status.
    #[error("field `{key}` has an invalid status")]
    InvalidStatus {
        /// The field (or subtest) name.
        key: String,

        /// The underlying error.
        #[source]
        err: TestStatusParseError,
    },
}

/// An error that occurs while writing a result record.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteRecordError {
    /// Serializing the record failed.
    #[error("error serializing result record for `{path}`")]
    Serialize {
        /// The test path.
        path: String,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// Writing to the output failed.
    #[error("error writing result record for `{path}`")]
    Io {
        /// The test path.
        path: String,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// Displays an error along with the chain of errors that caused it.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut next_error = self.error.source();
        if next_error.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(error) = next_error {
            write!(f, "\n  - {error}")?;
            next_error = error.source();
        }

        Ok(())
    }
}
