// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use piglit_metadata::PiglitExitCode;
use piglit_runner::errors::{
    CommandParseError, ConfigParseError, DisplayErrorChain, WriteRecordError,
};
use thiserror::Error;
use tracing::error;

/// An expected error that stops `piglit-exec` before a result is recorded.
///
/// Failures of the test itself are never reported this way: they end up in the result record.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to load configuration")]
    ConfigParse(#[from] ConfigParseError),

    #[error("invalid test command")]
    CommandParse(#[from] CommandParseError),

    #[error("failed to write result")]
    WriteRecord(#[from] WriteRecordError),
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParse(_) => PiglitExitCode::CONFIG_PARSE_ERROR,
            Self::CommandParse(_) => PiglitExitCode::INVALID_COMMAND,
            Self::WriteRecord(_) => PiglitExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr, along with the errors that caused it.
    pub fn display_to_stderr(&self) {
        match self {
            Self::ConfigParse(err) => error!("{}", DisplayErrorChain::new(err)),
            Self::CommandParse(err) => error!("{}", DisplayErrorChain::new(err)),
            Self::WriteRecord(err) => error!("{}", DisplayErrorChain::new(err)),
        }
    }
}
