// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `piglit-exec` failures.
///
/// The outcome of the test itself is reported in its result record, never through the exit code.
/// These codes only indicate that the result couldn't be produced or recorded.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum PiglitExitCode {}

impl PiglitExitCode {
    /// The test was executed and its result written.
    pub const OK: i32 = 0;

    /// The configuration file or `PIGLIT_*` environment variables couldn't be parsed.
    pub const CONFIG_PARSE_ERROR: i32 = 95;

    /// The test command couldn't be split into arguments.
    pub const INVALID_COMMAND: i32 = 96;

    /// Writing the result record failed.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
