// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core single-test execution logic for the piglit test runner.
//!
//! A [`TestCase`](test_case::TestCase) is executed through
//! [`TestCase::execute`](test_case::TestCase::execute), which runs it, contains any failure and
//! reports one [`ResultRecord`](piglit_metadata::ResultRecord) per test (or per subtest). Most
//! tests are [`ExecTest`](exec::ExecTest)s, which run an external executable and interpret the
//! `PIGLIT:` result protocol in its output.

pub mod config;
pub mod errors;
pub mod exec;
pub mod platform;
pub mod protocol;
pub mod reporter;
pub mod test_case;
mod test_command;
mod time;
