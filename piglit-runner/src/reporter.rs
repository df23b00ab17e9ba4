// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborators that tests report to: a progress log, a result writer and kernel log
//! correlation.
//!
//! Each collaborator is a trait with a small implementation suitable for running tests from the
//! command line. All of them take `&self` and are `Send + Sync`, so one instance can be shared by
//! every worker thread in a run.

mod kernel_log;
mod test_log;
mod writer;

pub use kernel_log::*;
pub use test_log::*;
pub use writer::*;
