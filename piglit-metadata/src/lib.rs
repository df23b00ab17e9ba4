// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured result records produced by the piglit test runner.
//!
//! Every test invocation resolves to exactly one [`ResultRecord`]. Records are what the reporting
//! pipeline persists, so this crate is kept free of any process-spawning logic: it only describes
//! the shape of the data and the fixed tables used to classify it.

mod crash_codes;
mod errors;
mod exit_codes;
mod record;
mod status;

pub use crash_codes::*;
pub use errors::*;
pub use exit_codes::*;
pub use record::*;
pub use status::*;
