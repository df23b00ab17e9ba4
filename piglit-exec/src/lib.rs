// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs a single piglit test and prints its result record as JSON.
//!
//! Progress and diagnostics go to standard error, filtered by `PIGLIT_LOG`. Standard output only
//! ever contains result records, one JSON object per line.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
