// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use piglit_metadata::ResultRecord;

/// Correlates test results with messages in the kernel log.
pub trait KernelLog: Send + Sync {
    /// Records the current state of the kernel log, right before a test runs.
    fn update_dmesg(&self);

    /// Annotates `record` with kernel messages logged since [`update_dmesg`](Self::update_dmesg)
    /// was called. Implementations may also change the result.
    fn update_result(&self, record: &mut ResultRecord);
}

/// A [`KernelLog`] that doesn't read the kernel log.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKernelLog;

impl KernelLog for NoKernelLog {
    fn update_dmesg(&self) {}

    fn update_result(&self, _record: &mut ResultRecord) {}
}
