// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::Result;
use piglit_metadata::ResultRecord;
use piglit_runner::{
    config::ExecEnvironment,
    reporter::{JsonWriter, NoKernelLog, TracingLog},
    test_case::{ExecuteContext, TestCase},
};
use std::{fs, os::unix::fs::PermissionsExt};

/// A temporary directory of shell scripts that stand in for test executables.
pub(crate) struct ScriptDir {
    dir: Utf8TempDir,
}

impl ScriptDir {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            dir: Utf8TempDir::new()?,
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        self.dir.path()
    }

    /// Writes an executable `/bin/sh` script called `name`.
    pub(crate) fn script(&self, name: &str, body: &str) -> Result<Utf8PathBuf> {
        let path = self.write(name, &format!("#!/bin/sh\n{body}"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// Writes a plain file called `name`.
    pub(crate) fn write(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Executes `test` at `path`, returning every `(path, record)` pair that was written.
pub(crate) fn execute(
    test: &dyn TestCase,
    env: &ExecEnvironment,
    path: &str,
) -> Result<Vec<(String, ResultRecord)>> {
    let log = TracingLog::new();
    let writer = JsonWriter::new(Vec::new());
    let cx = ExecuteContext {
        env,
        log: &log,
        writer: &writer,
        kernel_log: &NoKernelLog,
    };
    test.execute(&cx, path)?;
    assert_eq!(log.running(), 0, "every announced test completed");

    let out = String::from_utf8(writer.into_inner())?;
    out.lines()
        .map(|line| -> Result<(String, ResultRecord)> {
            let mut value: serde_json::Value = serde_json::from_str(line)?;
            let path = value["path"].as_str().unwrap_or_default().to_owned();
            let record = serde_json::from_value(value["result"].take())?;
            Ok((path, record))
        })
        .collect()
}
