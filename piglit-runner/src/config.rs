// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for how tests are executed.

use crate::{errors::ConfigParseError, platform::Platform};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// The prefix for environment variables that override configuration, e.g. `PIGLIT_VALGRIND`.
///
/// `PIGLIT_PLATFORM` sets [`ExecEnvironment::platform`].
pub const ENV_PREFIX: &str = "PIGLIT";

/// Options shared by every test in a run.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecEnvironment {
    /// Whether to run tests. If false, tests are only announced and reported as `dry-run`.
    pub execute: bool,

    /// Whether to include test paths when announcing tests.
    pub verbose: bool,

    /// Whether to run tests under valgrind's memcheck tool.
    pub valgrind: bool,

    /// The platform tests run against.
    pub platform: Platform,

    /// The directory native test executables are installed to.
    pub test_bin_dir: Option<Utf8PathBuf>,
}

impl Default for ExecEnvironment {
    fn default() -> Self {
        Self {
            execute: true,
            verbose: false,
            valgrind: false,
            platform: Platform::default(),
            test_bin_dir: None,
        }
    }
}

impl ExecEnvironment {
    /// Loads the execution environment from an optional TOML file, overridden by `PIGLIT_*`
    /// environment variables.
    ///
    /// This reads the process environment, so it should be called once at startup.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Config::builder();
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| ConfigParseError::new(config_file.map(Utf8Path::to_path_buf), err))
    }
}
