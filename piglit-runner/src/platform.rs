// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The platform tests are run against, and the skip rules derived from it.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The windowing platform tests are run against, e.g. `glx`, `x11_egl` or `gbm`.
///
/// The platform is read once at startup and passed around explicitly. An empty platform means
/// the default for the build.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    /// The GBM platform, which renders without a window system.
    pub const GBM: &'static str = "gbm";

    /// Creates a new platform from its identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the platform identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if an executable with this base name can never run on this platform.
    ///
    /// GBM has no window system, so glean and the GLX tests can't run on it.
    pub fn skips_executable(&self, executable_name: &str) -> bool {
        self.0 == Self::GBM && (executable_name == "glean" || executable_name.starts_with("glx-"))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true if the test with the given argv should be skipped on `platform`.
///
/// Only the base name of the executable is considered.
pub fn check_for_skip_scenario(platform: &Platform, command: &[String]) -> bool {
    let Some(program) = command.first() else {
        return false;
    };
    let executable_name = Utf8Path::new(program).file_name().unwrap_or(program.as_str());
    platform.skips_executable(executable_name)
}
