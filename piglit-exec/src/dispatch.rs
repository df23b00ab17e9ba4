// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ExpectedError, output};
use camino::Utf8PathBuf;
use clap::{ArgGroup, Args, Parser};
use piglit_metadata::PiglitExitCode;
use piglit_runner::{
    config::ExecEnvironment,
    exec::{ExecTest, PlainExecTest, split_command},
    platform::Platform,
    reporter::{JsonWriter, NoKernelLog, TracingLog},
    test_case::{ExecuteContext, TestCase},
};
use tracing::debug;

/// Run a single piglit test and print its result record as JSON.
///
/// The test command is given either after `--`, or as a single string with `--command`.
#[derive(Debug, Parser)]
#[command(name = "piglit-exec", version)]
#[command(group(
    ArgGroup::new("test-command")
        .required(true)
        .args(["command", "argv"]),
))]
pub struct PiglitExecApp {
    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    exec_opts: ExecOpts,

    /// Fully qualified test name, e.g. spec/glsl-1.30/execution/fs-discard
    #[arg(long, value_name = "PATH")]
    name: String,

    /// Set an environment variable for the test process only (may be repeated)
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    /// Test command as a single shell-like string
    #[arg(long, value_name = "COMMAND")]
    command: Option<String>,

    /// Test command and arguments
    #[arg(last = true, value_name = "ARGS")]
    argv: Vec<String>,
}

impl PiglitExecApp {
    /// Installs the logger. Must be called before [`exec`](Self::exec) for log messages to be
    /// shown.
    pub fn init_output(&self) {
        output::init_logger();
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self) -> Result<i32, ExpectedError> {
        let env = self.make_env()?;
        let test = self.make_test(&env)?;

        let log = TracingLog::new();
        let writer = JsonWriter::new(std::io::stdout());
        let cx = ExecuteContext {
            env: &env,
            log: &log,
            writer: &writer,
            kernel_log: &NoKernelLog,
        };
        test.execute(&cx, &self.name)?;

        debug!("{}", log.summary());
        Ok(PiglitExitCode::OK)
    }

    fn make_env(&self) -> Result<ExecEnvironment, ExpectedError> {
        let mut env = self.config_opts.make_env()?;
        self.exec_opts.apply(&mut env);
        Ok(env)
    }

    fn make_test(&self, env: &ExecEnvironment) -> Result<Box<dyn TestCase>, ExpectedError> {
        let argv = match &self.command {
            Some(command) => split_command(command)?,
            None => self.argv.clone(),
        };

        let with_env = |mut test: ExecTest| {
            for (key, value) in &self.env {
                test = test.with_env(key, value);
            }
            test
        };

        let test: Box<dyn TestCase> = match &env.test_bin_dir {
            Some(test_bin_dir) => {
                Box::new(PlainExecTest::new(argv, test_bin_dir, &env.platform).map(with_env))
            }
            None => Box::new(with_env(ExecTest::new(argv, &env.platform))),
        };
        Ok(test)
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file (TOML)
    #[arg(long = "config", value_name = "PATH", env = "PIGLIT_CONFIG")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_env(&self) -> Result<ExecEnvironment, ExpectedError> {
        Ok(ExecEnvironment::from_sources(self.config_file.as_deref())?)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "EXECUTION OPTIONS")]
struct ExecOpts {
    /// Announce the test without running it
    #[arg(long)]
    dry_run: bool,

    /// Include the test name when announcing the test
    #[arg(long, short)]
    verbose: bool,

    /// Run the test under valgrind's memcheck tool
    #[arg(long)]
    valgrind: bool,

    /// Platform to run against [default: $PIGLIT_PLATFORM]
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<String>,

    /// Resolve the test executable relative to this directory
    #[arg(long, value_name = "DIR")]
    bin_dir: Option<Utf8PathBuf>,
}

impl ExecOpts {
    /// Applies command-line overrides on top of the configuration.
    fn apply(&self, env: &mut ExecEnvironment) {
        if self.dry_run {
            env.execute = false;
        }
        env.verbose |= self.verbose;
        env.valgrind |= self.valgrind;
        if let Some(platform) = &self.platform {
            env.platform = Platform::new(platform.as_str());
        }
        if let Some(bin_dir) = &self.bin_dir {
            env.test_bin_dir = Some(bin_dir.clone());
        }
    }
}

fn parse_env_pair(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("empty variable name in `{input}`")),
        Some((key, value)) => Ok((key.to_owned(), value.to_owned())),
        None => Err(format!("expected KEY=VALUE, found `{input}`")),
    }
}
