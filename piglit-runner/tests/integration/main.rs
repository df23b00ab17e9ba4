// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests that run real processes.
//!
//! Test executables are `/bin/sh` scripts written to a temporary directory, so these tests only
//! run on Unix.

#![cfg(unix)]

mod fixtures;

use color_eyre::Result;
use fixtures::{ScriptDir, execute};
use indoc::indoc;
use maplit::btreemap;
use piglit_metadata::{CrashCode, ResultRecord, TestStatus};
use piglit_runner::{
    config::ExecEnvironment,
    exec::{ExecTest, MAX_ATTEMPTS, PlainExecTest},
    platform::Platform,
    protocol::{InterpretResult, PARSE_FAILURE_NOTE},
};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn run(test: &ExecTest, env: &ExecEnvironment) -> ResultRecord {
    test.run_command(env).expect("test process ran")
}

fn exec_test(program: impl Into<String>) -> ExecTest {
    ExecTest::new(vec![program.into()], &Platform::default())
}

#[test]
fn protocol_line_is_stripped_from_info() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script(
        "fbo-formats",
        indoc! {r#"
            echo "Testing GL_RGBA8"
            echo "PIGLIT: {'result': 'pass'}"
            echo "warning: slow path" >&2
        "#},
    )?;

    let record = run(&exec_test(script.as_str()), &ExecEnvironment::default());
    assert_eq!(record.result, Some(TestStatus::Pass));
    assert_eq!(record.returncode, Some(0));
    assert_eq!(record.note, None);
    assert_eq!(record.command.as_deref(), Some(script.as_str()));
    assert_eq!(
        record.info.as_deref(),
        Some("Returncode: 0\n\nErrors:\nwarning: slow path\n\n\nOutput:\nTesting GL_RGBA8\n")
    );
    Ok(())
}

#[test]
fn invalid_literal_fails_with_note() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script("bad-literal", "echo 'PIGLIT: not-a-valid-literal'\n")?;

    let record = run(&exec_test(script.as_str()), &ExecEnvironment::default());
    assert_eq!(record.result, Some(TestStatus::Fail));
    assert_eq!(record.note.as_deref(), Some(PARSE_FAILURE_NOTE));
    assert!(
        record
            .info
            .as_deref()
            .is_some_and(|info| info.ends_with("Output:\nPIGLIT: not-a-valid-literal\n")),
        "unparsed line is kept in info: {:?}",
        record.info
    );
    Ok(())
}

fn kill_self(signal: &str) -> ResultRecord {
    let dir = ScriptDir::new().expect("temp dir created");
    let script = dir
        .script(
            "killed",
            &format!("echo \"PIGLIT: {{'result': 'pass'}}\"\nkill -{signal} $$\n"),
        )
        .expect("script written");
    run(&exec_test(script.as_str()), &ExecEnvironment::default())
}

#[test_case("TRAP", CrashCode::SIGTRAP ; "sigtrap")]
#[test_case("ABRT", CrashCode::SIGABRT ; "sigabrt")]
#[test_case("FPE", CrashCode::SIGFPE ; "sigfpe")]
#[test_case("USR1", CrashCode::SIGUSR1 ; "sigusr1")]
#[test_case("SEGV", CrashCode::SIGSEGV ; "sigsegv")]
fn crash_overrides_protocol_result(signal: &str, returncode: i32) {
    let record = kill_self(signal);
    assert_eq!(record.result, Some(TestStatus::Crash));
    assert_eq!(record.returncode, Some(returncode));
    assert_eq!(record.note, None);
}

#[test_case("KILL", -9 ; "sigkill")]
#[test_case("TERM", -15 ; "sigterm")]
fn other_signals_are_not_crashes(signal: &str, returncode: i32) {
    let record = kill_self(signal);
    assert_eq!(record.result, Some(TestStatus::Pass), "result isn't forced");
    assert_eq!(record.returncode, Some(returncode));
    assert_eq!(
        record.note.as_deref(),
        Some(format!("Returncode was {returncode}").as_str())
    );
}

#[test]
fn nonzero_returncode_adds_note() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script(
        "exit-three",
        indoc! {r#"
            echo "PIGLIT: {'result': 'warn'}"
            exit 3
        "#},
    )?;

    let record = run(&exec_test(script.as_str()), &ExecEnvironment::default());
    assert_eq!(record.result, Some(TestStatus::Warn), "result isn't forced");
    assert_eq!(record.returncode, Some(3));
    assert_eq!(record.note.as_deref(), Some("Returncode was 3"));
    Ok(())
}

#[test]
fn spurious_window_resize_is_retried_up_to_the_limit() -> Result<()> {
    let dir = ScriptDir::new()?;
    let counter = dir.write("attempts", "")?;
    let script = dir.script(
        "always-resized",
        indoc! {r#"
            echo attempt >> "$ATTEMPT_COUNTER"
            n=$(wc -l < "$ATTEMPT_COUNTER" | tr -d ' ')
            echo "Got spurious window resize"
            echo "PIGLIT: {'result': 'pass'}"
            echo "attempt $n"
        "#},
    )?;

    let test = exec_test(script.as_str()).with_env("ATTEMPT_COUNTER", &counter);
    let record = run(&test, &ExecEnvironment::default());

    let attempts = std::fs::read_to_string(&counter)?.lines().count();
    assert_eq!(attempts, MAX_ATTEMPTS);
    // The last attempt is accepted as-is.
    assert_eq!(record.result, Some(TestStatus::Pass));
    let info = record.info.expect("info is set");
    assert!(info.contains(&format!("attempt {MAX_ATTEMPTS}")), "info: {info}");
    assert_eq!(
        record.environment,
        Some(format!("ATTEMPT_COUNTER=\"{counter}\" "))
    );
    Ok(())
}

#[test]
fn retry_stops_once_marker_disappears() -> Result<()> {
    let dir = ScriptDir::new()?;
    let counter = dir.write("attempts", "")?;
    let script = dir.script(
        "resized-once",
        indoc! {r#"
            echo attempt >> "$ATTEMPT_COUNTER"
            n=$(wc -l < "$ATTEMPT_COUNTER" | tr -d ' ')
            if [ "$n" -lt 2 ]; then
                echo "Got spurious window resize"
                echo "PIGLIT: {'result': 'fail'}"
            else
                echo "PIGLIT: {'result': 'pass'}"
            fi
        "#},
    )?;

    let test = exec_test(script.as_str()).with_env("ATTEMPT_COUNTER", &counter);
    let record = run(&test, &ExecEnvironment::default());

    assert_eq!(std::fs::read_to_string(&counter)?.lines().count(), 2);
    assert_eq!(record.result, Some(TestStatus::Pass));
    Ok(())
}

#[test]
fn missing_executable_is_skipped() -> Result<()> {
    let dir = ScriptDir::new()?;
    let missing = dir.path().join("not-built");

    let record = run(&exec_test(missing.as_str()), &ExecEnvironment::default());
    assert_eq!(record.result, Some(TestStatus::Skip));
    assert_eq!(record.returncode, None);
    assert_eq!(record.note, None);
    assert_eq!(
        record.info.as_deref(),
        Some("Returncode: None\n\nErrors:\n\n\nOutput:\nTest executable not found.\n")
    );
    Ok(())
}

#[test]
fn platform_skip_never_spawns() -> Result<()> {
    let dir = ScriptDir::new()?;
    let marker = dir.path().join("ran");
    let script = dir.script("glx-swap-event", &format!("touch {marker}\n"))?;

    let platform = Platform::new(Platform::GBM);
    let test = ExecTest::new(vec![script.to_string(), "-auto".to_owned()], &platform);
    let env = ExecEnvironment {
        platform,
        ..ExecEnvironment::default()
    };

    let record = run(&test, &env);
    assert_eq!(record.result, Some(TestStatus::Skip));
    assert_eq!(record.returncode, None);
    assert!(!marker.exists(), "the script never ran");
    Ok(())
}

#[test]
fn output_is_decoded_lossily() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script(
        "binary-output",
        indoc! {r#"
            printf 'bad byte: \377\n'
            echo "PIGLIT: {'result': 'pass'}"
        "#},
    )?;

    let record = run(&exec_test(script.as_str()), &ExecEnvironment::default());
    assert_eq!(record.result, Some(TestStatus::Pass));
    assert!(
        record
            .info
            .as_deref()
            .is_some_and(|info| info.contains("bad byte: \u{FFFD}")),
        "info: {:?}",
        record.info
    );
    Ok(())
}

#[test]
fn extra_fields_survive_serialization() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script(
        "extra-fields",
        "echo \"PIGLIT: {'result': 'pass', 'max_error': 0.25, 'samples': 4}\"\n",
    )?;

    let records = execute(
        &exec_test(script.as_str()),
        &ExecEnvironment::default(),
        "spec/extra",
    )?;
    let (path, record) = &records[0];
    assert_eq!(path, "spec/extra");
    assert_eq!(
        record.extra,
        btreemap! {
            "max_error".to_owned() => serde_json::json!(0.25),
            "samples".to_owned() => serde_json::json!(4),
        }
    );
    Ok(())
}

#[test]
fn execute_splits_subtests() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script(
        "fbo-formats",
        indoc! {r#"
            echo "PIGLIT: subtest {'GL_RGBA8': 'pass'}"
            echo "PIGLIT: subtest {'GL_RGB565': 'fail'}"
            echo "PIGLIT: {'result': 'fail'}"
        "#},
    )?;

    let records = execute(
        &exec_test(script.as_str()),
        &ExecEnvironment::default(),
        "spec/fbo/fbo-formats",
    )?;
    let written: Vec<_> = records
        .iter()
        .map(|(path, record)| (path.as_str(), record.status()))
        .collect();
    assert_eq!(
        written,
        [
            ("spec/fbo/fbo-formats/GL_RGBA8", TestStatus::Pass),
            ("spec/fbo/fbo-formats/GL_RGB565", TestStatus::Fail),
        ]
    );
    assert!(
        records.iter().all(|(_, record)| record.time.is_some()),
        "time is set on every entry"
    );
    Ok(())
}

#[test]
fn dry_run_writes_nothing() -> Result<()> {
    let dir = ScriptDir::new()?;
    let marker = dir.path().join("ran");
    let script = dir.script("fbo-formats", &format!("touch {marker}\n"))?;

    let env = ExecEnvironment {
        execute: false,
        ..ExecEnvironment::default()
    };
    let records = execute(&exec_test(script.as_str()), &env, "spec/dry")?;
    assert!(records.is_empty());
    assert!(!marker.exists(), "the script never ran");
    Ok(())
}

#[test]
fn spawn_error_is_contained() -> Result<()> {
    let dir = ScriptDir::new()?;
    // Not executable, so spawning fails with a permission error rather than "not found".
    let not_executable = dir.write("not-executable", "#!/bin/sh\n")?;

    let test = exec_test(not_executable.as_str());
    let err = test
        .run_command(&ExecEnvironment::default())
        .expect_err("spawning fails");
    assert_eq!(err.kind_str(), "Spawn");

    let records = execute(&test, &ExecEnvironment::default(), "spec/unspawnable")?;
    assert_eq!(records.len(), 1);
    let (_, record) = &records[0];
    assert_eq!(record.result, Some(TestStatus::Fail));
    let exception = record.exception.as_deref().expect("exception is set");
    assert!(
        exception.starts_with("RunError::Spawn: failed to spawn"),
        "exception: {exception}"
    );
    assert!(record.traceback.as_deref().is_some_and(|tb| !tb.is_empty()));
    Ok(())
}

#[test]
fn plain_exec_test_runs_from_bin_dir() -> Result<()> {
    let dir = ScriptDir::new()?;
    dir.script("glsl-minmax", "echo \"PIGLIT: {'result': 'pass'}\"\n")?;

    let test = PlainExecTest::new(
        vec!["glsl-minmax".to_owned()],
        dir.path(),
        &Platform::default(),
    );
    let records = execute(&test, &ExecEnvironment::default(), "glsl-minmax")?;
    assert_eq!(records[0].1.result, Some(TestStatus::Pass));
    assert_eq!(
        records[0].1.command,
        Some(dir.path().join("glsl-minmax").into_string())
    );
    Ok(())
}

/// An interpreter that ignores the output and classifies by exit code alone.
struct ExitCodeOnly;

impl InterpretResult for ExitCodeOnly {
    fn interpret_result(
        &self,
        stdout: &str,
        returncode: Option<i32>,
        record: &mut ResultRecord,
    ) -> String {
        record.result = Some(match returncode {
            Some(0) => TestStatus::Pass,
            _ => TestStatus::Fail,
        });
        stdout.to_owned()
    }
}

#[test]
fn custom_interpreter() -> Result<()> {
    let dir = ScriptDir::new()?;
    let script = dir.script("no-protocol", "echo 'all good'\n")?;

    let test = exec_test(script.as_str()).with_interpreter(ExitCodeOnly);
    let record = test.run_command(&ExecEnvironment::default())?;
    assert_eq!(record.result, Some(TestStatus::Pass));
    assert!(
        record
            .info
            .as_deref()
            .is_some_and(|info| info.ends_with("Output:\nall good\n"))
    );
    Ok(())
}
