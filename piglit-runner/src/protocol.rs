// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interpretation of the result protocol embedded in test output.
//!
//! A test reports its outcome by printing lines of the form
//!
//! ```text
//! PIGLIT: {'result': 'pass', 'note': 'slow path'}
//! PIGLIT: subtest {'GL_RGBA8': 'pass'}
//! ```
//!
//! to standard output. The first form is shallow-merged into the result record. The second merges
//! into the record's subtest map. Interpretation is all-or-nothing: if any protocol line is
//! malformed, none of them are applied.

mod literal;

use crate::errors::ProtocolParseError;
use literal::Literal;
use piglit_metadata::{ResultRecord, TestStatus};
use tracing::debug;

/// The prefix that marks a result protocol line.
pub const PROTOCOL_PREFIX: &str = "PIGLIT:";

/// The word that introduces a subtest payload, e.g. `PIGLIT: subtest {'name': 'pass'}`.
pub const SUBTEST_PREFIX: &str = "subtest";

/// The note attached to a record whose protocol lines couldn't be interpreted.
pub const PARSE_FAILURE_NOTE: &str = "Failed to parse result string";

/// Turns the output of a test process into fields of a result record.
pub trait InterpretResult: Send + Sync {
    /// Interprets `stdout`, updating `record` in place.
    ///
    /// Returns the output that should be reported to the user, with any lines consumed by the
    /// interpreter removed. On return, `record.result` must be set.
    fn interpret_result(
        &self,
        stdout: &str,
        returncode: Option<i32>,
        record: &mut ResultRecord,
    ) -> String;
}

/// The standard piglit result protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct PiglitProtocol;

impl InterpretResult for PiglitProtocol {
    fn interpret_result(
        &self,
        stdout: &str,
        _returncode: Option<i32>,
        record: &mut ResultRecord,
    ) -> String {
        let output = match apply_protocol_lines(stdout, record) {
            Ok(Some((updated, output))) => {
                *record = updated;
                output
            }
            Ok(None) => stdout.to_owned(),
            Err(error) => {
                debug!("{error}");
                record.result = Some(TestStatus::Fail);
                record.note = Some(PARSE_FAILURE_NOTE.to_owned());
                stdout.to_owned()
            }
        };

        record.result.get_or_insert(TestStatus::Fail);
        output
    }
}

/// Applies every protocol line in `stdout` to a copy of `record`.
///
/// Returns `None` if there were no protocol lines, otherwise the updated record and the output
/// with protocol lines removed.
fn apply_protocol_lines(
    stdout: &str,
    record: &ResultRecord,
) -> Result<Option<(ResultRecord, String)>, ProtocolParseError> {
    let mut updated: Option<ResultRecord> = None;
    let mut kept = Vec::new();

    for line in stdout.split('\n') {
        let Some(payload) = line.strip_prefix(PROTOCOL_PREFIX) else {
            kept.push(line);
            continue;
        };
        let updated = updated.get_or_insert_with(|| record.clone());
        let payload = payload.trim_start();

        if let Some(subtests) = payload.strip_prefix(SUBTEST_PREFIX) {
            let entries = literal::parse_mapping(subtests)?;
            let subtest = updated.subtest.get_or_insert_with(Default::default);
            for (name, value) in entries {
                let status = status_value(&name, value)?;
                subtest.insert(name, status);
            }
        } else {
            for (key, value) in literal::parse_mapping(payload)? {
                apply_field(updated, key, value)?;
            }
        }
    }

    Ok(updated.map(|updated| (updated, kept.join("\n"))))
}

fn apply_field(
    record: &mut ResultRecord,
    key: String,
    value: Literal,
) -> Result<(), ProtocolParseError> {
    match key.as_str() {
        "result" => {
            record.result = optional(value, |value| status_value(&key, value))?;
        }
        "subtest" => {
            record.subtest = optional(value, |value| match value {
                Literal::Mapping(entries) => entries
                    .into_iter()
                    .map(|(name, value)| {
                        let status = status_value(&name, value)?;
                        Ok::<_, ProtocolParseError>((name, status))
                    })
                    .collect(),
                _ => Err(wrong_shape(&key, "a mapping of subtest names to statuses")),
            })?;
        }
        "returncode" => {
            record.returncode = optional(value, |value| match value {
                Literal::Int(n) => i32::try_from(n).map_err(|_| wrong_shape(&key, "an i32")),
                _ => Err(wrong_shape(&key, "an integer")),
            })?;
        }
        "time" => {
            record.time = optional(value, |value| match value {
                Literal::Int(n) => Ok(n as f64),
                Literal::Float(n) => Ok(n),
                _ => Err(wrong_shape(&key, "a number")),
            })?;
        }
        "info" => record.info = optional(value, |value| string_value(&key, value))?,
        "command" => record.command = optional(value, |value| string_value(&key, value))?,
        "environment" => {
            record.environment = optional(value, |value| string_value(&key, value))?;
        }
        "note" => record.note = optional(value, |value| string_value(&key, value))?,
        "exception" => record.exception = optional(value, |value| string_value(&key, value))?,
        "traceback" => record.traceback = optional(value, |value| string_value(&key, value))?,
        _ => {
            let value = json_value(&key, value)?;
            record.extra.insert(key, value);
        }
    }

    Ok(())
}

/// Maps `None` to an unset field, and anything else through `f`.
fn optional<T>(
    value: Literal,
    f: impl FnOnce(Literal) -> Result<T, ProtocolParseError>,
) -> Result<Option<T>, ProtocolParseError> {
    match value {
        Literal::None => Ok(None),
        value => f(value).map(Some),
    }
}

fn status_value(key: &str, value: Literal) -> Result<TestStatus, ProtocolParseError> {
    match value {
        Literal::Str(s) => s
            .parse()
            .map_err(|err| ProtocolParseError::InvalidStatus {
                key: key.to_owned(),
                err,
            }),
        _ => Err(wrong_shape(key, "a status string")),
    }
}

fn string_value(key: &str, value: Literal) -> Result<String, ProtocolParseError> {
    match value {
        Literal::Str(s) => Ok(s),
        _ => Err(wrong_shape(key, "a string")),
    }
}

fn json_value(key: &str, value: Literal) -> Result<serde_json::Value, ProtocolParseError> {
    let value = match value {
        Literal::Str(s) => s.into(),
        Literal::Int(n) => n.into(),
        // Non-finite floats are rejected by the grammar.
        Literal::Float(n) => n.into(),
        Literal::Bool(b) => b.into(),
        Literal::None => serde_json::Value::Null,
        other @ Literal::Mapping(_) => {
            debug!("field `{key}` is {}", other.describe());
            return Err(wrong_shape(key, "a primitive value"));
        }
    };
    Ok(value)
}

fn wrong_shape(key: &str, expected: &'static str) -> ProtocolParseError {
    ProtocolParseError::WrongShape {
        key: key.to_owned(),
        expected,
    }
}
