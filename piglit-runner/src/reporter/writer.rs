// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::WriteRecordError;
use piglit_metadata::ResultRecord;
use serde::Serialize;
use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

/// Persists result records.
pub trait ResultWriter: Send + Sync {
    /// Writes the result for the test at `path`.
    fn write_dict_item(&self, path: &str, record: &ResultRecord) -> Result<(), WriteRecordError>;
}

/// A [`ResultWriter`] that writes one JSON object per line.
///
/// Each line has the form `{"path": "<test path>", "result": {<record>}}`. Writes from multiple
/// threads are serialized, so lines are never interleaved.
#[derive(Debug)]
pub struct JsonWriter<W> {
    out: Mutex<W>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    path: &'a str,
    result: &'a ResultRecord,
}

impl<W: Write + Send> JsonWriter<W> {
    /// Creates a new writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying output.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ResultWriter for JsonWriter<W> {
    fn write_dict_item(&self, path: &str, record: &ResultRecord) -> Result<(), WriteRecordError> {
        let mut line = serde_json::to_vec(&JsonLine {
            path,
            result: record,
        })
        .map_err(|error| WriteRecordError::Serialize {
            path: path.to_owned(),
            error,
        })?;
        line.push(b'\n');

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&line)
            .and_then(|()| out.flush())
            .map_err(|error| WriteRecordError::Io {
                path: path.to_owned(),
                error,
            })
    }
}
