use std::io::{BufRead, Lines};

use cm_core::{Record, cm_warn};
use orion_error::prelude::*;
use serde_json::Value;

use crate::error::{RuntimeReason, RuntimeResult};

/// Reads records from JSON Lines input.
///
/// Blank lines are ignored. Lines that are not valid JSON, or not a JSON
/// object, are logged with their line number and skipped. Only read errors
/// end the stream with an `Err`.
pub struct RecordReader<R> {
    lines: Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines dropped as malformed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, reason: &dyn std::fmt::Display) {
        self.skipped += 1;
        cm_warn!(pipe, line = self.line_no, error = %reason, "input line skipped");
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = RuntimeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(
                        StructError::from(RuntimeReason::Input)
                            .with_detail(format!("read line {}: {e}", self.line_no + 1))
                            .err(),
                    );
                }
            };
            self.line_no += 1;

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(text) {
                Ok(v) => v,
                Err(e) => {
                    self.skip(&e);
                    continue;
                }
            };
            match Record::from_value(value) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => self.skip(&e),
            }
        }
    }
}
