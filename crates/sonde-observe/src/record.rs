// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! CSV output of information records.
//!
//! The first record written fixes the columns: its keys, in order, become
//! the header line. Every later record must carry exactly the same key set
//! and is written in header order.

use crate::information::InformationRecord;
use std::io::Write;

/// Failures of the record writer.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A record does not have the columns fixed by the first record.
    #[error("record columns {actual:?} do not match the header {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),
}

/// Quotes `field` if it contains a delimiter, a quote or a line break.
fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        std::borrow::Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        std::borrow::Cow::Borrowed(field)
    }
}

/// Writes information records as CSV rows.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    out: W,
    columns: Option<Vec<String>>,
    rows: u64,
}

impl<W: Write> RecordWriter<W> {
    #[inline]
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: None,
            rows: 0,
        }
    }

    /// The header, once the first record was written.
    #[inline]
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Number of data rows written.
    #[inline]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Writes `record` as one row; the first call also writes the header.
    pub fn write(&mut self, record: &InformationRecord) -> Result<(), ReportError> {
        let cells = record.cells();

        if self.columns.is_none() {
            let header: Vec<String> = cells.iter().map(|(k, _)| k.clone()).collect();
            let line: Vec<_> = header.iter().map(|k| escape(k)).collect();
            writeln!(self.out, "{}", line.join(","))?;
            self.columns = Some(header);
        }
        let columns = self.columns.as_deref().unwrap_or_default();

        let same_keys = cells.len() == columns.len()
            && columns.iter().all(|c| cells.iter().any(|(k, _)| k == c));
        if !same_keys {
            return Err(ReportError::ColumnMismatch {
                expected: columns.to_vec(),
                actual: cells.into_iter().map(|(k, _)| k).collect(),
            });
        }

        let line: Vec<_> = columns
            .iter()
            .map(|c| {
                cells
                    .iter()
                    .find(|(k, _)| k == c)
                    .map_or(std::borrow::Cow::Borrowed(""), |(_, v)| escape(v))
            })
            .collect();
        writeln!(self.out, "{}", line.join(","))?;
        self.rows += 1;
        Ok(())
    }

    #[inline]
    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.out.flush()?;
        Ok(())
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.out
    }
}
