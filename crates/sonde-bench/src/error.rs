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

//! Top-level errors of the command line driver.

use crate::exitcode;
use sonde_model::{loading::LoaderError, model::ModelError};
use sonde_observe::{error::ObserveError, record::ReportError};
use std::path::PathBuf;

/// Every failure a command can end with.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to load instance {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },
    #[error("generated instance is invalid: {0}")]
    Model(#[from] ModelError),
    #[error("the instance generator produced no instance")]
    EmptyGenerator,
    #[error(transparent)]
    Observe(#[from] ObserveError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write to stdout: {0}")]
    Stdout(#[from] std::io::Error),
}

impl CliError {
    /// The sysexits code this error terminates the process with.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Load { source, .. } => match source {
                LoaderError::Io(_) => exitcode::NOINPUT,
                _ => exitcode::DATAERR,
            },
            CliError::Model(_) => exitcode::DATAERR,
            CliError::EmptyGenerator => exitcode::SOFTWARE,
            CliError::Observe(e) => match e {
                ObserveError::Report(_) => exitcode::IOERR,
                _ => exitcode::SOFTWARE,
            },
            CliError::Report(_) | CliError::Output { .. } | CliError::Stdout(_) => exitcode::IOERR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::Load {
            path: PathBuf::from("missing.txt"),
            source: LoaderError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
        };
        assert_eq!(missing.exit_code(), exitcode::NOINPUT);

        let malformed = CliError::Load {
            path: PathBuf::from("bad.txt"),
            source: LoaderError::UnexpectedEof,
        };
        assert_eq!(malformed.exit_code(), exitcode::DATAERR);

        let duplicate = CliError::Observe(ObserveError::DuplicateExtractor {
            name: "x".to_string(),
        });
        assert_eq!(duplicate.exit_code(), exitcode::SOFTWARE);

        let mismatch = CliError::Report(ReportError::ColumnMismatch {
            expected: vec!["a".to_string()],
            actual: vec!["b".to_string()],
        });
        assert_eq!(mismatch.exit_code(), exitcode::IOERR);
        assert!(format!("{}", missing).contains("missing.txt"));
    }
}
