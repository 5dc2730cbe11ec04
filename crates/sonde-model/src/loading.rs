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

//! Text loader for binary packing instances.
//!
//! The format is a flat stream of whitespace separated tokens. Everything
//! after a `#` up to the end of the line is a comment.
//!
//! ```raw
//! n m                 (number of variables, number of constraints)
//! c_1 ... c_n         (objective coefficients, maximized)
//! a_1_1 ... a_1_n     (row 1 of the constraint matrix)
//! ...
//! a_m_1 ... a_m_n     (row m of the constraint matrix)
//! b_1 ... b_m         (right-hand sides)
//! ```
//!
//! The loader accepts any `BufRead`, a file path, a raw reader or a string
//! slice. Tokens left over after the right-hand sides are rejected unless the
//! loader is configured to ignore them.

use crate::{
    index::{ConstraintIndex, VariableIndex},
    model::{Model, ModelBuilder, ModelError},
};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
    str::FromStr,
};

/// The error type for the instance loading process.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// An I/O error occurred while reading the input stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The input stream ended before all tokens were read.
    #[error("unexpected end of input while parsing instance")]
    UnexpectedEof,
    /// A token could not be parsed into the expected numeric type.
    #[error("could not parse token '{token}' on line {line} as {type_name}")]
    Parse {
        token: String,
        line: usize,
        type_name: &'static str,
    },
    /// Tokens remained after the last right-hand side.
    #[error("unexpected trailing token '{token}' on line {line}")]
    TrailingData { token: String, line: usize },
    /// The parsed data does not describe a valid model.
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),
}

/// A configurable loader for binary packing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemLoader {
    allow_trailing_data: bool,
}

impl Default for ProblemLoader {
    fn default() -> Self {
        Self {
            allow_trailing_data: false,
        }
    }
}

impl ProblemLoader {
    /// Creates a new `ProblemLoader` with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures whether tokens after the right-hand sides are ignored.
    #[inline]
    pub fn allow_trailing_data(mut self, yes: bool) -> Self {
        self.allow_trailing_data = yes;
        self
    }

    /// Loads a model from a type implementing `BufRead`.
    pub fn from_bufread<R: BufRead>(&self, rdr: R, name: &str) -> Result<Model, LoaderError> {
        let mut sc = Scanner::new(rdr);

        let n: usize = sc.next()?;
        let m: usize = sc.next()?;

        let mut builder = ModelBuilder::new(n, m);
        builder.name(name);

        for j in 0..n {
            let c: f64 = sc.next()?;
            builder.set_objective(VariableIndex::new(j), c);
        }

        for i in 0..m {
            let constraint = ConstraintIndex::new(i);
            for j in 0..n {
                let a: f64 = sc.next()?;
                builder.set_coefficient(constraint, VariableIndex::new(j), a);
            }
        }

        for i in 0..m {
            let b: f64 = sc.next()?;
            builder.set_rhs(ConstraintIndex::new(i), b);
        }

        if !self.allow_trailing_data {
            if let Some(token) = sc.next_token()? {
                return Err(LoaderError::TrailingData {
                    token,
                    line: sc.line,
                });
            }
        }

        Ok(builder.build()?)
    }

    /// Loads a model from a file path. The file stem becomes the model name.
    #[inline]
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Model, LoaderError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("unnamed"));
        let file = File::open(path)?;
        self.from_bufread(BufReader::new(file), &name)
    }

    /// Loads a model from a generic reader.
    #[inline]
    pub fn from_reader<R: Read>(&self, r: R, name: &str) -> Result<Model, LoaderError> {
        self.from_bufread(BufReader::new(r), name)
    }

    /// Loads a model from a string slice.
    #[inline]
    pub fn from_str(&self, s: &str, name: &str) -> Result<Model, LoaderError> {
        self.from_reader(s.as_bytes(), name)
    }
}

/// Reads whitespace delimited tokens line by line, skipping `#` comments.
struct Scanner<R> {
    rdr: R,
    tokens: std::collections::VecDeque<String>,
    line: usize,
}

impl<R: BufRead> Scanner<R> {
    #[inline]
    fn new(rdr: R) -> Self {
        Self {
            rdr,
            tokens: std::collections::VecDeque::new(),
            line: 0,
        }
    }

    /// Returns the next raw token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<String>, LoaderError> {
        let mut buf = String::new();
        while self.tokens.is_empty() {
            buf.clear();
            if self.rdr.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let content = buf.split('#').next().unwrap_or_default();
            self.tokens
                .extend(content.split_whitespace().map(str::to_owned));
        }
        Ok(self.tokens.pop_front())
    }

    /// Reads the next token and parses it into `T`.
    fn next<T: FromStr>(&mut self) -> Result<T, LoaderError> {
        let token = self.next_token()?.ok_or(LoaderError::UnexpectedEof)?;
        token.parse::<T>().map_err(|_| LoaderError::Parse {
            token,
            line: self.line,
            type_name: std::any::type_name::<T>(),
        })
    }
}
