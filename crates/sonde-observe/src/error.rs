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

use crate::{clock::ClockError, record::ReportError};
use sonde_features::error::FeatureError;
use sonde_solver::error::SolverError;

/// Failures while observing or benchmarking a search.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// `extract` was called on an extractor that was never reset.
    #[error("extractor `{extractor}` was used before `before_reset`")]
    NotReset { extractor: String },
    /// Two extractors were registered under the same name.
    #[error("an extractor named `{name}` is already registered")]
    DuplicateExtractor { name: String },
    /// Two probes of one driver report under the same name.
    #[error("more than one probe reports under the name `{name}`")]
    DuplicateProbe { name: String },
    /// An episode record lacks a metric, or holds it with another type.
    #[error("episode record has no timer metric `{name}`")]
    MissingMetric { name: String },
    /// The solver stopped at a node without LP branching candidates.
    #[error("node {node} has no LP branching candidate")]
    NoBranchingCandidate { node: u64 },
    /// A cumulative reducer failed.
    #[error("reducer of `{function}` failed: {message}")]
    Reducer { function: String, message: String },
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
