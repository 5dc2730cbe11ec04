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

use crate::state::Stage;
use sonde_model::{index::VariableIndex, model::ModelError};

/// Failures of the LP relaxation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LpError {
    /// The simplex method did not converge within the iteration limit.
    #[error("simplex iteration limit of {limit} reached")]
    IterationLimit { limit: u64 },
    /// No leaving row exists for an improving column.
    #[error("LP relaxation is unbounded")]
    Unbounded,
}

/// Failures of the branch-and-bound solver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// An operation was called in a stage that does not allow it.
    #[error("`{operation}` is not allowed in stage {actual} (expected {expected})")]
    InvalidStage {
        operation: &'static str,
        expected: Stage,
        actual: Stage,
    },
    /// The variable is not a branching candidate of the focus node.
    #[error("{variable} is not a branching candidate of the focus node")]
    NotBranchable { variable: VariableIndex },
    /// The LP relaxation failed.
    #[error("LP relaxation failed: {0}")]
    Lp(#[from] LpError),
    /// The working model could not be transformed.
    #[error("model transformation failed: {0}")]
    Model(#[from] ModelError),
}
