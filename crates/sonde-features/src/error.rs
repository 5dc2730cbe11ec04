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

use sonde_model::index::VariableIndex;

/// Failures of the feature functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    /// The solver is not at a focus node with a solved LP.
    #[error("no LP solution is available at the current node")]
    NoLpSolution,
    /// Per-node features were requested before the static cache was built.
    #[error("feature buffer is not initialized")]
    UninitializedBuffer,
    /// The static cache was built twice within one episode.
    #[error("static features were already initialized at node {node}")]
    StaticAlreadyInitialized { node: u64 },
    /// A candidate does not exist in the working model.
    #[error("{variable} is not a variable of the model ({num_variables} variables)")]
    UnknownVariable {
        variable: VariableIndex,
        num_variables: usize,
    },
}
