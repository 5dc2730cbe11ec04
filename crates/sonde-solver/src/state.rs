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

//! The observable state of a step-wise branch-and-bound run.
//!
//! `SolverState` is the contract between the solver and everything that
//! inspects it at a node: feature functions, observation extractors and
//! information functions only ever see a `&S`. Advancing the tree requires
//! `&mut S` and goes through `solve_iter`, `solve_iter_branch` and
//! `solve_iter_is_done`.

use crate::{
    error::SolverError, lp::LpSolution, node::NodeBounds, settings::SolverSettings,
    stats::SolverStatistics,
};
use sonde_model::{index::VariableIndex, model::Model};

/// Lifecycle stage of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The problem is loaded and settings may still change.
    Problem,
    /// The tree search has started and waits at a focus node.
    Solving,
    /// The search is finished.
    Solved,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Problem => write!(f, "Problem"),
            Stage::Solving => write!(f, "Solving"),
            Stage::Solved => write!(f, "Solved"),
        }
    }
}

/// Outcome of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// No conclusion has been reached yet.
    Unknown,
    /// The tree was exhausted and the incumbent is optimal.
    Optimal,
    /// The tree was exhausted without a feasible solution.
    Infeasible,
    /// The node limit stopped the search.
    NodeLimit,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Unknown => write!(f, "Unknown"),
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::NodeLimit => write!(f, "NodeLimit"),
        }
    }
}

/// Best known feasible solution, in working variable order.
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    pub values: Vec<f64>,
    pub objective: f64,
}

impl std::fmt::Display for Incumbent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Incumbent(objective: {}, ones: {})",
            self.objective,
            self.values.iter().filter(|x| **x > 0.5).count()
        )
    }
}

/// Read access to a solver at a node, plus step-wise advancement.
///
/// All variable indices refer to the working model returned by `model()`,
/// which may be permuted, presolved and extended by cuts.
pub trait SolverState {
    /// The working model.
    fn model(&self) -> &Model;

    fn settings(&self) -> &SolverSettings;

    fn stage(&self) -> Stage;

    fn status(&self) -> SolveStatus;

    /// Number of processed nodes so far. The focus node is included.
    fn node_count(&self) -> u64;

    /// Depth of the focus node.
    fn depth(&self) -> usize;

    /// LP solution of the focus node, if one is focused.
    fn lp_solution(&self) -> Option<&LpSolution>;

    /// Free variables with a fractional LP value at the focus node, in index order.
    fn lp_branch_candidates(&self) -> &[VariableIndex];

    /// All free variables at the focus node, in index order.
    fn pseudo_branch_candidates(&self) -> &[VariableIndex];

    /// Local bounds of the focus node.
    fn local_bounds(&self) -> &NodeBounds;

    fn incumbent(&self) -> Option<&Incumbent>;

    /// Best bound over the focus node and all open nodes.
    fn dual_bound(&self) -> f64;

    fn statistics(&self) -> &SolverStatistics;

    /// Sets the permutation seed. Only allowed before solving starts.
    fn set_seed(&mut self, seed: u64) -> Result<(), SolverError>;

    /// Enables or disables presolve. Only allowed before solving starts.
    fn set_presolve(&mut self, enabled: bool) -> Result<(), SolverError>;

    /// Enables or disables root cuts. Only allowed before solving starts.
    fn set_cuts(&mut self, enabled: bool) -> Result<(), SolverError>;

    /// Sets the node limit. Only allowed before solving starts.
    fn set_node_limit(&mut self, limit: Option<u64>) -> Result<(), SolverError>;

    /// Starts solving and advances to the first node that needs a branching
    /// decision, or to the end of the search.
    fn solve_iter(&mut self) -> Result<(), SolverError>;

    /// Branches on `variable` at the focus node and advances to the next node
    /// that needs a branching decision, or to the end of the search.
    fn solve_iter_branch(&mut self, variable: VariableIndex) -> Result<(), SolverError>;

    /// Returns `true` once the search is finished.
    fn solve_iter_is_done(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Stage::Solving), "Solving");
        assert_eq!(format!("{}", SolveStatus::NodeLimit), "NodeLimit");
        let inc = Incumbent {
            values: vec![1.0, 0.0, 1.0],
            objective: 3.5,
        };
        assert_eq!(format!("{}", inc), "Incumbent(objective: 3.5, ones: 2)");
    }
}
