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

use std::time::Duration;

/// Statistics collected while a `Solver` advances through the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverStatistics {
    /// Processed nodes, including nodes pruned after their LP was solved.
    pub nodes: u64,
    /// Total simplex pivots.
    pub lp_iterations: u64,
    /// Total LP solves.
    pub lp_solves: u64,
    /// Cover cuts added at the root.
    pub cuts_added: u64,
    /// Separation rounds performed at the root.
    pub cut_rounds: u64,
    /// Variables fixed to zero by presolve.
    pub presolve_fixings: u64,
    /// Constraints removed by presolve.
    pub presolve_removed_constraints: u64,
    /// Nodes whose relaxation was infeasible.
    pub prunings_infeasible: u64,
    /// Nodes whose bound could not beat the incumbent.
    pub prunings_bound: u64,
    /// Improvements of the incumbent.
    pub incumbent_updates: u64,
    /// The deepest level reached in the tree.
    pub max_depth: u64,
    /// Number of branchings per (working) variable.
    pub branch_counts: Vec<u64>,
    /// Wall time spent inside the solver.
    pub solving_time: Duration,
}

impl SolverStatistics {
    /// Creates zeroed statistics for a model with `num_variables` variables.
    pub fn new(num_variables: usize) -> Self {
        Self {
            nodes: 0,
            lp_iterations: 0,
            lp_solves: 0,
            cuts_added: 0,
            cut_rounds: 0,
            presolve_fixings: 0,
            presolve_removed_constraints: 0,
            prunings_infeasible: 0,
            prunings_bound: 0,
            incumbent_updates: 0,
            max_depth: 0,
            branch_counts: vec![0; num_variables],
            solving_time: Duration::ZERO,
        }
    }

    #[inline]
    pub fn on_node(&mut self, depth: usize) {
        self.nodes = self.nodes.saturating_add(1);
        self.max_depth = self.max_depth.max(depth as u64);
    }

    #[inline]
    pub fn on_lp_solved(&mut self, iterations: u64) {
        self.lp_solves = self.lp_solves.saturating_add(1);
        self.lp_iterations = self.lp_iterations.saturating_add(iterations);
    }

    #[inline]
    pub fn on_cut_round(&mut self, added: usize) {
        self.cut_rounds = self.cut_rounds.saturating_add(1);
        self.cuts_added = self.cuts_added.saturating_add(added as u64);
    }

    #[inline]
    pub fn on_presolve(&mut self, fixings: usize, removed_constraints: usize) {
        self.presolve_fixings = fixings as u64;
        self.presolve_removed_constraints = removed_constraints as u64;
    }

    #[inline]
    pub fn on_pruning_infeasible(&mut self) {
        self.prunings_infeasible = self.prunings_infeasible.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_incumbent_update(&mut self) {
        self.incumbent_updates = self.incumbent_updates.saturating_add(1);
    }

    /// Records a branching on the working variable at `variable`.
    #[inline]
    pub fn on_branch(&mut self, variable: usize) {
        if let Some(count) = self.branch_counts.get_mut(variable) {
            *count = count.saturating_add(1);
        }
    }

    #[inline]
    pub fn add_solving_time(&mut self, elapsed: Duration) {
        self.solving_time = self.solving_time.saturating_add(elapsed);
    }

    /// Returns the number of branchings on `variable`.
    #[inline]
    pub fn branch_count(&self, variable: usize) -> u64 {
        self.branch_counts.get(variable).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sonde Solver Statistics:")?;
        writeln!(f, "  Nodes:                 {}", self.nodes)?;
        writeln!(f, "  Max depth reached:     {}", self.max_depth)?;
        writeln!(f, "  LP solves:             {}", self.lp_solves)?;
        writeln!(f, "  LP iterations:         {}", self.lp_iterations)?;
        writeln!(f, "  Cut rounds:            {}", self.cut_rounds)?;
        writeln!(f, "  Cuts added:            {}", self.cuts_added)?;
        writeln!(f, "  Presolve fixings:      {}", self.presolve_fixings)?;
        writeln!(f, "  Presolve removed rows: {}", self.presolve_removed_constraints)?;
        writeln!(f, "  Prunings (infeasible): {}", self.prunings_infeasible)?;
        writeln!(f, "  Prunings (bound):      {}", self.prunings_bound)?;
        writeln!(f, "  Incumbent updates:     {}", self.incumbent_updates)?;
        writeln!(f, "  Solving time:          {:.2?}", self.solving_time)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut s = SolverStatistics::new(3);
        s.on_node(0);
        s.on_node(4);
        s.on_lp_solved(7);
        s.on_lp_solved(3);
        s.on_cut_round(2);
        s.on_branch(1);
        s.on_branch(1);
        s.on_branch(9);
        assert_eq!(s.nodes, 2);
        assert_eq!(s.max_depth, 4);
        assert_eq!(s.lp_iterations, 10);
        assert_eq!(s.lp_solves, 2);
        assert_eq!(s.cuts_added, 2);
        assert_eq!(s.branch_count(1), 2);
        assert_eq!(s.branch_count(9), 0);
        assert!(format!("{}", s).contains("Nodes:                 2"));
    }
}
