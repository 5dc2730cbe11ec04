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

//! Step-wise depth-first branch-and-bound.
//!
//! The solver never picks a branching variable itself. It advances through
//! the tree until it reaches a node whose LP solution is fractional and then
//! stops, leaving the decision to the caller through `solve_iter_branch`.
//! Nodes that can be settled without a decision (infeasible, bounded or
//! integral) are processed and counted along the way.

use crate::{
    cuts::separate_cover_cuts,
    error::SolverError,
    lp::{EPSILON, LpOutcome, LpSolution, solve_relaxation},
    node::{Node, NodeBounds, NodeStack},
    presolve::presolve,
    settings::SolverSettings,
    state::{Incumbent, SolveStatus, SolverState, Stage},
    stats::SolverStatistics,
};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};
use std::time::Instant;

/// Minimal objective improvement a node must promise to stay open.
const BOUND_TOLERANCE: f64 = 1e-6;

/// A branch-and-bound solver over a binary packing `Model`.
#[derive(Debug, Clone)]
pub struct Solver {
    original: Model,
    settings: SolverSettings,
    stage: Stage,
    status: SolveStatus,
    model: Model,
    order: Vec<VariableIndex>,
    stack: NodeStack,
    focus: Option<Node>,
    focus_bounds: NodeBounds,
    lp: Option<LpSolution>,
    lp_candidates: Vec<VariableIndex>,
    pseudo_candidates: Vec<VariableIndex>,
    incumbent: Option<Incumbent>,
    stats: SolverStatistics,
}

impl Solver {
    /// Creates a solver in stage `Problem`.
    pub fn new(model: Model, settings: SolverSettings) -> Self {
        let n = model.num_variables();
        Self {
            original: model.clone(),
            settings,
            stage: Stage::Problem,
            status: SolveStatus::Unknown,
            model,
            order: (0..n).map(VariableIndex::new).collect(),
            stack: NodeStack::preallocated(n),
            focus: None,
            focus_bounds: NodeBounds::new(n),
            lp: None,
            lp_candidates: Vec::new(),
            pseudo_candidates: Vec::new(),
            incumbent: None,
            stats: SolverStatistics::new(n),
        }
    }

    /// The model as it was passed to `new`.
    #[inline]
    pub fn original_model(&self) -> &Model {
        &self.original
    }

    /// Maps a working variable back to its index in the original model.
    #[inline]
    pub fn original_variable(&self, variable: VariableIndex) -> VariableIndex {
        self.order[variable.get()]
    }

    /// Returns the incumbent values in original variable order.
    pub fn original_solution(&self) -> Option<Vec<f64>> {
        self.incumbent.as_ref().map(|inc| {
            let mut values = vec![0.0; self.original.num_variables()];
            for (k, x) in inc.values.iter().enumerate() {
                values[self.order[k].get()] = *x;
            }
            values
        })
    }

    /// Runs the search to completion, always branching on the first LP candidate.
    pub fn solve(&mut self) -> Result<SolveStatus, SolverError> {
        if self.stage == Stage::Problem {
            self.solve_iter()?;
        }
        while !self.solve_iter_is_done() {
            let variable = self.lp_candidates[0];
            self.solve_iter_branch(variable)?;
        }
        Ok(self.status)
    }

    #[inline]
    fn require_stage(&self, operation: &'static str, expected: Stage) -> Result<(), SolverError> {
        if self.stage != expected {
            return Err(SolverError::InvalidStage {
                operation,
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Builds the working model and the root node.
    fn setup(&mut self) -> Result<(), SolverError> {
        let n = self.original.num_variables();
        if self.settings.permute_variables {
            let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed);
            self.order.shuffle(&mut rng);
            self.model = self.original.permute_variables(&self.order)?;
        }

        let mut root_bounds = NodeBounds::new(n);
        if self.settings.presolve {
            let outcome = presolve(&self.model);
            self.stats
                .on_presolve(outcome.fixed_variables, outcome.removed_constraints);
            self.model = outcome.model;
            root_bounds = outcome.bounds;
        }

        tracing::debug!(
            model = self.model.name(),
            variables = n,
            constraints = self.model.num_constraints(),
            settings = %self.settings,
            "solver set up"
        );

        self.focus_bounds = root_bounds.clone();
        self.stack.push(Node::root(root_bounds));
        Ok(())
    }

    #[inline]
    fn incumbent_objective(&self) -> f64 {
        self.incumbent
            .as_ref()
            .map_or(f64::NEG_INFINITY, |inc| inc.objective)
    }

    #[inline]
    fn is_bounded_out(&self, bound: f64) -> bool {
        bound <= self.incumbent_objective() + BOUND_TOLERANCE
    }

    fn solve_node_lp(&mut self, bounds: &NodeBounds) -> Result<LpOutcome, SolverError> {
        let outcome = solve_relaxation(&self.model, bounds, self.settings.lp_iteration_limit)?;
        if let LpOutcome::Optimal(lp) = &outcome {
            self.stats.on_lp_solved(lp.iterations);
        }
        Ok(outcome)
    }

    /// Adds cover cuts at the root while they cut off the LP point.
    fn separate_root(&mut self, bounds: &NodeBounds, mut lp: LpSolution) -> Result<LpOutcome, SolverError> {
        let n = self.model.num_variables();
        for _ in 0..self.settings.max_cut_rounds {
            let cuts = separate_cover_cuts(&self.model, bounds, &lp);
            if cuts.is_empty() {
                break;
            }
            for cut in &cuts {
                self.model.push_constraint(&cut.row(n), cut.rhs())?;
            }
            self.stats.on_cut_round(cuts.len());
            tracing::trace!(added = cuts.len(), "cover cuts added at the root");

            match self.solve_node_lp(bounds)? {
                LpOutcome::Optimal(next) => lp = next,
                LpOutcome::Infeasible => return Ok(LpOutcome::Infeasible),
            }
        }
        Ok(LpOutcome::Optimal(lp))
    }

    /// Rounds the LP point down and fills greedily by objective.
    fn round_lp(&mut self, bounds: &NodeBounds, lp: &LpSolution) {
        let n = self.model.num_variables();
        let mut values: Vec<f64> = lp
            .values
            .iter()
            .map(|x| if *x >= 1.0 - EPSILON { 1.0 } else { 0.0 })
            .collect();
        let mut activity: Vec<f64> = (0..self.model.num_constraints())
            .map(|i| {
                let row = self.model.row(ConstraintIndex::new(i));
                row.iter().zip(&values).map(|(a, x)| a * x).sum()
            })
            .collect();

        let mut order: Vec<VariableIndex> = bounds.free().filter(|v| values[v.get()] == 0.0).collect();
        order.sort_by(|a, b| {
            self.model
                .objective(*b)
                .total_cmp(&self.model.objective(*a))
                .then(a.cmp(b))
        });
        for v in order {
            if self.model.objective(v) <= 0.0 {
                break;
            }
            let fits = self
                .model
                .column_nonzeros(v)
                .all(|(c, a)| activity[c.get()] + a <= self.model.rhs(c) + EPSILON);
            if fits {
                values[v.get()] = 1.0;
                for (c, a) in self.model.column_nonzeros(v) {
                    activity[c.get()] += a;
                }
            }
        }

        debug_assert_eq!(values.len(), n);
        if self.model.is_feasible(&values, EPSILON) {
            let objective = self.model.evaluate(&values);
            self.try_incumbent(values, objective);
        }
    }

    fn try_incumbent(&mut self, values: Vec<f64>, objective: f64) {
        if objective > self.incumbent_objective() + BOUND_TOLERANCE {
            tracing::trace!(objective, "new incumbent");
            self.stats.on_incumbent_update();
            self.incumbent = Some(Incumbent { values, objective });
        }
    }

    fn finish(&mut self, status: SolveStatus) {
        self.stage = Stage::Solved;
        self.status = status;
        self.focus = None;
        self.lp = None;
        self.lp_candidates.clear();
        self.pseudo_candidates.clear();
        tracing::debug!(
            status = %status,
            nodes = self.stats.nodes,
            objective = self.incumbent_objective(),
            "search finished"
        );
    }

    /// Processes nodes until one needs a branching decision or the search ends.
    fn advance(&mut self) -> Result<(), SolverError> {
        loop {
            if self.stack.is_empty() {
                let status = if self.incumbent.is_some() {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Infeasible
                };
                self.finish(status);
                return Ok(());
            }
            if let Some(limit) = self.settings.node_limit {
                if self.stats.nodes >= limit {
                    self.finish(SolveStatus::NodeLimit);
                    return Ok(());
                }
            }

            let Some(node) = self.stack.pop() else {
                continue;
            };
            if self.is_bounded_out(node.parent_bound) {
                self.stats.on_pruning_bound();
                continue;
            }

            self.stats.on_node(node.depth);
            self.focus_bounds = node.bounds.clone();
            tracing::trace!(
                node = self.stats.nodes,
                depth = node.depth,
                bounds = %node.bounds,
                "processing node"
            );

            let mut outcome = self.solve_node_lp(&node.bounds)?;
            if node.depth == 0 && self.settings.cuts {
                if let LpOutcome::Optimal(lp) = outcome {
                    outcome = self.separate_root(&node.bounds, lp)?;
                }
            }
            let lp = match outcome {
                LpOutcome::Optimal(lp) => lp,
                LpOutcome::Infeasible => {
                    self.stats.on_pruning_infeasible();
                    continue;
                }
            };

            if self.is_bounded_out(lp.objective) {
                self.stats.on_pruning_bound();
                continue;
            }

            self.round_lp(&node.bounds, &lp);

            let candidates: Vec<VariableIndex> = node
                .bounds
                .free()
                .filter(|v| !lp.is_integral(*v))
                .collect();
            if candidates.is_empty() {
                let objective = lp.objective;
                let values = lp.values.iter().map(|x| x.round()).collect();
                self.try_incumbent(values, objective);
                continue;
            }
            if self.is_bounded_out(lp.objective) {
                self.stats.on_pruning_bound();
                continue;
            }

            self.pseudo_candidates = node.bounds.free().collect();
            self.lp_candidates = candidates;
            self.lp = Some(lp);
            self.focus = Some(node);
            return Ok(());
        }
    }
}

impl SolverState for Solver {
    #[inline]
    fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    #[inline]
    fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    fn status(&self) -> SolveStatus {
        self.status
    }

    #[inline]
    fn node_count(&self) -> u64 {
        self.stats.nodes
    }

    #[inline]
    fn depth(&self) -> usize {
        self.focus.as_ref().map_or(0, |node| node.depth)
    }

    #[inline]
    fn lp_solution(&self) -> Option<&LpSolution> {
        self.lp.as_ref()
    }

    #[inline]
    fn lp_branch_candidates(&self) -> &[VariableIndex] {
        &self.lp_candidates
    }

    #[inline]
    fn pseudo_branch_candidates(&self) -> &[VariableIndex] {
        &self.pseudo_candidates
    }

    #[inline]
    fn local_bounds(&self) -> &NodeBounds {
        &self.focus_bounds
    }

    #[inline]
    fn incumbent(&self) -> Option<&Incumbent> {
        self.incumbent.as_ref()
    }

    fn dual_bound(&self) -> f64 {
        let focus = self.lp.as_ref().map(|lp| lp.objective);
        let open = self.stack.best_bound();
        match (focus, open) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => self.incumbent_objective(),
        }
    }

    #[inline]
    fn statistics(&self) -> &SolverStatistics {
        &self.stats
    }

    fn set_seed(&mut self, seed: u64) -> Result<(), SolverError> {
        self.require_stage("set_seed", Stage::Problem)?;
        self.settings.seed = seed;
        Ok(())
    }

    fn set_presolve(&mut self, enabled: bool) -> Result<(), SolverError> {
        self.require_stage("set_presolve", Stage::Problem)?;
        self.settings.presolve = enabled;
        Ok(())
    }

    fn set_cuts(&mut self, enabled: bool) -> Result<(), SolverError> {
        self.require_stage("set_cuts", Stage::Problem)?;
        self.settings.cuts = enabled;
        Ok(())
    }

    fn set_node_limit(&mut self, limit: Option<u64>) -> Result<(), SolverError> {
        self.require_stage("set_node_limit", Stage::Problem)?;
        self.settings.node_limit = limit;
        Ok(())
    }

    fn solve_iter(&mut self) -> Result<(), SolverError> {
        self.require_stage("solve_iter", Stage::Problem)?;
        let start = Instant::now();
        self.stage = Stage::Solving;
        self.setup()?;
        let result = self.advance();
        self.stats.add_solving_time(start.elapsed());
        result
    }

    fn solve_iter_branch(&mut self, variable: VariableIndex) -> Result<(), SolverError> {
        self.require_stage("solve_iter_branch", Stage::Solving)?;
        if !self.lp_candidates.contains(&variable) {
            return Err(SolverError::NotBranchable { variable });
        }
        let (Some(node), Some(lp)) = (self.focus.take(), self.lp.take()) else {
            return Err(SolverError::NotBranchable { variable });
        };

        let start = Instant::now();
        self.stats.on_branch(variable.get());
        tracing::trace!(%variable, value = lp.value(variable), "branching");

        let mut down = node.bounds.clone();
        down.fix_zero(variable);
        let mut up = node.bounds;
        up.fix_one(variable);
        self.stack.push(Node {
            bounds: up,
            depth: node.depth + 1,
            parent_bound: lp.objective,
        });
        self.stack.push(Node {
            bounds: down,
            depth: node.depth + 1,
            parent_bound: lp.objective,
        });
        self.lp_candidates.clear();
        self.pseudo_candidates.clear();

        let result = self.advance();
        self.stats.add_solving_time(start.elapsed());
        result
    }

    #[inline]
    fn solve_iter_is_done(&self) -> bool {
        self.stage == Stage::Solved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonde_model::{
        generator::{KnapsackGenerator, KnapsackGeneratorConfig},
        model::ModelBuilder,
    };

    fn v(j: usize) -> VariableIndex {
        VariableIndex::new(j)
    }

    /// max 10x0 + 6x1 + 4x2  s.t.  5x0 + 4x1 + 3x2 <= 7
    fn knapsack() -> Model {
        let mut b = ModelBuilder::new(3, 1);
        let c = ConstraintIndex::new(0);
        b.set_objective(v(0), 10.0)
            .set_objective(v(1), 6.0)
            .set_objective(v(2), 4.0)
            .set_coefficient(c, v(0), 5.0)
            .set_coefficient(c, v(1), 4.0)
            .set_coefficient(c, v(2), 3.0)
            .set_rhs(c, 7.0);
        b.build().unwrap()
    }

    fn brute_force(model: &Model) -> f64 {
        let n = model.num_variables();
        let mut best = f64::NEG_INFINITY;
        for mask in 0u32..(1 << n) {
            let values: Vec<f64> = (0..n).map(|j| ((mask >> j) & 1) as f64).collect();
            if model.is_feasible(&values, 1e-9) {
                best = best.max(model.evaluate(&values));
            }
        }
        best
    }

    #[test]
    fn test_stops_at_fractional_root() {
        let settings = SolverSettings::reproducible(784, 100).with_permutation(false);
        let mut solver = Solver::new(knapsack(), settings);
        solver.solve_iter().unwrap();

        assert_eq!(solver.stage(), Stage::Solving);
        assert_eq!(solver.node_count(), 1);
        assert_eq!(solver.depth(), 0);
        assert_eq!(solver.lp_branch_candidates(), &[v(1)]);
        assert_eq!(solver.pseudo_branch_candidates(), &[v(0), v(1), v(2)]);
        let lp = solver.lp_solution().unwrap();
        assert!((lp.objective - 13.0).abs() < 1e-9);
        assert!((solver.dual_bound() - 13.0).abs() < 1e-9);
        // Rounding keeps x0 and fills nothing else.
        assert_eq!(solver.incumbent().map(|i| i.objective), Some(10.0));
    }

    #[test]
    fn test_solves_knapsack_to_optimality() {
        let settings = SolverSettings::reproducible(1, 1_000);
        let mut solver = Solver::new(knapsack(), settings);
        let status = solver.solve().unwrap();

        assert_eq!(status, SolveStatus::Optimal);
        assert!(solver.solve_iter_is_done());
        assert_eq!(solver.incumbent().map(|i| i.objective), Some(10.0));
        let original = solver.original_solution().unwrap();
        assert_eq!(original, vec![1.0, 0.0, 0.0]);
        assert!(solver.lp_solution().is_none());
        assert!(solver.lp_branch_candidates().is_empty());
    }

    #[test]
    fn test_matches_brute_force_on_generated_instances() {
        let config = KnapsackGeneratorConfig {
            num_items: 10,
            num_knapsacks: 2,
            ..KnapsackGeneratorConfig::default()
        };
        for (seed, model) in KnapsackGenerator::new(config, 42).take(4).enumerate() {
            let model = model.unwrap();
            let expected = brute_force(&model);
            for cuts in [false, true] {
                let settings = SolverSettings::new()
                    .with_seed(seed as u64)
                    .with_cuts(cuts);
                let mut solver = Solver::new(model.clone(), settings);
                assert_eq!(solver.solve().unwrap(), SolveStatus::Optimal);
                let objective = solver.incumbent().map(|i| i.objective).unwrap();
                assert!(
                    (objective - expected).abs() < 1e-6,
                    "instance {seed} cuts {cuts}: got {objective}, expected {expected}"
                );
                let values = solver.original_solution().unwrap();
                assert!(model.is_feasible(&values, 1e-9));
                assert!((model.evaluate(&values) - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_node_limit_stops_search() {
        let config = KnapsackGeneratorConfig {
            num_items: 25,
            num_knapsacks: 3,
            ..KnapsackGeneratorConfig::default()
        };
        let model = KnapsackGenerator::new(config, 7).next().unwrap().unwrap();
        let mut solver = Solver::new(model, SolverSettings::reproducible(784, 3));
        let status = solver.solve().unwrap();
        assert!(solver.node_count() <= 3);
        if status == SolveStatus::NodeLimit {
            assert_eq!(solver.node_count(), 3);
        }
    }

    #[test]
    fn test_same_seed_gives_same_trajectory() {
        let model = KnapsackGenerator::new(KnapsackGeneratorConfig::default(), 3)
            .next()
            .unwrap()
            .unwrap();
        let trajectory = |seed: u64| {
            let mut solver = Solver::new(model.clone(), SolverSettings::reproducible(seed, 20));
            let mut steps = Vec::new();
            solver.solve_iter().unwrap();
            while !solver.solve_iter_is_done() {
                let v = solver.lp_branch_candidates()[0];
                steps.push((solver.node_count(), v));
                solver.solve_iter_branch(v).unwrap();
            }
            (steps, solver.node_count())
        };
        assert_eq!(trajectory(784), trajectory(784));
    }

    #[test]
    fn test_setters_rejected_after_start() {
        let mut solver = Solver::new(knapsack(), SolverSettings::new());
        solver.set_seed(5).unwrap();
        solver.set_presolve(false).unwrap();
        solver.set_cuts(false).unwrap();
        solver.set_node_limit(Some(4)).unwrap();
        assert_eq!(solver.settings().seed, 5);
        assert_eq!(solver.settings().node_limit, Some(4));

        solver.solve_iter().unwrap();
        let err = solver.set_seed(6).unwrap_err();
        assert!(matches!(
            err,
            SolverError::InvalidStage {
                operation: "set_seed",
                expected: Stage::Problem,
                ..
            }
        ));
        assert!(solver.solve_iter().is_err());
    }

    #[test]
    fn test_branching_requires_lp_candidate() {
        let settings = SolverSettings::reproducible(0, 100).with_permutation(false);
        let mut solver = Solver::new(knapsack(), settings);
        let err = solver.solve_iter_branch(v(1)).unwrap_err();
        assert!(matches!(err, SolverError::InvalidStage { .. }));

        solver.solve_iter().unwrap();
        let err = solver.solve_iter_branch(v(0)).unwrap_err();
        assert_eq!(err, SolverError::NotBranchable { variable: v(0) });
        solver.solve_iter_branch(v(1)).unwrap();
        assert_eq!(solver.statistics().branch_count(1), 1);
    }

    #[test]
    fn test_presolve_statistics_are_recorded() {
        let mut b = ModelBuilder::new(2, 1);
        let c = ConstraintIndex::new(0);
        b.set_objective(v(0), 5.0)
            .set_objective(v(1), 1.0)
            .set_coefficient(c, v(0), 9.0)
            .set_coefficient(c, v(1), 1.0)
            .set_rhs(c, 4.0);
        let model = b.build().unwrap();
        let settings = SolverSettings::new().with_permutation(false);
        let mut solver = Solver::new(model, settings);
        assert_eq!(solver.solve().unwrap(), SolveStatus::Optimal);
        assert_eq!(solver.statistics().presolve_fixings, 1);
        assert_eq!(solver.statistics().presolve_removed_constraints, 1);
        assert_eq!(solver.incumbent().map(|i| i.objective), Some(1.0));
    }
}
