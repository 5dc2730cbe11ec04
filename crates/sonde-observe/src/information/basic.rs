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

//! Information functions reading solver counters.

use crate::{error::ObserveError, information::InformationFunction};
use sonde_solver::state::SolverState;
use std::time::{Duration, Instant};

/// Number of processed nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeCount;

impl<S: SolverState> InformationFunction<S> for NodeCount {
    type Value = u64;

    fn name(&self) -> &str {
        "nodes"
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        Ok(())
    }

    fn extract(&mut self, state: &S, _done: bool) -> Result<u64, ObserveError> {
        Ok(state.node_count())
    }
}

/// Total simplex pivots so far.
#[derive(Clone, Copy, Debug, Default)]
pub struct LpIterations;

impl<S: SolverState> InformationFunction<S> for LpIterations {
    type Value = u64;

    fn name(&self) -> &str {
        "lp_iterations"
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        Ok(())
    }

    fn extract(&mut self, state: &S, _done: bool) -> Result<u64, ObserveError> {
        Ok(state.statistics().lp_iterations)
    }
}

/// Number of LP branching candidates at the node; zero once done.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchingCandidates;

impl<S: SolverState> InformationFunction<S> for BranchingCandidates {
    type Value = u64;

    fn name(&self) -> &str {
        "branching_candidates"
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        Ok(())
    }

    fn extract(&mut self, state: &S, _done: bool) -> Result<u64, ObserveError> {
        Ok(state.lp_branch_candidates().len() as u64)
    }
}

/// Global dual bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct DualBound;

impl<S: SolverState> InformationFunction<S> for DualBound {
    type Value = f64;

    fn name(&self) -> &str {
        "dual_bound"
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        Ok(())
    }

    fn extract(&mut self, state: &S, _done: bool) -> Result<f64, ObserveError> {
        Ok(state.dual_bound())
    }
}

/// Emits a progress event at most once per `log_interval`, checking the
/// clock only on nodes where `node_count & node_mask == 0`. Reports the
/// node count.
#[derive(Clone, Debug)]
pub struct NodeLog {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    node_mask: u64,
}

impl NodeLog {
    pub fn new(log_interval: Duration, node_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            node_mask,
        }
    }

    /// Logs every node.
    pub fn every_node() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    /// Whether a progress event is due at node `nodes`.
    #[inline]
    pub fn is_due(&self, nodes: u64) -> bool {
        (nodes & self.node_mask) == 0 && self.last_log_time.elapsed() >= self.log_interval
    }
}

impl Default for NodeLog {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 63)
    }
}

impl std::fmt::Display for NodeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NodeLog(log_interval: {:?}, node_mask: {})",
            self.log_interval, self.node_mask
        )
    }
}

impl<S: SolverState> InformationFunction<S> for NodeLog {
    type Value = u64;

    fn name(&self) -> &str {
        "node_log"
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        Ok(())
    }

    fn extract(&mut self, state: &S, done: bool) -> Result<u64, ObserveError> {
        let nodes = state.node_count();
        if done {
            tracing::info!(
                elapsed = ?self.start_time.elapsed(),
                nodes,
                status = %state.status(),
                dual_bound = state.dual_bound(),
                incumbent = state.incumbent().map(|i| i.objective),
                "episode finished"
            );
        } else if self.is_due(nodes) {
            tracing::debug!(
                elapsed = ?self.start_time.elapsed(),
                nodes,
                depth = state.depth(),
                candidates = state.lp_branch_candidates().len(),
                dual_bound = state.dual_bound(),
                incumbent = state.incumbent().map(|i| i.objective),
                "search progress"
            );
            self.last_log_time = Instant::now();
        }
        Ok(nodes)
    }
}
