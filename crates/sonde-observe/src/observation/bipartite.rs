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

//! Bipartite graph extractors, sparse and dense.

use crate::{
    error::ObserveError,
    observation::{Observation, ObservationExtractor},
};
use sonde_features::bipartite::{extract_bipartite, extract_bipartite_dense};
use sonde_solver::state::SolverState;

/// Per-episode bookkeeping of a bipartite extractor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BipartiteBuffer {
    /// Observations produced in the current episode.
    pub observations: u64,
    /// Node count at the last observation.
    pub last_node: Option<u64>,
}

impl BipartiteBuffer {
    #[inline]
    fn on_observation(&mut self, node: u64) {
        self.observations += 1;
        self.last_node = Some(node);
    }
}

/// Sparse bipartite graph recomputed at every node.
#[derive(Clone, Debug, Default)]
pub struct NodeBipartite {
    buffer: Option<BipartiteBuffer>,
}

impl NodeBipartite {
    pub const NAME: &'static str = "NodeBipartite";

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn buffer(&self) -> Option<&BipartiteBuffer> {
        self.buffer.as_ref()
    }
}

impl<S> ObservationExtractor<S> for NodeBipartite
where
    S: SolverState,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        self.buffer = Some(BipartiteBuffer::default());
        Ok(())
    }

    fn extract(&mut self, state: &S, done: bool) -> Result<Option<Observation>, ObserveError> {
        if done {
            self.buffer = None;
            return Ok(None);
        }
        let buffer = self.buffer.as_mut().ok_or_else(|| ObserveError::NotReset {
            extractor: Self::NAME.to_string(),
        })?;
        let graph = extract_bipartite(state)?;
        buffer.on_observation(state.node_count());
        Ok(Some(Observation::Bipartite(graph)))
    }
}

/// Bipartite graph with a dense coefficient matrix, recomputed at every node.
#[derive(Clone, Debug, Default)]
pub struct NodeBipartiteDense {
    buffer: Option<BipartiteBuffer>,
}

impl NodeBipartiteDense {
    pub const NAME: &'static str = "NodeBipartiteDense";

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn buffer(&self) -> Option<&BipartiteBuffer> {
        self.buffer.as_ref()
    }
}

impl<S> ObservationExtractor<S> for NodeBipartiteDense
where
    S: SolverState,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        self.buffer = Some(BipartiteBuffer::default());
        Ok(())
    }

    fn extract(&mut self, state: &S, done: bool) -> Result<Option<Observation>, ObserveError> {
        if done {
            self.buffer = None;
            return Ok(None);
        }
        let buffer = self.buffer.as_mut().ok_or_else(|| ObserveError::NotReset {
            extractor: Self::NAME.to_string(),
        })?;
        let graph = extract_bipartite_dense(state)?;
        buffer.on_observation(state.node_count());
        Ok(Some(Observation::DenseBipartite(graph)))
    }
}
