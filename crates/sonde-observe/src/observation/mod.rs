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

//! Observation extractors.
//!
//! An `ObservationExtractor` turns the solver state at a node into an
//! `Observation`. Extractors are stateful across one episode: `before_reset`
//! is called once before the episode starts and allocates a fresh buffer,
//! `extract` is called once per node. Extracting without a prior reset is a
//! usage error and fails fast with `ObserveError::NotReset`.
//!
//! When `done` is `true` the episode is over and there is no node to
//! observe; every extractor returns `Ok(None)` without touching the state
//! and drops its buffer. The next episode fails with `NotReset` until
//! `before_reset` runs again.

pub mod bipartite;
pub mod khalil;

use crate::error::ObserveError;
use sonde_features::{
    bipartite::{BipartiteGraph, DenseBipartite},
    khalil::KhalilFeatures,
};

pub use bipartite::{NodeBipartite, NodeBipartiteDense};
pub use khalil::Khalil2016;

/// The feature representation of one node.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    Bipartite(BipartiteGraph),
    DenseBipartite(DenseBipartite),
    Khalil(KhalilFeatures),
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observation::Bipartite(g) => write!(f, "{}", g),
            Observation::DenseBipartite(g) => write!(f, "{}", g),
            Observation::Khalil(k) => write!(f, "{}", k),
        }
    }
}

/// Computes an observation of the solver state at every node.
pub trait ObservationExtractor<S> {
    /// Returns the name of the extractor.
    fn name(&self) -> &str;

    /// Discards any previous episode state and prepares a fresh buffer.
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError>;

    /// Observes the current node, or returns `None` once `done` is set.
    fn extract(&mut self, state: &S, done: bool) -> Result<Option<Observation>, ObserveError>;
}

impl<S, E> ObservationExtractor<S> for &mut E
where
    E: ObservationExtractor<S> + ?Sized,
{
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        (**self).before_reset(state)
    }

    #[inline]
    fn extract(&mut self, state: &S, done: bool) -> Result<Option<Observation>, ObserveError> {
        (**self).extract(state, done)
    }
}

impl<S, E> ObservationExtractor<S> for Box<E>
where
    E: ObservationExtractor<S> + ?Sized,
{
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        (**self).before_reset(state)
    }

    #[inline]
    fn extract(&mut self, state: &S, done: bool) -> Result<Option<Observation>, ObserveError> {
        (**self).extract(state, done)
    }
}
