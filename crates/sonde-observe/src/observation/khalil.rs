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

//! Khalil-2016 candidate features.
//!
//! The static part of the features is built on the first node of the
//! episode (node count 1) and reused for every later node. Each node yields
//! one feature row per pseudo branching candidate.

use crate::{
    error::ObserveError,
    observation::{Observation, ObservationExtractor},
};
use sonde_features::khalil::{KhalilBuffer, KhalilFeatures, extract_khalil_variable_features};
use sonde_solver::state::SolverState;

#[derive(Clone, Debug, Default)]
pub struct Khalil2016 {
    buffer: Option<KhalilBuffer>,
}

impl Khalil2016 {
    pub const NAME: &'static str = "Khalil2016";

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer of the current episode, `None` before the first reset.
    #[inline]
    pub fn buffer(&self) -> Option<&KhalilBuffer> {
        self.buffer.as_ref()
    }
}

impl<S> ObservationExtractor<S> for Khalil2016
where
    S: SolverState,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_reset(&mut self, _state: &S) -> Result<(), ObserveError> {
        self.buffer = Some(KhalilBuffer::new());
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

        if state.node_count() == 1 {
            extract_khalil_variable_features(state, &[], buffer)?;
        }

        let candidates = state.pseudo_branch_candidates();
        if candidates.is_empty() {
            return Ok(Some(Observation::Khalil(KhalilFeatures::empty())));
        }
        let features = extract_khalil_variable_features(state, candidates, buffer)?;
        Ok(Some(Observation::Khalil(features)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{focused_solver, knapsack_solver};
    use sonde_features::error::FeatureError;

    #[test]
    fn test_static_initialization_at_first_node_only() {
        let mut solver = knapsack_solver(784, 50);
        let mut khalil = Khalil2016::new();
        khalil.before_reset(&solver).unwrap();

        solver.solve_iter().unwrap();
        let mut observed = 0;
        while !solver.solve_iter_is_done() {
            let obs = khalil.extract(&solver, false).unwrap();
            match obs {
                Some(Observation::Khalil(features)) => {
                    assert_eq!(features.candidates, solver.pseudo_branch_candidates());
                }
                other => panic!("unexpected observation {:?}", other),
            }
            observed += 1;
            assert_eq!(khalil.buffer().and_then(|b| b.initialized_at()), Some(1));
            let v = solver.lp_branch_candidates()[0];
            solver.solve_iter_branch(v).unwrap();
        }
        assert!(observed >= 1);
        assert!(khalil.extract(&solver, true).unwrap().is_none());
        assert!(khalil.buffer().is_none());
    }

    #[test]
    fn test_finished_episode_requires_new_reset() {
        let solver = focused_solver();
        let mut khalil = Khalil2016::new();
        khalil.before_reset(&solver).unwrap();
        khalil.extract(&solver, false).unwrap();
        assert!(khalil.extract(&solver, true).unwrap().is_none());

        // The static cache of the finished episode must not be reused.
        assert!(matches!(
            khalil.extract(&solver, false),
            Err(ObserveError::NotReset { .. })
        ));
        khalil.before_reset(&solver).unwrap();
        assert!(khalil.extract(&solver, false).is_ok());
    }

    #[test]
    fn test_second_initialization_is_rejected() {
        let solver = focused_solver();
        let mut khalil = Khalil2016::new();
        khalil.before_reset(&solver).unwrap();
        khalil.extract(&solver, false).unwrap();
        // Still at node 1: a second extraction would initialize again.
        let err = khalil.extract(&solver, false).unwrap_err();
        assert!(matches!(
            err,
            ObserveError::Feature(FeatureError::StaticAlreadyInitialized { node: 1 })
        ));

        // A reset starts a new episode with an empty buffer.
        khalil.before_reset(&solver).unwrap();
        assert!(khalil.extract(&solver, false).is_ok());
    }

    #[test]
    fn test_extract_before_reset_fails_fast() {
        let solver = focused_solver();
        let mut khalil = Khalil2016::new();
        assert!(matches!(
            khalil.extract(&solver, false),
            Err(ObserveError::NotReset { .. })
        ));
    }
}
