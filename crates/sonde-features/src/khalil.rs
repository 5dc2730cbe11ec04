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

//! Per-candidate branching features after Khalil et al. (2016).
//!
//! Features are split into a static part, which depends only on the model
//! and is computed once per episode, and a dynamic part, which depends on
//! the focus node. The static part lives in a `KhalilBuffer` owned by the
//! caller. Calling `extract_khalil_variable_features` with an empty
//! candidate list fills the buffer; calling it with candidates computes one
//! feature row per candidate from the cached static part and the node.

use crate::{error::FeatureError, matrix::FeatureMatrix};
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};
use sonde_solver::{
    lp::{BasisStatus, EPSILON, LpSolution},
    state::SolverState,
};

/// Names of the static feature columns.
pub const STATIC_FEATURES: [&str; 6] = [
    "objective",
    "objective_positive",
    "column_density",
    "rhs_ratio_min",
    "rhs_ratio_max",
    "rhs_ratio_mean",
];

/// Names of the dynamic feature columns.
pub const DYNAMIC_FEATURES: [&str; 11] = [
    "lp_value",
    "fractionality",
    "normalized_reduced_cost",
    "is_basic",
    "at_upper_bound",
    "depth",
    "slack_min",
    "slack_mean",
    "dual_max",
    "dual_mean",
    "branch_share",
];

/// Total number of feature columns per candidate.
pub const NUM_FEATURES: usize = STATIC_FEATURES.len() + DYNAMIC_FEATURES.len();

/// Static feature cache of one episode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KhalilBuffer {
    static_features: Option<FeatureMatrix>,
    initialized_at: Option<u64>,
}

impl KhalilBuffer {
    /// Creates an empty buffer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the static features are cached.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.static_features.is_some()
    }

    /// Node count at which the static features were computed.
    #[inline]
    pub fn initialized_at(&self) -> Option<u64> {
        self.initialized_at
    }

    /// The cached static features, one row per variable.
    #[inline]
    pub fn static_features(&self) -> Option<&FeatureMatrix> {
        self.static_features.as_ref()
    }
}

impl std::fmt::Display for KhalilBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.initialized_at {
            Some(node) => write!(f, "KhalilBuffer(initialized at node {})", node),
            None => write!(f, "KhalilBuffer(empty)"),
        }
    }
}

/// Feature rows for a set of branching candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct KhalilFeatures {
    /// Candidates in the order of the feature rows.
    pub candidates: Vec<VariableIndex>,
    /// One row per candidate, static columns first.
    pub features: FeatureMatrix,
}

impl KhalilFeatures {
    #[inline]
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            features: FeatureMatrix::new(NUM_FEATURES),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl std::fmt::Display for KhalilFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KhalilFeatures(candidates: {})", self.candidates.len())
    }
}

/// Minimum, maximum and mean of a non-empty sample, zeros otherwise.
fn summarize(values: impl Iterator<Item = f64>) -> (f64, f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0usize;
    for x in values {
        min = min.min(x);
        max = max.max(x);
        sum += x;
        count += 1;
    }
    if count == 0 {
        (0.0, 0.0, 0.0)
    } else {
        (min, max, sum / count as f64)
    }
}

fn compute_static(model: &Model) -> FeatureMatrix {
    let n = model.num_variables();
    let m = model.num_constraints().max(1) as f64;
    let mut features = FeatureMatrix::with_capacity(n, STATIC_FEATURES.len());
    for j in 0..n {
        let v = VariableIndex::new(j);
        let c = model.objective(v);
        let nonzeros = model.column_nonzeros(v).count();
        let (rmin, rmax, rmean) = summarize(
            model
                .column_nonzeros(v)
                .map(|(row, a)| if model.rhs(row) > EPSILON { a / model.rhs(row) } else { 1.0 }),
        );
        features.push_row(&[
            c,
            if c > 0.0 { 1.0 } else { 0.0 },
            nonzeros as f64 / m,
            rmin,
            rmax,
            rmean,
        ]);
    }
    features
}

fn dynamic_row<S: SolverState>(state: &S, lp: &LpSolution, v: VariableIndex, row: &mut [f64]) {
    let model = state.model();
    let objective_norm = model.objective_norm();
    let bounds = state.local_bounds();
    let x = lp.value(v);

    let rows: Vec<ConstraintIndex> = model.column_nonzeros(v).map(|(c, _)| c).collect();
    let (slack_min, _, slack_mean) = summarize(rows.iter().map(|c| {
        let rhs = model.rhs(*c);
        if rhs > EPSILON { lp.slack(*c) / rhs } else { 0.0 }
    }));
    let (_, dual_max, dual_mean) = summarize(rows.iter().map(|c| lp.dual(*c)));

    let nodes = state.node_count().max(1) as f64;
    row[0] = x;
    row[1] = lp.fractionality(v);
    row[2] = if objective_norm > EPSILON {
        lp.reduced_costs[v.get()] / objective_norm
    } else {
        0.0
    };
    row[3] = if lp.basis[v.get()] == BasisStatus::Basic { 1.0 } else { 0.0 };
    row[4] = if (bounds.upper(v) - x).abs() <= EPSILON { 1.0 } else { 0.0 };
    row[5] = state.depth() as f64;
    row[6] = slack_min;
    row[7] = slack_mean;
    row[8] = dual_max;
    row[9] = dual_mean;
    row[10] = state.statistics().branch_count(v.get()) as f64 / nodes;
}

/// Computes Khalil features for `candidates` at the focus node.
///
/// With an empty `candidates` list the static features are cached in
/// `buffer` and an empty result is returned; this may happen only once per
/// buffer. Otherwise the buffer must already be initialized.
pub fn extract_khalil_variable_features<S: SolverState>(
    state: &S,
    candidates: &[VariableIndex],
    buffer: &mut KhalilBuffer,
) -> Result<KhalilFeatures, FeatureError> {
    if candidates.is_empty() {
        if let Some(node) = buffer.initialized_at {
            return Err(FeatureError::StaticAlreadyInitialized { node });
        }
        buffer.static_features = Some(compute_static(state.model()));
        buffer.initialized_at = Some(state.node_count());
        return Ok(KhalilFeatures::empty());
    }

    let static_features = buffer
        .static_features
        .as_ref()
        .ok_or(FeatureError::UninitializedBuffer)?;
    let lp = state.lp_solution().ok_or(FeatureError::NoLpSolution)?;
    let n = state.model().num_variables();

    let mut features = FeatureMatrix::with_capacity(candidates.len(), NUM_FEATURES);
    let mut row = [0.0; NUM_FEATURES];
    for v in candidates {
        if v.get() >= n || v.get() >= static_features.num_rows() {
            return Err(FeatureError::UnknownVariable {
                variable: *v,
                num_variables: n,
            });
        }
        let (head, tail) = row.split_at_mut(STATIC_FEATURES.len());
        head.copy_from_slice(static_features.row(v.get()));
        dynamic_row(state, lp, *v, tail);
        features.push_row(&row);
    }

    Ok(KhalilFeatures {
        candidates: candidates.to_vec(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonde_model::model::ModelBuilder;
    use sonde_solver::{settings::SolverSettings, solver::Solver};

    fn focused_solver() -> Solver {
        let mut b = ModelBuilder::new(3, 1);
        let c = ConstraintIndex::new(0);
        let v = VariableIndex::new;
        b.set_objective(v(0), 10.0)
            .set_objective(v(1), 6.0)
            .set_objective(v(2), 4.0)
            .set_coefficient(c, v(0), 5.0)
            .set_coefficient(c, v(1), 4.0)
            .set_coefficient(c, v(2), 3.0)
            .set_rhs(c, 7.0);
        let settings = SolverSettings::reproducible(0, 100).with_permutation(false);
        let mut solver = Solver::new(b.build().unwrap(), settings);
        solver.solve_iter().unwrap();
        solver
    }

    #[test]
    fn test_static_initialization_happens_once() {
        let solver = focused_solver();
        let mut buffer = KhalilBuffer::new();
        assert!(!buffer.is_initialized());

        let out = extract_khalil_variable_features(&solver, &[], &mut buffer).unwrap();
        assert!(out.is_empty());
        assert!(buffer.is_initialized());
        assert_eq!(buffer.initialized_at(), Some(1));
        assert_eq!(buffer.static_features().map(|m| m.num_rows()), Some(3));

        let err = extract_khalil_variable_features(&solver, &[], &mut buffer).unwrap_err();
        assert_eq!(err, FeatureError::StaticAlreadyInitialized { node: 1 });
    }

    #[test]
    fn test_candidates_require_initialized_buffer() {
        let solver = focused_solver();
        let mut buffer = KhalilBuffer::new();
        let candidates = solver.pseudo_branch_candidates().to_vec();
        let err = extract_khalil_variable_features(&solver, &candidates, &mut buffer).unwrap_err();
        assert_eq!(err, FeatureError::UninitializedBuffer);
    }

    #[test]
    fn test_feature_rows_per_candidate() {
        let solver = focused_solver();
        let mut buffer = KhalilBuffer::new();
        extract_khalil_variable_features(&solver, &[], &mut buffer).unwrap();

        let candidates = solver.pseudo_branch_candidates().to_vec();
        let out = extract_khalil_variable_features(&solver, &candidates, &mut buffer).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.features.num_columns(), NUM_FEATURES);

        // Static part of x0: objective 10, ratio 5 / 7 in its only row.
        let x0 = out.features.row(0);
        assert_eq!(x0[0], 10.0);
        assert_eq!(x0[1], 1.0);
        assert_eq!(x0[2], 1.0);
        assert!((x0[5] - 5.0 / 7.0).abs() < 1e-12);
        // Dynamic part of x1: fractional and basic.
        let x1 = out.features.row(1);
        let base = STATIC_FEATURES.len();
        assert!((x1[base] - 0.5).abs() < 1e-9);
        assert!((x1[base + 1] - 0.5).abs() < 1e-9);
        assert_eq!(x1[base + 3], 1.0);
        assert!((x1[base + 8] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_candidate_is_rejected() {
        let solver = focused_solver();
        let mut buffer = KhalilBuffer::new();
        extract_khalil_variable_features(&solver, &[], &mut buffer).unwrap();
        let err =
            extract_khalil_variable_features(&solver, &[VariableIndex::new(9)], &mut buffer)
                .unwrap_err();
        assert!(matches!(err, FeatureError::UnknownVariable { num_variables: 3, .. }));
    }
}
