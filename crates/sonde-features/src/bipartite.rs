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

//! Variable-constraint bipartite graph features.
//!
//! The focus node is encoded as a bipartite graph with one vertex per
//! constraint, one vertex per variable and one edge per nonzero
//! coefficient. Constraint and variable vertices carry feature rows; edges
//! carry the coefficient normalized by the norm of its row.
//!
//! `extract_bipartite` stores edges as a COO list; `extract_bipartite_dense`
//! stores the full normalized coefficient matrix. Both are computed from
//! scratch at every call.

use crate::{error::FeatureError, matrix::FeatureMatrix};
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};
use sonde_solver::{
    lp::{BasisStatus, EPSILON, LpSolution},
    state::SolverState,
};

/// Names of the constraint feature columns.
pub const ROW_FEATURES: [&str; 5] = [
    "bias",
    "objective_cosine_similarity",
    "normalized_rhs",
    "is_tight",
    "normalized_dual",
];

/// Names of the variable feature columns.
pub const VARIABLE_FEATURES: [&str; 11] = [
    "normalized_objective",
    "at_lower_bound",
    "at_upper_bound",
    "lp_value",
    "fractionality",
    "basis_lower",
    "basis_basic",
    "basis_upper",
    "basis_fixed",
    "normalized_reduced_cost",
    "incumbent_value",
];

/// Sparse bipartite observation of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct BipartiteGraph {
    /// One row per constraint, columns as in `ROW_FEATURES`.
    pub row_features: FeatureMatrix,
    /// One row per variable, columns as in `VARIABLE_FEATURES`.
    pub variable_features: FeatureMatrix,
    /// Endpoints of every edge.
    pub edge_indices: Vec<(ConstraintIndex, VariableIndex)>,
    /// Normalized coefficient of every edge.
    pub edge_values: Vec<f64>,
}

impl BipartiteGraph {
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edge_values.len()
    }
}

impl std::fmt::Display for BipartiteGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BipartiteGraph(rows: {}, variables: {}, edges: {})",
            self.row_features.num_rows(),
            self.variable_features.num_rows(),
            self.num_edges()
        )
    }
}

/// Dense bipartite observation of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseBipartite {
    pub row_features: FeatureMatrix,
    pub variable_features: FeatureMatrix,
    /// `m x n` matrix of normalized coefficients, zero where there is no edge.
    pub coefficients: FeatureMatrix,
}

impl std::fmt::Display for DenseBipartite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DenseBipartite(rows: {}, variables: {})",
            self.row_features.num_rows(),
            self.variable_features.num_rows()
        )
    }
}

#[inline]
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() <= EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

fn row_features(model: &Model, lp: &LpSolution) -> FeatureMatrix {
    let m = model.num_constraints();
    let objective_norm = model.objective_norm();
    let mut features = FeatureMatrix::with_capacity(m, ROW_FEATURES.len());
    for i in 0..m {
        let c = ConstraintIndex::new(i);
        let norm = model.row_norm(c);
        let dot: f64 = model
            .row(c)
            .iter()
            .zip(model.objective_coefficients())
            .map(|(a, o)| a * o)
            .sum();
        let tight = if lp.slack(c).abs() <= 1e-6 { 1.0 } else { 0.0 };
        features.push_row(&[
            1.0,
            safe_div(dot, norm * objective_norm),
            safe_div(model.rhs(c), norm),
            tight,
            safe_div(lp.dual(c), norm * objective_norm),
        ]);
    }
    features
}

fn variable_features<S: SolverState>(state: &S, lp: &LpSolution) -> FeatureMatrix {
    let model = state.model();
    let bounds = state.local_bounds();
    let objective_norm = model.objective_norm();
    let incumbent = state.incumbent();
    let n = model.num_variables();
    let mut features = FeatureMatrix::with_capacity(n, VARIABLE_FEATURES.len());
    for j in 0..n {
        let v = VariableIndex::new(j);
        let x = lp.value(v);
        let status = lp.basis[j];
        let one_hot = |s: BasisStatus| if status == s { 1.0 } else { 0.0 };
        features.push_row(&[
            safe_div(model.objective(v), objective_norm),
            if (x - bounds.lower(v)).abs() <= EPSILON { 1.0 } else { 0.0 },
            if (bounds.upper(v) - x).abs() <= EPSILON { 1.0 } else { 0.0 },
            x,
            lp.fractionality(v),
            one_hot(BasisStatus::Lower),
            one_hot(BasisStatus::Basic),
            one_hot(BasisStatus::Upper),
            one_hot(BasisStatus::Fixed),
            safe_div(lp.reduced_costs[j], objective_norm),
            incumbent.map_or(0.0, |inc| inc.values[j]),
        ]);
    }
    features
}

/// Extracts the sparse bipartite observation of the focus node.
pub fn extract_bipartite<S: SolverState>(state: &S) -> Result<BipartiteGraph, FeatureError> {
    let lp = state.lp_solution().ok_or(FeatureError::NoLpSolution)?;
    let model = state.model();

    let mut edge_indices = Vec::with_capacity(model.num_nonzeros());
    let mut edge_values = Vec::with_capacity(model.num_nonzeros());
    for i in 0..model.num_constraints() {
        let c = ConstraintIndex::new(i);
        let norm = model.row_norm(c);
        for (v, a) in model.row_nonzeros(c) {
            edge_indices.push((c, v));
            edge_values.push(safe_div(a, norm));
        }
    }

    Ok(BipartiteGraph {
        row_features: row_features(model, lp),
        variable_features: variable_features(state, lp),
        edge_indices,
        edge_values,
    })
}

/// Extracts the dense bipartite observation of the focus node.
pub fn extract_bipartite_dense<S: SolverState>(state: &S) -> Result<DenseBipartite, FeatureError> {
    let lp = state.lp_solution().ok_or(FeatureError::NoLpSolution)?;
    let model = state.model();
    let (m, n) = (model.num_constraints(), model.num_variables());

    let mut coefficients = FeatureMatrix::zeros(m, n);
    for i in 0..m {
        let c = ConstraintIndex::new(i);
        let norm = model.row_norm(c);
        for (j, a) in model.row(c).iter().enumerate() {
            coefficients.set(i, j, safe_div(*a, norm));
        }
    }

    Ok(DenseBipartite {
        row_features: row_features(model, lp),
        variable_features: variable_features(state, lp),
        coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonde_model::model::ModelBuilder;
    use sonde_solver::{settings::SolverSettings, solver::Solver};

    /// max 10x0 + 6x1 + 4x2  s.t.  5x0 + 4x1 + 3x2 <= 7,  x0 + x2 <= 2
    fn focused_solver() -> Solver {
        let mut b = ModelBuilder::new(3, 2);
        let (c0, c1) = (ConstraintIndex::new(0), ConstraintIndex::new(1));
        let v = VariableIndex::new;
        b.set_objective(v(0), 10.0)
            .set_objective(v(1), 6.0)
            .set_objective(v(2), 4.0)
            .set_coefficient(c0, v(0), 5.0)
            .set_coefficient(c0, v(1), 4.0)
            .set_coefficient(c0, v(2), 3.0)
            .set_rhs(c0, 7.0)
            .set_coefficient(c1, v(0), 1.0)
            .set_coefficient(c1, v(2), 1.0)
            .set_rhs(c1, 2.0);
        let settings = SolverSettings::reproducible(0, 100).with_permutation(false);
        let mut solver = Solver::new(b.build().unwrap(), settings);
        solver.solve_iter().unwrap();
        solver
    }

    #[test]
    fn test_sparse_graph_shape_and_features() {
        let solver = focused_solver();
        let graph = extract_bipartite(&solver).unwrap();

        assert_eq!(graph.row_features.num_rows(), 2);
        assert_eq!(graph.row_features.num_columns(), ROW_FEATURES.len());
        assert_eq!(graph.variable_features.num_rows(), 3);
        assert_eq!(graph.num_edges(), 5);
        assert_eq!(
            graph.edge_indices[3],
            (ConstraintIndex::new(1), VariableIndex::new(0))
        );

        // Capacity row is tight at the LP optimum, x0 + x2 <= 2 is not.
        assert_eq!(graph.row_features.get(0, 3), 1.0);
        assert_eq!(graph.row_features.get(1, 3), 0.0);
        // x1 = 0.5 is basic and fractional.
        let x1 = graph.variable_features.row(1);
        assert!((x1[3] - 0.5).abs() < 1e-9);
        assert!((x1[4] - 0.5).abs() < 1e-9);
        assert_eq!(x1[6], 1.0);
        // x0 sits at its upper bound.
        assert_eq!(graph.variable_features.get(0, 2), 1.0);
        assert_eq!(graph.variable_features.get(0, 7), 1.0);
    }

    #[test]
    fn test_dense_matches_sparse() {
        let solver = focused_solver();
        let sparse = extract_bipartite(&solver).unwrap();
        let dense = extract_bipartite_dense(&solver).unwrap();

        assert_eq!(sparse.row_features, dense.row_features);
        assert_eq!(sparse.variable_features, dense.variable_features);
        for ((c, v), value) in sparse.edge_indices.iter().zip(&sparse.edge_values) {
            assert_eq!(dense.coefficients.get(c.get(), v.get()), *value);
        }
        let nonzeros = dense.coefficients.as_slice().iter().filter(|a| **a != 0.0).count();
        assert_eq!(nonzeros, sparse.num_edges());
    }

    #[test]
    fn test_requires_lp_solution() {
        let mut solver = focused_solver();
        solver.solve().unwrap();
        assert_eq!(extract_bipartite(&solver), Err(FeatureError::NoLpSolution));
        assert_eq!(
            extract_bipartite_dense(&solver),
            Err(FeatureError::NoLpSolution)
        );
    }
}
