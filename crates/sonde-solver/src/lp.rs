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

//! LP relaxation of a node.
//!
//! Solves
//!
//! ```text
//! maximize    c^T x
//! subject to  A x <= b
//!             l <= x <= u      (local bounds of the node)
//! ```
//!
//! with a dense tableau primal simplex. Variables fixed by the node are
//! substituted out; every free variable gets an explicit `x_j <= 1` row.
//! Because `A >= 0` and `b >= 0`, the residual right-hand side after
//! substituting the fixings is non-negative for every feasible node, so the
//! slack basis is a feasible start and no phase one is needed. A negative
//! residual proves the node infeasible.
//!
//! Pivoting follows Bland's rule (smallest improving column, smallest basic
//! index on ratio ties), which rules out cycling on degenerate vertices.

use crate::{error::LpError, node::NodeBounds};
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};

/// Numerical tolerance for pivoting and integrality decisions.
pub const EPSILON: f64 = 1e-9;

/// Position of a variable with respect to the optimal basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BasisStatus {
    /// Non-basic at its lower bound.
    Lower,
    /// Basic.
    Basic,
    /// At its upper bound.
    Upper,
    /// Fixed by the local bounds of the node.
    Fixed,
}

impl std::fmt::Display for BasisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasisStatus::Lower => write!(f, "Lower"),
            BasisStatus::Basic => write!(f, "Basic"),
            BasisStatus::Upper => write!(f, "Upper"),
            BasisStatus::Fixed => write!(f, "Fixed"),
        }
    }
}

/// Optimal primal and dual information of an LP relaxation.
#[derive(Clone, Debug, PartialEq)]
pub struct LpSolution {
    /// Objective value, including the contribution of fixed variables.
    pub objective: f64,
    /// Primal value per variable.
    pub values: Vec<f64>,
    /// Reduced cost per variable, `c_j - y^T A_j`.
    pub reduced_costs: Vec<f64>,
    /// Basis status per variable.
    pub basis: Vec<BasisStatus>,
    /// Dual value per constraint (non-negative).
    pub duals: Vec<f64>,
    /// Slack `b_i - A_i x` per constraint.
    pub slacks: Vec<f64>,
    /// Number of simplex pivots.
    pub iterations: u64,
}

impl LpSolution {
    /// Returns the primal value of `variable`.
    #[inline]
    pub fn value(&self, variable: VariableIndex) -> f64 {
        self.values[variable.get()]
    }

    /// Returns the dual value of `constraint`.
    #[inline]
    pub fn dual(&self, constraint: ConstraintIndex) -> f64 {
        self.duals[constraint.get()]
    }

    /// Returns the slack of `constraint`.
    #[inline]
    pub fn slack(&self, constraint: ConstraintIndex) -> f64 {
        self.slacks[constraint.get()]
    }

    /// Returns the distance of the value of `variable` to the nearest integer.
    #[inline]
    pub fn fractionality(&self, variable: VariableIndex) -> f64 {
        let x = self.values[variable.get()];
        (x - x.floor()).min(x.ceil() - x)
    }

    /// Returns `true` if the value of `variable` is integral within `EPSILON`.
    #[inline]
    pub fn is_integral(&self, variable: VariableIndex) -> bool {
        self.fractionality(variable) <= EPSILON
    }
}

/// Result of solving a node relaxation.
#[derive(Clone, Debug, PartialEq)]
pub enum LpOutcome {
    /// The relaxation has an optimal solution.
    Optimal(LpSolution),
    /// The local bounds violate a constraint.
    Infeasible,
}

/// Dense simplex tableau with the objective row kept separately.
struct Tableau {
    rows: usize,
    width: usize,
    data: Vec<f64>,
    objective: Vec<f64>,
    basis: Vec<usize>,
}

impl Tableau {
    #[inline(always)]
    fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline(always)]
    fn rhs(&self, row: usize) -> f64 {
        self.data[row * self.width + self.width - 1]
    }

    /// Bland's rule: the first column with a negative objective entry.
    fn entering_column(&self) -> Option<usize> {
        (0..self.width - 1).find(|&j| self.objective[j] < -EPSILON)
    }

    /// Minimum ratio test; ties go to the row with the smallest basic index.
    fn leaving_row(&self, col: usize) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for r in 0..self.rows {
            let a = self.at(r, col);
            if a <= EPSILON {
                continue;
            }
            let ratio = self.rhs(r) / a;
            best = match best {
                None => Some((r, ratio)),
                Some((br, bratio)) => {
                    if ratio < bratio - EPSILON
                        || (ratio <= bratio + EPSILON && self.basis[r] < self.basis[br])
                    {
                        Some((r, ratio))
                    } else {
                        Some((br, bratio))
                    }
                }
            };
        }
        best.map(|(r, _)| r)
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let w = self.width;
        let p = self.at(row, col);
        for k in 0..w {
            self.data[row * w + k] /= p;
        }
        for r in 0..self.rows {
            if r == row {
                continue;
            }
            let factor = self.data[r * w + col];
            if factor.abs() <= f64::EPSILON {
                continue;
            }
            for k in 0..w {
                self.data[r * w + k] -= factor * self.data[row * w + k];
            }
        }
        let factor = self.objective[col];
        if factor.abs() > f64::EPSILON {
            for k in 0..w {
                self.objective[k] -= factor * self.data[row * w + k];
            }
        }
        self.basis[row] = col;
    }
}

/// Solves the LP relaxation of `model` under the local `bounds`.
pub fn solve_relaxation(
    model: &Model,
    bounds: &NodeBounds,
    iteration_limit: u64,
) -> Result<LpOutcome, LpError> {
    let n = model.num_variables();
    let m = model.num_constraints();
    let free: Vec<VariableIndex> = bounds.free().collect();
    let k = free.len();

    let mut residual: Vec<f64> = model.rhs_values().to_vec();
    for v in bounds.ones() {
        for (i, r) in residual.iter_mut().enumerate() {
            *r -= model.coefficient(ConstraintIndex::new(i), v);
        }
    }
    if residual.iter().any(|r| *r < -EPSILON) {
        return Ok(LpOutcome::Infeasible);
    }

    // Columns: k structurals, m row slacks, k bound slacks, then the rhs.
    let rows = m + k;
    let width = k + rows + 1;
    let mut tableau = Tableau {
        rows,
        width,
        data: vec![0.0; rows * width],
        objective: vec![0.0; width],
        basis: (k..k + rows).collect(),
    };
    for i in 0..m {
        let row = model.row(ConstraintIndex::new(i));
        for (p, v) in free.iter().enumerate() {
            tableau.data[i * width + p] = row[v.get()];
        }
        tableau.data[i * width + k + i] = 1.0;
        tableau.data[i * width + width - 1] = residual[i].max(0.0);
    }
    for p in 0..k {
        let r = m + p;
        tableau.data[r * width + p] = 1.0;
        tableau.data[r * width + k + r] = 1.0;
        tableau.data[r * width + width - 1] = 1.0;
    }
    for (p, v) in free.iter().enumerate() {
        tableau.objective[p] = -model.objective(*v);
    }

    let mut iterations = 0_u64;
    while let Some(col) = tableau.entering_column() {
        if iterations >= iteration_limit {
            return Err(LpError::IterationLimit {
                limit: iteration_limit,
            });
        }
        let row = tableau.leaving_row(col).ok_or(LpError::Unbounded)?;
        tableau.pivot(row, col);
        iterations += 1;
    }
    tracing::trace!(iterations, free = k, rows = m, "LP relaxation solved");

    let mut basic_row = vec![None; width - 1];
    for (r, &col) in tableau.basis.iter().enumerate() {
        basic_row[col] = Some(r);
    }

    let mut values = vec![0.0; n];
    let mut basis = vec![BasisStatus::Fixed; n];
    for v in bounds.ones() {
        values[v.get()] = 1.0;
    }
    for (p, v) in free.iter().enumerate() {
        let (value, status) = match basic_row[p] {
            Some(r) => {
                let x = tableau.rhs(r).clamp(0.0, 1.0);
                let bound_slack_basic = basic_row[k + m + p].is_some();
                if x >= 1.0 - EPSILON && !bound_slack_basic {
                    (x, BasisStatus::Upper)
                } else {
                    (x, BasisStatus::Basic)
                }
            }
            None => (0.0, BasisStatus::Lower),
        };
        values[v.get()] = value;
        basis[v.get()] = status;
    }

    let duals: Vec<f64> = (0..m).map(|i| tableau.objective[k + i].max(0.0)).collect();
    let reduced_costs = (0..n)
        .map(|j| {
            let v = VariableIndex::new(j);
            let priced: f64 = model
                .column_nonzeros(v)
                .map(|(c, a)| duals[c.get()] * a)
                .sum();
            model.objective(v) - priced
        })
        .collect();
    let slacks = (0..m)
        .map(|i| {
            let c = ConstraintIndex::new(i);
            let activity: f64 = model.row(c).iter().zip(&values).map(|(a, x)| a * x).sum();
            model.rhs(c) - activity
        })
        .collect();

    Ok(LpOutcome::Optimal(LpSolution {
        objective: model.evaluate(&values),
        values,
        reduced_costs,
        basis,
        duals,
        slacks,
        iterations,
    }))
}
