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

//! Cover cut separation.
//!
//! For a packing row `a^T x <= b`, a cover is a set `C` of variables with
//! `sum_{j in C} a_j > b`. Not all of them fit, so `sum_{j in C} x_j <= |C| - 1`
//! is valid for every binary solution. The separator builds a cover greedily
//! from the variables the LP point likes most, shrinks it to a minimal cover
//! and emits the inequality if the LP point violates it. Cut rows keep the
//! non-negative packing shape of the model.

use crate::{
    lp::{EPSILON, LpSolution},
    node::NodeBounds,
};
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};

/// A separated cover inequality.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverCut {
    /// Constraint the cover was derived from.
    pub source: ConstraintIndex,
    /// Variables of the minimal cover, in index order.
    pub cover: Vec<VariableIndex>,
    /// Amount by which the LP point violates the cut.
    pub violation: f64,
}

impl CoverCut {
    /// Returns the dense coefficient row of the cut.
    pub fn row(&self, num_variables: usize) -> Vec<f64> {
        let mut row = vec![0.0; num_variables];
        for v in &self.cover {
            row[v.get()] = 1.0;
        }
        row
    }

    /// Returns the right-hand side `|C| - 1`.
    #[inline]
    pub fn rhs(&self) -> f64 {
        self.cover.len().saturating_sub(1) as f64
    }
}

/// Separates violated cover inequalities from the LP point, at most one per row.
pub fn separate_cover_cuts(model: &Model, bounds: &NodeBounds, lp: &LpSolution) -> Vec<CoverCut> {
    let mut cuts: Vec<CoverCut> = Vec::new();

    for i in 0..model.num_constraints() {
        let c = ConstraintIndex::new(i);
        let capacity = model.rhs(c) - bounds.ones().map(|v| model.coefficient(c, v)).sum::<f64>();

        let mut items: Vec<(VariableIndex, f64)> = model
            .row_nonzeros(c)
            .filter(|(v, _)| bounds.is_free(*v))
            .collect();
        // Prefer variables close to one, then heavy ones.
        items.sort_by(|(va, aa), (vb, ab)| {
            let ka = (1.0 - lp.value(*va)) / aa;
            let kb = (1.0 - lp.value(*vb)) / ab;
            ka.total_cmp(&kb).then(va.cmp(vb))
        });

        let mut cover = Vec::new();
        let mut weight = 0.0;
        for (v, a) in items {
            cover.push((v, a));
            weight += a;
            if weight > capacity + EPSILON {
                break;
            }
        }
        if weight <= capacity + EPSILON {
            continue;
        }

        // Drop members with the smallest LP value while the set stays a cover.
        cover.sort_by(|(va, _), (vb, _)| lp.value(*va).total_cmp(&lp.value(*vb)).then(va.cmp(vb)));
        let mut k = 0;
        while k < cover.len() {
            let a = cover[k].1;
            if weight - a > capacity + EPSILON {
                weight -= a;
                cover.remove(k);
            } else {
                k += 1;
            }
        }

        let lhs: f64 = cover.iter().map(|(v, _)| lp.value(*v)).sum();
        let violation = lhs - (cover.len() as f64 - 1.0);
        if violation <= 1e-6 {
            continue;
        }

        let mut members: Vec<VariableIndex> = cover.into_iter().map(|(v, _)| v).collect();
        members.sort();
        if cuts.iter().any(|cut| cut.cover == members) {
            continue;
        }
        cuts.push(CoverCut {
            source: c,
            cover: members,
            violation,
        });
    }

    cuts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{LpOutcome, solve_relaxation};
    use sonde_model::model::ModelBuilder;

    fn v(j: usize) -> VariableIndex {
        VariableIndex::new(j)
    }

    #[test]
    fn test_separates_violated_minimal_cover() {
        // max x0 + x1 + x2  s.t.  2x0 + 2x1 + 2x2 <= 3
        // LP point: 1, 0.5, 0 -> cover {x0, x1} gives x0 + x1 <= 1, violated by 0.5.
        let mut b = ModelBuilder::new(3, 1);
        let c = ConstraintIndex::new(0);
        for j in 0..3 {
            b.set_objective(v(j), 1.0).set_coefficient(c, v(j), 2.0);
        }
        b.set_rhs(c, 3.0);
        let model = b.build().unwrap();
        let bounds = NodeBounds::new(3);
        let lp = match solve_relaxation(&model, &bounds, 100).unwrap() {
            LpOutcome::Optimal(lp) => lp,
            LpOutcome::Infeasible => panic!("expected optimal LP"),
        };

        let cuts = separate_cover_cuts(&model, &bounds, &lp);
        assert_eq!(cuts.len(), 1);
        let cut = &cuts[0];
        assert_eq!(cut.cover.len(), 2);
        assert_eq!(cut.rhs(), 1.0);
        assert!(cut.violation > 0.4);
        let row = cut.row(3);
        assert_eq!(row.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn test_no_cut_for_integral_point() {
        let mut b = ModelBuilder::new(2, 1);
        let c = ConstraintIndex::new(0);
        b.set_objective(v(0), 1.0)
            .set_objective(v(1), 1.0)
            .set_coefficient(c, v(0), 1.0)
            .set_coefficient(c, v(1), 1.0)
            .set_rhs(c, 1.0);
        let model = b.build().unwrap();
        let lp = LpSolution {
            objective: 1.0,
            values: vec![1.0, 0.0],
            reduced_costs: vec![0.0, 0.0],
            basis: vec![crate::lp::BasisStatus::Basic; 2],
            duals: vec![1.0],
            slacks: vec![0.0],
            iterations: 1,
        };
        assert!(separate_cover_cuts(&model, &NodeBounds::new(2), &lp).is_empty());
    }
}
