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

//! Presolve reductions.
//!
//! Two reductions that are exact for binary packing models:
//! - a variable whose coefficient exceeds the right-hand side of some row can
//!   never be one and is fixed to zero;
//! - a row whose coefficients over the remaining variables sum to at most its
//!   right-hand side can never be violated and is dropped.

use crate::node::NodeBounds;
use sonde_model::{
    index::{ConstraintIndex, VariableIndex},
    model::Model,
};

/// The reduced model and the fixings found by presolve.
#[derive(Clone, Debug, PartialEq)]
pub struct PresolveOutcome {
    /// The model with redundant rows removed.
    pub model: Model,
    /// Root bounds with the fixed variables.
    pub bounds: NodeBounds,
    /// Number of variables fixed to zero.
    pub fixed_variables: usize,
    /// Number of dropped rows.
    pub removed_constraints: usize,
}

/// Applies the presolve reductions to `model`.
pub fn presolve(model: &Model) -> PresolveOutcome {
    let mut bounds = NodeBounds::new(model.num_variables());
    let mut fixed_variables = 0;

    for j in 0..model.num_variables() {
        let v = VariableIndex::new(j);
        let oversized = model
            .column_nonzeros(v)
            .any(|(c, a)| a > model.rhs(c) + crate::lp::EPSILON);
        if oversized {
            bounds.fix_zero(v);
            fixed_variables += 1;
        }
    }

    let redundant: Vec<bool> = (0..model.num_constraints())
        .map(|i| {
            let c = ConstraintIndex::new(i);
            let activity: f64 = model
                .row_nonzeros(c)
                .filter(|(v, _)| bounds.is_free(*v))
                .map(|(_, a)| a)
                .sum();
            activity <= model.rhs(c) + crate::lp::EPSILON
        })
        .collect();
    let removed_constraints = redundant.iter().filter(|r| **r).count();
    let reduced = model.retain_constraints(|c| !redundant[c.get()]);

    tracing::debug!(
        fixed_variables,
        removed_constraints,
        "presolve finished"
    );

    PresolveOutcome {
        model: reduced,
        bounds,
        fixed_variables,
        removed_constraints,
    }
}
