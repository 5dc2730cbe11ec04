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

//! Solver fixtures shared by the unit tests.

use sonde_model::{
    generator::{KnapsackGenerator, KnapsackGeneratorConfig},
    index::{ConstraintIndex, VariableIndex},
    model::ModelBuilder,
};
use sonde_solver::{settings::SolverSettings, solver::Solver, state::SolverState};

/// max 10x0 + 6x1 + 4x2  s.t.  5x0 + 4x1 + 3x2 <= 7, stopped at the root.
///
/// The root LP takes x0 = 1, x1 = 0.5 with objective 13, so `x1` is the
/// only branching candidate.
pub(crate) fn focused_solver() -> Solver {
    let v = VariableIndex::new;
    let c = ConstraintIndex::new(0);
    let mut b = ModelBuilder::new(3, 1);
    b.set_objective(v(0), 10.0)
        .set_objective(v(1), 6.0)
        .set_objective(v(2), 4.0)
        .set_coefficient(c, v(0), 5.0)
        .set_coefficient(c, v(1), 4.0)
        .set_coefficient(c, v(2), 3.0)
        .set_rhs(c, 7.0);
    let model = b.build().unwrap();

    let settings = SolverSettings::reproducible(0, 100).with_permutation(false);
    let mut solver = Solver::new(model, settings);
    solver.solve_iter().unwrap();
    assert!(!solver.solve_iter_is_done());
    solver
}

/// A default-sized knapsack instance, not yet started.
pub(crate) fn knapsack_solver(seed: u64, node_limit: u64) -> Solver {
    let model = KnapsackGenerator::new(KnapsackGeneratorConfig::default(), 11)
        .next()
        .unwrap()
        .unwrap();
    Solver::new(model, SolverSettings::reproducible(seed, node_limit))
}
