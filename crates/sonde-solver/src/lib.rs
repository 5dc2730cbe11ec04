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

//! Sonde solver: step-wise branch-and-bound for binary packing models
//!
//! A small MILP solver whose tree search can be driven one branching
//! decision at a time. It exists so that node-level observers have a real
//! search to watch: every node exposes its LP solution, branching candidates
//! and local bounds through the `state::SolverState` trait.
//!
//! Core flow
//! - Build a `sonde_model::model::Model` and a `settings::SolverSettings`.
//! - Create a `solver::Solver` and call `solve_iter`.
//! - While `solve_iter_is_done` is false, inspect the state and call
//!   `solve_iter_branch` with one of the LP branching candidates.
//!
//! Determinism
//! - The variable permutation is seeded; identical settings on an identical
//!   model visit an identical node sequence when the caller branches
//!   identically.
//!
//! Module map
//! - `settings`: static configuration.
//! - `state`: the `SolverState` trait, `Stage`, `SolveStatus`, `Incumbent`.
//! - `solver`: the branch-and-bound engine.
//! - `lp`: dense simplex for node relaxations.
//! - `presolve`: fixings and redundant row removal.
//! - `cuts`: cover cut separation at the root.
//! - `node`: local bounds and the open node stack.
//! - `stats`: counters and timing.
//! - `error`: solver and LP errors.

pub mod cuts;
pub mod error;
pub mod lp;
pub mod node;
pub mod presolve;
pub mod settings;
pub mod solver;
pub mod state;
pub mod stats;
