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

//! Open nodes of the branch-and-bound tree.
//!
//! A node is described by its local bounds: two bitsets marking variables
//! fixed to zero and fixed to one. Every other variable is free in `[0, 1]`.
//! Open nodes are kept on a LIFO `NodeStack`, which makes the search depth
//! first. Children are pushed up-branch first so that the down-branch is
//! explored first.

use fixedbitset::FixedBitSet;
use sonde_model::index::VariableIndex;

/// Local variable bounds of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeBounds {
    fixed_zero: FixedBitSet,
    fixed_one: FixedBitSet,
}

impl NodeBounds {
    /// Creates bounds with every variable free.
    #[inline]
    pub fn new(num_variables: usize) -> Self {
        Self {
            fixed_zero: FixedBitSet::with_capacity(num_variables),
            fixed_one: FixedBitSet::with_capacity(num_variables),
        }
    }

    /// Returns the number of variables covered by the bounds.
    #[inline]
    pub fn num_variables(&self) -> usize {
        self.fixed_zero.len()
    }

    /// Returns `true` if `variable` is not fixed.
    #[inline]
    pub fn is_free(&self, variable: VariableIndex) -> bool {
        !self.fixed_zero.contains(variable.get()) && !self.fixed_one.contains(variable.get())
    }

    /// Returns the fixed value of `variable`, or `None` if it is free.
    #[inline]
    pub fn fixed_value(&self, variable: VariableIndex) -> Option<f64> {
        if self.fixed_one.contains(variable.get()) {
            Some(1.0)
        } else if self.fixed_zero.contains(variable.get()) {
            Some(0.0)
        } else {
            None
        }
    }

    /// Returns the local lower bound of `variable`.
    #[inline]
    pub fn lower(&self, variable: VariableIndex) -> f64 {
        if self.fixed_one.contains(variable.get()) {
            1.0
        } else {
            0.0
        }
    }

    /// Returns the local upper bound of `variable`.
    #[inline]
    pub fn upper(&self, variable: VariableIndex) -> f64 {
        if self.fixed_zero.contains(variable.get()) {
            0.0
        } else {
            1.0
        }
    }

    /// Fixes `variable` to zero.
    #[inline]
    pub fn fix_zero(&mut self, variable: VariableIndex) {
        debug_assert!(
            !self.fixed_one.contains(variable.get()),
            "called `NodeBounds::fix_zero` on {} which is fixed to one",
            variable
        );
        self.fixed_zero.insert(variable.get());
    }

    /// Fixes `variable` to one.
    #[inline]
    pub fn fix_one(&mut self, variable: VariableIndex) {
        debug_assert!(
            !self.fixed_zero.contains(variable.get()),
            "called `NodeBounds::fix_one` on {} which is fixed to zero",
            variable
        );
        self.fixed_one.insert(variable.get());
    }

    /// Returns the number of fixed variables.
    #[inline]
    pub fn num_fixed(&self) -> usize {
        self.fixed_zero.count_ones(..) + self.fixed_one.count_ones(..)
    }

    /// Iterates over the variables fixed to one.
    #[inline]
    pub fn ones(&self) -> impl Iterator<Item = VariableIndex> + '_ {
        self.fixed_one.ones().map(VariableIndex::new)
    }

    /// Iterates over the free variables in index order.
    #[inline]
    pub fn free(&self) -> impl Iterator<Item = VariableIndex> + '_ {
        (0..self.num_variables())
            .map(VariableIndex::new)
            .filter(|v| self.is_free(*v))
    }
}

impl std::fmt::Display for NodeBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NodeBounds(zero: {}, one: {}, free: {})",
            self.fixed_zero.count_ones(..),
            self.fixed_one.count_ones(..),
            self.num_variables() - self.num_fixed()
        )
    }
}

/// An open node waiting to be processed.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Local bounds of the node.
    pub bounds: NodeBounds,
    /// Depth of the node; the root has depth zero.
    pub depth: usize,
    /// LP bound of the parent, used for pruning before the LP is solved.
    pub parent_bound: f64,
}

impl Node {
    /// Creates the root node.
    #[inline]
    pub fn root(bounds: NodeBounds) -> Self {
        Self {
            bounds,
            depth: 0,
            parent_bound: f64::INFINITY,
        }
    }
}

/// A LIFO stack of open nodes.
#[derive(Clone, Debug, Default)]
pub struct NodeStack {
    entries: Vec<Node>,
}

impl NodeStack {
    /// Creates a new, empty `NodeStack`.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a `NodeStack` with room for a full dive of `num_variables` levels.
    #[inline]
    pub fn preallocated(num_variables: usize) -> Self {
        Self {
            entries: Vec::with_capacity(num_variables.saturating_add(1)),
        }
    }

    /// Returns the number of open nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no open nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pushes an open node.
    #[inline]
    pub fn push(&mut self, node: Node) {
        self.entries.push(node);
    }

    /// Pops the most recently pushed node.
    #[inline]
    pub fn pop(&mut self) -> Option<Node> {
        self.entries.pop()
    }

    /// Removes all open nodes, keeping the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Returns the largest parent bound among open nodes.
    #[inline]
    pub fn best_bound(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|n| n.parent_bound)
            .fold(None, |acc, b| Some(acc.map_or(b, |a: f64| a.max(b))))
    }

    /// Returns an iterator over the open nodes, bottom to top.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.entries.iter()
    }
}

impl std::fmt::Display for NodeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeStack(open: {})", self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(j: usize) -> VariableIndex {
        VariableIndex::new(j)
    }

    #[test]
    fn test_bounds_fixing_and_queries() {
        let mut b = NodeBounds::new(4);
        assert_eq!(b.num_fixed(), 0);
        b.fix_zero(v(1));
        b.fix_one(v(3));
        assert!(b.is_free(v(0)));
        assert!(!b.is_free(v(1)));
        assert_eq!(b.fixed_value(v(1)), Some(0.0));
        assert_eq!(b.fixed_value(v(3)), Some(1.0));
        assert_eq!(b.fixed_value(v(2)), None);
        assert_eq!(b.upper(v(1)), 0.0);
        assert_eq!(b.lower(v(3)), 1.0);
        assert_eq!(b.free().collect::<Vec<_>>(), vec![v(0), v(2)]);
        assert_eq!(b.ones().collect::<Vec<_>>(), vec![v(3)]);
        assert!(format!("{}", b).contains("free: 2"));
    }

    #[test]
    fn test_stack_is_lifo_and_tracks_best_bound() {
        let mut s = NodeStack::preallocated(3);
        assert!(s.is_empty());
        assert_eq!(s.best_bound(), None);

        let mut a = Node::root(NodeBounds::new(3));
        a.parent_bound = 10.0;
        let mut b = a.clone();
        b.depth = 1;
        b.parent_bound = 7.0;

        s.push(a);
        s.push(b);
        assert_eq!(s.len(), 2);
        assert_eq!(s.best_bound(), Some(10.0));
        assert_eq!(s.pop().map(|n| n.depth), Some(1));
        assert_eq!(s.pop().map(|n| n.depth), Some(0));
        assert!(s.pop().is_none());

        s.push(Node::root(NodeBounds::new(3)));
        s.reset();
        assert!(s.is_empty());
        assert_eq!(format!("{}", s), "NodeStack(open: 0)");
    }
}
