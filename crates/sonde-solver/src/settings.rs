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

//! Static solver configuration.

/// Configuration of a `Solver`. Settings are frozen once solving starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverSettings {
    /// Seed of the variable permutation.
    pub seed: u64,
    /// Whether variables are permuted with `seed` before solving.
    pub permute_variables: bool,
    /// Whether presolve reductions are applied.
    pub presolve: bool,
    /// Whether cover cuts are separated at the root node.
    pub cuts: bool,
    /// Maximum number of processed nodes, `None` for no limit.
    pub node_limit: Option<u64>,
    /// Maximum number of simplex pivots per LP solve.
    pub lp_iteration_limit: u64,
    /// Maximum number of separation rounds at the root.
    pub max_cut_rounds: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            permute_variables: true,
            presolve: true,
            cuts: true,
            node_limit: None,
            lp_iteration_limit: 10_000,
            max_cut_rounds: 5,
        }
    }
}

impl SolverSettings {
    /// Creates the default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the permutation seed.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables the seeded variable permutation.
    #[inline]
    pub fn with_permutation(mut self, enabled: bool) -> Self {
        self.permute_variables = enabled;
        self
    }

    /// Enables or disables presolve.
    #[inline]
    pub fn with_presolve(mut self, enabled: bool) -> Self {
        self.presolve = enabled;
        self
    }

    /// Enables or disables root cutting planes.
    #[inline]
    pub fn with_cuts(mut self, enabled: bool) -> Self {
        self.cuts = enabled;
        self
    }

    /// Sets the node limit.
    #[inline]
    pub fn with_node_limit(mut self, limit: Option<u64>) -> Self {
        self.node_limit = limit;
        self
    }

    /// Sets the simplex iteration limit per LP solve.
    #[inline]
    pub fn with_lp_iteration_limit(mut self, limit: u64) -> Self {
        self.lp_iteration_limit = limit;
        self
    }

    /// Sets the number of root separation rounds.
    #[inline]
    pub fn with_max_cut_rounds(mut self, rounds: usize) -> Self {
        self.max_cut_rounds = rounds;
        self
    }

    /// Settings that make repeated runs on the same instance visit the same
    /// node sequence regardless of preprocessing: presolve and cuts disabled,
    /// the given seed and node limit.
    #[inline]
    pub fn reproducible(seed: u64, node_limit: u64) -> Self {
        Self::default()
            .with_seed(seed)
            .with_presolve(false)
            .with_cuts(false)
            .with_node_limit(Some(node_limit))
    }
}

impl std::fmt::Display for SolverSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SolverSettings(seed: {}, permute: {}, presolve: {}, cuts: {}, node_limit: {})",
            self.seed,
            self.permute_variables,
            self.presolve,
            self.cuts,
            self.node_limit
                .map(|l| l.to_string())
                .unwrap_or_else(|| "none".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducible_disables_preprocessing() {
        let s = SolverSettings::reproducible(784, 10);
        assert_eq!(s.seed, 784);
        assert!(!s.presolve);
        assert!(!s.cuts);
        assert_eq!(s.node_limit, Some(10));
        assert!(s.permute_variables);
    }

    #[test]
    fn test_display_mentions_limits() {
        let s = SolverSettings::new().with_node_limit(None);
        assert!(format!("{}", s).contains("node_limit: none"));
    }
}
