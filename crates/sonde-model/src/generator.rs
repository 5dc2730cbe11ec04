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

//! Lazy, seeded instance generators.
//!
//! Generators are infinite iterators over freshly sampled models. They are
//! driven by a `ChaCha8Rng`, so two generators created with the same
//! configuration and seed produce identical sequences on every platform.
//! Each item is a `Result` because a generator may be configured with
//! dimensions that cannot produce a valid model; callers treat such a failure
//! as fatal.
//!
//! - `KnapsackGenerator`: multi-dimensional knapsacks with profits correlated
//!   to the item weights.
//! - `SetPackingGenerator`: combinatorial auction style instances where each
//!   variable is a bid on a bundle of goods and every good can be sold once.

use crate::{
    index::{ConstraintIndex, VariableIndex},
    model::{Model, ModelBuilder, ModelError},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration of the multi-dimensional knapsack generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnapsackGeneratorConfig {
    /// Number of items (variables).
    pub num_items: usize,
    /// Number of knapsacks (constraints).
    pub num_knapsacks: usize,
    /// Largest item weight; weights are sampled from `1..=max_weight`.
    pub max_weight: u32,
    /// Capacity of each knapsack as a fraction of the total item weight.
    pub tightness: f64,
}

impl Default for KnapsackGeneratorConfig {
    fn default() -> Self {
        Self {
            num_items: 30,
            num_knapsacks: 5,
            max_weight: 1000,
            tightness: 0.5,
        }
    }
}

/// Generates multi-dimensional knapsack instances.
#[derive(Debug, Clone)]
pub struct KnapsackGenerator {
    config: KnapsackGeneratorConfig,
    rng: ChaCha8Rng,
    generated: u64,
}

impl KnapsackGenerator {
    /// Creates a new generator with the given configuration and seed.
    pub fn new(config: KnapsackGeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            generated: 0,
        }
    }

    /// Returns the number of instances generated so far.
    #[inline]
    pub fn generated(&self) -> u64 {
        self.generated
    }

    fn sample(&mut self) -> Result<Model, ModelError> {
        let n = self.config.num_items;
        let m = self.config.num_knapsacks;
        let mut builder = ModelBuilder::new(n, m);
        builder.name(format!("knapsack-{}x{}-{}", n, m, self.generated));

        let mut weight_sums = vec![0.0; n];
        for i in 0..m {
            let constraint = ConstraintIndex::new(i);
            let mut total = 0.0;
            for (j, weight_sum) in weight_sums.iter_mut().enumerate() {
                let w = f64::from(self.rng.random_range(1..=self.config.max_weight.max(1)));
                builder.set_coefficient(constraint, VariableIndex::new(j), w);
                *weight_sum += w;
                total += w;
            }
            builder.set_rhs(constraint, (self.config.tightness * total).floor());
        }

        let spread = f64::from(self.config.max_weight.max(1)) / 2.0;
        for (j, weight_sum) in weight_sums.iter().enumerate() {
            let noise: f64 = self.rng.random::<f64>() * spread;
            let profit = (weight_sum / m as f64 + noise).round();
            builder.set_objective(VariableIndex::new(j), profit);
        }

        builder.build()
    }
}

impl Iterator for KnapsackGenerator {
    type Item = Result<Model, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        let model = self.sample();
        self.generated += 1;
        Some(model)
    }
}

/// Configuration of the set packing (combinatorial auction) generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetPackingGeneratorConfig {
    /// Number of goods (constraints).
    pub num_goods: usize,
    /// Number of bids (variables).
    pub num_bids: usize,
    /// Smallest bundle size of a bid.
    pub min_bundle: usize,
    /// Largest bundle size of a bid.
    pub max_bundle: usize,
    /// Relative price deviation of a bid from the sum of its goods' values.
    pub price_deviation: f64,
}

impl Default for SetPackingGeneratorConfig {
    fn default() -> Self {
        Self {
            num_goods: 20,
            num_bids: 40,
            min_bundle: 2,
            max_bundle: 5,
            price_deviation: 0.3,
        }
    }
}

/// Generates set packing instances.
#[derive(Debug, Clone)]
pub struct SetPackingGenerator {
    config: SetPackingGeneratorConfig,
    rng: ChaCha8Rng,
    generated: u64,
}

impl SetPackingGenerator {
    /// Creates a new generator with the given configuration and seed.
    pub fn new(config: SetPackingGeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            generated: 0,
        }
    }

    /// Returns the number of instances generated so far.
    #[inline]
    pub fn generated(&self) -> u64 {
        self.generated
    }

    fn sample(&mut self) -> Result<Model, ModelError> {
        let goods = self.config.num_goods;
        let bids = self.config.num_bids;
        let mut builder = ModelBuilder::new(bids, goods);
        builder.name(format!("setpacking-{}x{}-{}", goods, bids, self.generated));

        for i in 0..goods {
            builder.set_rhs(ConstraintIndex::new(i), 1.0);
        }
        if goods == 0 {
            return builder.build();
        }

        let values: Vec<f64> = (0..goods)
            .map(|_| f64::from(self.rng.random_range(1..=100_u32)))
            .collect();

        let min_bundle = self.config.min_bundle.clamp(1, goods);
        let max_bundle = self.config.max_bundle.clamp(min_bundle, goods);
        for j in 0..bids {
            let variable = VariableIndex::new(j);
            let size = self.rng.random_range(min_bundle..=max_bundle);
            let mut value = 0.0;
            for i in rand::seq::index::sample(&mut self.rng, goods, size) {
                builder.set_coefficient(ConstraintIndex::new(i), variable, 1.0);
                value += values[i];
            }
            let deviation = self.config.price_deviation * (2.0 * self.rng.random::<f64>() - 1.0);
            builder.set_objective(variable, (value * (1.0 + deviation)).round().max(1.0));
        }

        builder.build()
    }
}

impl Iterator for SetPackingGenerator {
    type Item = Result<Model, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        let model = self.sample();
        self.generated += 1;
        Some(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knapsack_same_seed_same_sequence() {
        let config = KnapsackGeneratorConfig::default();
        let a: Vec<Model> = KnapsackGenerator::new(config, 7)
            .take(3)
            .collect::<Result<_, _>>()
            .unwrap();
        let b: Vec<Model> = KnapsackGenerator::new(config, 7)
            .take(3)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1], "consecutive instances should differ");
    }

    #[test]
    fn test_knapsack_shape_and_capacities() {
        let config = KnapsackGeneratorConfig {
            num_items: 12,
            num_knapsacks: 3,
            max_weight: 50,
            tightness: 0.25,
        };
        let mut generator = KnapsackGenerator::new(config, 1);
        let model = generator.next().unwrap().unwrap();
        assert_eq!(generator.generated(), 1);
        assert_eq!(model.num_variables(), 12);
        assert_eq!(model.num_constraints(), 3);
        for i in 0..3 {
            let c = ConstraintIndex::new(i);
            let total: f64 = model.row(c).iter().sum();
            assert!(model.rhs(c) <= 0.25 * total);
            assert!(model.row(c).iter().all(|w| *w >= 1.0 && *w <= 50.0));
        }
    }

    #[test]
    fn test_knapsack_zero_items_is_an_error() {
        let config = KnapsackGeneratorConfig {
            num_items: 0,
            ..KnapsackGeneratorConfig::default()
        };
        let item = KnapsackGenerator::new(config, 0).next().unwrap();
        assert!(item.is_err());
    }

    #[test]
    fn test_set_packing_rows_are_unit_capacity() {
        let config = SetPackingGeneratorConfig::default();
        let model = SetPackingGenerator::new(config, 3).next().unwrap().unwrap();
        assert_eq!(model.num_variables(), config.num_bids);
        assert_eq!(model.num_constraints(), config.num_goods);
        assert!(model.rhs_values().iter().all(|b| *b == 1.0));
        for j in 0..config.num_bids {
            let bundle = model.column_nonzeros(VariableIndex::new(j)).count();
            assert!(bundle >= config.min_bundle && bundle <= config.max_bundle);
            assert!(model.objective(VariableIndex::new(j)) >= 1.0);
        }
    }
}
