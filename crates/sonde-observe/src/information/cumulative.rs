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

//! Folding an information function over the nodes of an episode.
//!
//! `Cumulative` samples the wrapped function at every node and folds the
//! samples into an accumulator with a reducer, strictly left to right in
//! node order:
//!
//! ```text
//! acc_0 = seed
//! acc_k = reducer(acc_{k-1}, sample_k)
//! ```
//!
//! The accumulator is reset to the seed in `before_reset`. Once `done` is
//! set, the wrapped function is not sampled again and the current
//! accumulator is reported unchanged.

use crate::{clock::TimerSample, error::ObserveError, information::InformationFunction};
use sonde_solver::state::SolverState;
use std::time::Duration;

/// Values that can be summed with overflow detection.
pub trait Accumulate: Sized {
    /// The neutral element of the sum.
    fn zero() -> Self;

    /// Adds `other`, or returns `None` on overflow.
    fn accumulate(self, other: Self) -> Option<Self>;
}

impl Accumulate for u64 {
    #[inline]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn accumulate(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }
}

impl Accumulate for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn accumulate(self, other: Self) -> Option<Self> {
        Some(self + other)
    }
}

impl Accumulate for Duration {
    #[inline]
    fn zero() -> Self {
        Duration::ZERO
    }

    #[inline]
    fn accumulate(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }
}

impl Accumulate for TimerSample {
    #[inline]
    fn zero() -> Self {
        TimerSample::default()
    }

    #[inline]
    fn accumulate(self, other: Self) -> Option<Self> {
        Some(self + other)
    }
}

/// Reducer signature used by the convenience constructors.
pub type Reducer<V> = fn(V, V) -> Result<V, ObserveError>;

/// A `Cumulative` built by `sum` or `max`.
pub type Folded<F, V> = Cumulative<F, Reducer<V>, V>;

/// Left fold of an information function over the nodes of an episode.
#[derive(Clone, Debug)]
pub struct Cumulative<F, R, V> {
    inner: F,
    reducer: R,
    seed: V,
    accumulator: V,
}

impl<F, R, V> Cumulative<F, R, V>
where
    V: Clone,
{
    /// Creates a fold of `inner` starting at `seed`.
    #[inline]
    pub fn new(inner: F, seed: V, reducer: R) -> Self {
        Self {
            inner,
            reducer,
            accumulator: seed.clone(),
            seed,
        }
    }

    /// The current accumulator.
    #[inline]
    pub fn accumulator(&self) -> &V {
        &self.accumulator
    }

    #[inline]
    pub fn inner(&self) -> &F {
        &self.inner
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut F {
        &mut self.inner
    }

    #[inline]
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F, V> Cumulative<F, Reducer<V>, V>
where
    V: Accumulate + Clone,
{
    /// Sums the values of `inner`; overflow is a reducer failure.
    pub fn sum(inner: F) -> Self {
        fn add<V: Accumulate>(acc: V, value: V) -> Result<V, ObserveError> {
            acc.accumulate(value).ok_or_else(|| ObserveError::Reducer {
                function: "sum".to_string(),
                message: "accumulator overflow".to_string(),
            })
        }
        Self::new(inner, V::zero(), add::<V>)
    }
}

impl<F, V> Cumulative<F, Reducer<V>, V>
where
    V: PartialOrd + Clone,
{
    /// Keeps the largest value of `inner`, starting at `seed`.
    pub fn max(inner: F, seed: V) -> Self {
        fn larger<V: PartialOrd>(acc: V, value: V) -> Result<V, ObserveError> {
            Ok(if value > acc { value } else { acc })
        }
        Self::new(inner, seed, larger::<V>)
    }
}

impl<S, F, R, V> InformationFunction<S> for Cumulative<F, R, V>
where
    S: SolverState,
    F: InformationFunction<S>,
    R: FnMut(V, F::Value) -> Result<V, ObserveError>,
    V: Clone,
{
    type Value = V;

    #[inline]
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        self.inner.before_reset(state)?;
        self.accumulator = self.seed.clone();
        Ok(())
    }

    fn extract(&mut self, state: &S, done: bool) -> Result<V, ObserveError> {
        if done {
            return Ok(self.accumulator.clone());
        }
        let sample = self.inner.extract(state, false)?;
        // A failing reducer leaves the accumulator untouched.
        self.accumulator = (self.reducer)(self.accumulator.clone(), sample)?;
        Ok(self.accumulator.clone())
    }
}
