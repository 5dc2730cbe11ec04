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

//! Information functions.
//!
//! An `InformationFunction` reports a scalar-like `Value` about the search
//! at every node, e.g. a counter, a bound or the latency of an extractor.
//! Unlike observations, information values are always produced, also for
//! `done == true`, where the function reports its final value.
//!
//! The driver stores heterogeneous information functions behind
//! `InformationFunction<S, Value = Metric>`; any function whose value
//! implements `IntoMetric` can be adapted with `MetricAdapter`.

pub mod basic;
pub mod cumulative;
pub mod timed;

use crate::{clock::TimerSample, error::ObserveError};
use std::time::Duration;

pub use basic::{BranchingCandidates, DualBound, LpIterations, NodeCount, NodeLog};
pub use cumulative::{Accumulate, Cumulative, Folded};
pub use timed::Timed;

/// Reports a value about the search at every node.
pub trait InformationFunction<S> {
    type Value;

    /// Returns the name under which the value is recorded.
    fn name(&self) -> &str;

    /// Discards any previous episode state.
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError>;

    /// Produces the value for the current node, or the final value once `done` is set.
    fn extract(&mut self, state: &S, done: bool) -> Result<Self::Value, ObserveError>;
}

impl<S, F> InformationFunction<S> for &mut F
where
    F: InformationFunction<S> + ?Sized,
{
    type Value = F::Value;

    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        (**self).before_reset(state)
    }

    #[inline]
    fn extract(&mut self, state: &S, done: bool) -> Result<Self::Value, ObserveError> {
        (**self).extract(state, done)
    }
}

/// A recorded information value.
#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    Integer(u64),
    Float(f64),
    Duration(Duration),
    Text(String),
    Timer(TimerSample),
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Integer(v) => write!(f, "{}", v),
            Metric::Float(v) => write!(f, "{}", v),
            Metric::Duration(d) => write!(f, "{:.9}", d.as_secs_f64()),
            Metric::Text(s) => write!(f, "{}", s),
            Metric::Timer(t) => write!(f, "{}", t),
        }
    }
}

/// Conversion of information values into a `Metric`.
pub trait IntoMetric {
    fn into_metric(self) -> Metric;
}

impl IntoMetric for Metric {
    #[inline]
    fn into_metric(self) -> Metric {
        self
    }
}

impl IntoMetric for u64 {
    #[inline]
    fn into_metric(self) -> Metric {
        Metric::Integer(self)
    }
}

impl IntoMetric for f64 {
    #[inline]
    fn into_metric(self) -> Metric {
        Metric::Float(self)
    }
}

impl IntoMetric for Duration {
    #[inline]
    fn into_metric(self) -> Metric {
        Metric::Duration(self)
    }
}

impl IntoMetric for String {
    #[inline]
    fn into_metric(self) -> Metric {
        Metric::Text(self)
    }
}

impl IntoMetric for TimerSample {
    #[inline]
    fn into_metric(self) -> Metric {
        Metric::Timer(self)
    }
}

/// Adapts a typed information function to one producing `Metric`s.
#[derive(Clone, Debug)]
pub struct MetricAdapter<F> {
    inner: F,
}

impl<F> MetricAdapter<F> {
    #[inline]
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<S, F> InformationFunction<S> for MetricAdapter<F>
where
    F: InformationFunction<S>,
    F::Value: IntoMetric,
{
    type Value = Metric;

    #[inline]
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[inline]
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        self.inner.before_reset(state)
    }

    #[inline]
    fn extract(&mut self, state: &S, done: bool) -> Result<Metric, ObserveError> {
        self.inner.extract(state, done).map(IntoMetric::into_metric)
    }
}

/// Information values of one episode, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InformationRecord {
    entries: Vec<(String, Metric)>,
}

impl InformationRecord {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `metric`. An existing entry keeps its position.
    pub fn insert<N: Into<String>>(&mut self, name: N, metric: Metric) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = metric,
            None => self.entries.push((name, metric)),
        }
    }

    /// Builder-style `insert`.
    #[inline]
    pub fn with<N: Into<String>>(mut self, name: N, metric: Metric) -> Self {
        self.insert(name, metric);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, m)| m)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    /// Appends all entries of `other`, overwriting equal names.
    pub fn extend(&mut self, other: InformationRecord) {
        for (k, m) in other.entries {
            self.insert(k, m);
        }
    }

    /// Flattens the record into text cells. A `Timer` metric becomes two
    /// cells, `<name>.wall` and `<name>.cpu`, in seconds; absent clocks are
    /// empty.
    pub fn cells(&self) -> Vec<(String, String)> {
        let seconds = |d: Option<Duration>| d.map_or_else(String::new, |d| format!("{:.9}", d.as_secs_f64()));
        let mut cells = Vec::with_capacity(self.entries.len());
        for (name, metric) in &self.entries {
            match metric {
                Metric::Timer(t) => {
                    cells.push((format!("{}.wall", name), seconds(t.wall)));
                    cells.push((format!("{}.cpu", name), seconds(t.cpu)));
                }
                other => cells.push((name.clone(), other.to_string())),
            }
        }
        cells
    }
}

impl std::fmt::Display for InformationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (name, metric) in &self.entries {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}: {}", name, metric)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_insertion_order_and_overwrites_in_place() {
        let mut r = InformationRecord::new();
        r.insert("b", Metric::Integer(1));
        r.insert("a", Metric::Float(0.5));
        r.insert("b", Metric::Integer(2));
        let keys: Vec<&str> = r.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(r.get("b"), Some(&Metric::Integer(2)));
        assert_eq!(format!("{}", r), "b: 2, a: 0.5");
    }

    #[test]
    fn test_timer_metric_flattens_into_two_cells() {
        let r = InformationRecord::new().with(
            "x",
            Metric::Timer(TimerSample {
                wall: Some(Duration::from_millis(1500)),
                cpu: None,
            }),
        );
        assert_eq!(
            r.cells(),
            vec![
                ("x.wall".to_string(), "1.500000000".to_string()),
                ("x.cpu".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_into_metric_conversions() {
        assert_eq!(3u64.into_metric(), Metric::Integer(3));
        assert_eq!(String::from("s").into_metric(), Metric::Text("s".into()));
        assert_eq!(
            Duration::from_secs(2).into_metric().to_string(),
            "2.000000000"
        );
    }
}
