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

//! Benchmark harness for competing extractors.
//!
//! The harness runs every registered extractor over the same trajectory:
//! each iteration builds a fresh solver state through the caller's factory
//! (untimed), wraps the extractor in `Cumulative::sum(Timed::named(..))`
//! under its registry name and drives one episode. Identical solver settings make every extractor see
//! the same node sequence, so their node totals must agree.

use crate::{
    clock::{ClockSelection, TimerSample},
    driver::{SearchTreeDriver, SplitTimer},
    error::ObserveError,
    information::{Cumulative, Folded, InformationRecord, Metric, Timed},
    observation::{Khalil2016, NodeBipartite, NodeBipartiteDense, ObservationExtractor},
};
use sonde_solver::state::SolverState;
use std::time::Duration;

/// Named extractors, in registration order.
pub struct ExtractorRegistry<'a, S> {
    entries: Vec<(String, Box<dyn ObservationExtractor<S> + 'a>)>,
}

impl<'a, S> Default for ExtractorRegistry<'a, S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, S> ExtractorRegistry<'a, S> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extractor` under `name`. Names must be unique.
    pub fn register<N, E>(&mut self, name: N, extractor: E) -> Result<&mut Self, ObserveError>
    where
        N: Into<String>,
        E: ObservationExtractor<S> + 'a,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(ObserveError::DuplicateExtractor { name });
        }
        self.entries.push((name, Box::new(extractor)));
        Ok(self)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn ObservationExtractor<S> + 'a)> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e.as_mut())
    }

    /// Iterates over `(name, extractor)` pairs in registration order.
    #[inline]
    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut (dyn ObservationExtractor<S> + 'a))> {
        self.entries
            .iter_mut()
            .map(|(n, e)| (n.as_str(), e.as_mut()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> ExtractorRegistry<'static, S>
where
    S: SolverState,
{
    /// The three built-in extractors under their own names.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.entries.push((
            NodeBipartite::NAME.to_string(),
            Box::new(NodeBipartite::new()),
        ));
        registry.entries.push((
            NodeBipartiteDense::NAME.to_string(),
            Box::new(NodeBipartiteDense::new()),
        ));
        registry
            .entries
            .push((Khalil2016::NAME.to_string(), Box::new(Khalil2016::new())));
        registry
    }
}

/// Configuration of a `BenchmarkHarness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Episodes per extractor.
    pub iterations: u32,
    /// Clocks read around every extraction and episode.
    pub clock: ClockSelection,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            clock: ClockSelection::Both,
        }
    }
}

/// Accumulated measurements of one extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkStatistics {
    pub name: String,
    pub iterations: u32,
    /// Time spent inside `extract`, summed over all nodes and iterations.
    pub extraction: TimerSample,
    /// Episode time excluding solver steps.
    pub episode: TimerSample,
    pub nodes: u64,
}

impl BenchmarkStatistics {
    pub fn new<N: Into<String>>(name: N, clock: ClockSelection) -> Self {
        Self {
            name: name.into(),
            iterations: 0,
            extraction: TimerSample::zero(clock),
            episode: TimerSample::zero(clock),
            nodes: 0,
        }
    }

    #[inline]
    pub fn on_iteration(&mut self, extraction: TimerSample, episode: TimerSample, nodes: u64) {
        self.iterations += 1;
        self.extraction += extraction;
        self.episode += episode;
        self.nodes = self.nodes.saturating_add(nodes);
    }

    /// Mean extraction time per iteration.
    #[inline]
    pub fn mean_extraction(&self) -> TimerSample {
        self.extraction.div(self.iterations)
    }

    /// Mean episode time per iteration.
    #[inline]
    pub fn mean_episode(&self) -> TimerSample {
        self.episode.div(self.iterations)
    }

    #[inline]
    pub fn nodes_per_iteration(&self) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            self.nodes as f64 / f64::from(self.iterations)
        }
    }

    /// Flattens the statistics into a record for the `RecordWriter`.
    pub fn to_record(&self) -> InformationRecord {
        InformationRecord::new()
            .with("implementation", Metric::Text(self.name.clone()))
            .with("iterations", Metric::Integer(u64::from(self.iterations)))
            .with("nodes", Metric::Integer(self.nodes))
            .with("extraction", Metric::Timer(self.extraction))
            .with("episode", Metric::Timer(self.episode))
    }
}

impl std::fmt::Display for BenchmarkStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = |d: Option<Duration>| d.map_or_else(|| "-".to_string(), |d| format!("{:.6}", d.as_secs_f64()));
        write!(
            f,
            "{:<20} | {:>10} | {:>8} | {:>14} | {:>14} | {:>14}",
            self.name,
            self.iterations,
            self.nodes,
            secs(self.mean_extraction().wall),
            secs(self.mean_extraction().cpu),
            secs(self.mean_episode().wall),
        )
    }
}

/// Measurements of all extractors, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    entries: Vec<BenchmarkStatistics>,
}

impl BenchmarkReport {
    #[inline]
    pub fn get(&self, name: &str) -> Option<&BenchmarkStatistics> {
        self.entries.iter().find(|s| s.name == name)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkStatistics> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> Vec<InformationRecord> {
        self.entries.iter().map(BenchmarkStatistics::to_record).collect()
    }
}

impl std::fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<20} | {:>10} | {:>8} | {:>14} | {:>14} | {:>14}",
            "Implementation", "Iterations", "Nodes", "Extract wall", "Extract cpu", "Episode wall"
        )?;
        writeln!(f, "{}", "-".repeat(95))?;
        for s in &self.entries {
            writeln!(f, "{}", s)?;
        }
        Ok(())
    }
}

/// The timer stored under `name`.
pub fn timer_metric(record: &InformationRecord, name: &str) -> Result<TimerSample, ObserveError> {
    match record.get(name) {
        Some(Metric::Timer(sample)) => Ok(*sample),
        _ => Err(ObserveError::MissingMetric {
            name: name.to_string(),
        }),
    }
}

/// Runs every registered extractor for a number of episodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkHarness {
    config: HarnessConfig,
}

impl BenchmarkHarness {
    #[inline]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Benchmarks every extractor of `registry` on states built by `make_state`.
    pub fn run<'a, S, F>(
        &self,
        registry: &mut ExtractorRegistry<'a, S>,
        mut make_state: F,
    ) -> Result<BenchmarkReport, ObserveError>
    where
        S: SolverState,
        F: FnMut() -> S,
    {
        let clock = self.config.clock;
        let mut report = BenchmarkReport::default();

        for (name, extractor) in registry.entries.iter_mut() {
            let mut stats = BenchmarkStatistics::new(name.as_str(), clock);

            for iteration in 0..self.config.iterations {
                let mut state = make_state();

                let timed: Folded<_, TimerSample> =
                    Cumulative::sum(Timed::named(extractor.as_mut(), clock, name.as_str()));
                let mut driver = SearchTreeDriver::new();
                driver.add_information(timed);

                let mut timer = SplitTimer::start(clock)?;
                let record = driver.run_episode(&mut state, &mut timer)?;
                let episode = timer.stop()?;

                let extraction = timer_metric(&record.information, name)?;
                tracing::debug!(
                    implementation = name.as_str(),
                    iteration,
                    nodes = record.nodes,
                    extraction = %extraction,
                    "benchmark iteration finished"
                );
                stats.on_iteration(extraction, episode, record.nodes);
            }

            tracing::info!(
                implementation = name.as_str(),
                iterations = stats.iterations,
                nodes = stats.nodes,
                extraction = %stats.extraction,
                "implementation benchmarked"
            );
            report.entries.push(stats);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::knapsack_solver;
    use sonde_solver::solver::Solver;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::new();
        registry.register("x", NodeBipartite::new()).unwrap();
        let err = registry.register("x", Khalil2016::new()).err().unwrap();
        assert!(matches!(err, ObserveError::DuplicateExtractor { ref name } if name == "x"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_extractor_type_under_two_names() {
        let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::new();
        registry
            .register("first", NodeBipartite::new())
            .unwrap()
            .register("second", NodeBipartite::new())
            .unwrap();
        let harness = BenchmarkHarness::new(HarnessConfig {
            iterations: 1,
            clock: ClockSelection::Wall,
        });
        let report = harness
            .run(&mut registry, || knapsack_solver(784, 10))
            .unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report.get("first").map(|s| s.nodes), report.get("second").map(|s| s.nodes));
        assert!(report.get("first").and_then(|s| s.extraction.wall).is_some());
        assert!(report.get("second").and_then(|s| s.extraction.wall).is_some());
    }

    #[test]
    fn test_missing_or_mistyped_timer_is_an_error() {
        let record = InformationRecord::new()
            .with("nodes", Metric::Integer(3))
            .with("t", Metric::Timer(TimerSample::zero(ClockSelection::Wall)));
        assert_eq!(
            timer_metric(&record, "t").unwrap(),
            TimerSample::zero(ClockSelection::Wall)
        );
        assert!(matches!(
            timer_metric(&record, "nodes"),
            Err(ObserveError::MissingMetric { ref name }) if name == "nodes"
        ));
        assert!(matches!(
            timer_metric(&record, "absent"),
            Err(ObserveError::MissingMetric { .. })
        ));
    }

    #[test]
    fn test_standard_registry() {
        let registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::standard();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["NodeBipartite", "NodeBipartiteDense", "Khalil2016"]);
    }

    #[test]
    fn test_every_extractor_sees_the_same_trajectory() {
        let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::standard();
        let harness = BenchmarkHarness::new(HarnessConfig {
            iterations: 2,
            clock: ClockSelection::Wall,
        });
        let report = harness
            .run(&mut registry, || knapsack_solver(784, 10))
            .unwrap();

        assert_eq!(report.len(), 3);
        let nodes: Vec<u64> = report.iter().map(|s| s.nodes).collect();
        assert!(nodes.iter().all(|n| *n == nodes[0]));
        for stats in report.iter() {
            assert_eq!(stats.iterations, 2);
            assert!(stats.extraction.wall.is_some());
            assert!(stats.extraction.cpu.is_none());
            assert!(stats.nodes_per_iteration() >= 1.0);
        }
        let records = report.records();
        assert_eq!(records[0].get("implementation"), Some(&Metric::Text("NodeBipartite".into())));
        assert!(format!("{}", report).contains("Khalil2016"));
    }
}
