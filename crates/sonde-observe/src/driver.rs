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

//! Search tree driver
//!
//! `SearchTreeDriver` walks one branch-and-bound episode and invokes a fixed,
//! ordered set of probes at every node. A probe is either an observation
//! extractor or an information function producing a `Metric`.
//!
//! Episode protocol
//! - Every probe is reset once with `before_reset`.
//! - `solve_iter` runs with timing paused.
//! - At every node: read `done = solve_iter_is_done()`, then invoke every
//!   probe once, in registration order, with `(state, done)`.
//! - If `done`, the episode ends. Otherwise timing is paused, the solver
//!   branches on the first LP branching candidate, and timing resumes.
//!
//! The node count of an episode is `SolverState::node_count()` once the
//! episode has finished; the driver never counts steps on its own. Any error
//! from the solver or a probe aborts the episode and is returned unchanged.

use crate::{
    clock::{ClockSelection, Stopwatch, TimerSample},
    error::ObserveError,
    information::{InformationFunction, InformationRecord, IntoMetric, Metric, MetricAdapter},
    observation::ObservationExtractor,
};
use sonde_solver::state::SolverState;

/// Control over an outer timer while the driver advances the solver.
pub trait TimingControl {
    /// Stops accumulating time. Pausing a paused timer has no effect.
    fn pause(&mut self) -> Result<(), ObserveError>;

    /// Continues accumulating time. Resuming a running timer has no effect.
    fn resume(&mut self) -> Result<(), ObserveError>;
}

/// A `TimingControl` that measures nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTiming;

impl TimingControl for NoTiming {
    #[inline]
    fn pause(&mut self) -> Result<(), ObserveError> {
        Ok(())
    }

    #[inline]
    fn resume(&mut self) -> Result<(), ObserveError> {
        Ok(())
    }
}

/// Accumulates time over running intervals only.
#[derive(Debug, Clone)]
pub struct SplitTimer {
    selection: ClockSelection,
    total: TimerSample,
    running: Option<Stopwatch>,
}

impl SplitTimer {
    /// Creates a paused timer.
    #[inline]
    pub fn new(selection: ClockSelection) -> Self {
        Self {
            selection,
            total: TimerSample::zero(selection),
            running: None,
        }
    }

    /// Creates a running timer.
    #[inline]
    pub fn start(selection: ClockSelection) -> Result<Self, ObserveError> {
        let mut timer = Self::new(selection);
        timer.resume()?;
        Ok(timer)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Pauses the timer and returns the accumulated time.
    #[inline]
    pub fn stop(&mut self) -> Result<TimerSample, ObserveError> {
        self.pause()?;
        Ok(self.total)
    }

    /// Accumulated time of all finished intervals.
    #[inline]
    pub fn total(&self) -> TimerSample {
        self.total
    }
}

impl TimingControl for SplitTimer {
    fn pause(&mut self) -> Result<(), ObserveError> {
        if let Some(watch) = self.running.take() {
            self.total += watch.elapsed()?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ObserveError> {
        if self.running.is_none() {
            self.running = Some(Stopwatch::start(self.selection)?);
        }
        Ok(())
    }
}

/// A registered probe.
pub enum Probe<'a, S> {
    Observation(Box<dyn ObservationExtractor<S> + 'a>),
    Information(Box<dyn InformationFunction<S, Value = Metric> + 'a>),
}

impl<'a, S> Probe<'a, S>
where
    S: SolverState,
{
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Probe::Observation(e) => e.name(),
            Probe::Information(f) => f.name(),
        }
    }

    #[inline]
    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        match self {
            Probe::Observation(e) => e.before_reset(state),
            Probe::Information(f) => f.before_reset(state),
        }
    }
}

impl<S> std::fmt::Debug for Probe<'_, S>
where
    S: SolverState,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Probe::Observation(_) => write!(f, "Probe::Observation({})", self.name()),
            Probe::Information(_) => write!(f, "Probe::Information({})", self.name()),
        }
    }
}

/// Result of one episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeRecord {
    /// Final value of every information probe.
    pub information: InformationRecord,
    /// Number of non-empty observations per observation probe.
    pub observations: Vec<(String, u64)>,
    /// Nodes processed by the solver.
    pub nodes: u64,
}

impl EpisodeRecord {
    /// Number of observations of the probe called `name`.
    pub fn observation_count(&self, name: &str) -> Option<u64> {
        self.observations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }
}

impl std::fmt::Display for EpisodeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EpisodeRecord(nodes: {}, {})", self.nodes, self.information)
    }
}

/// Drives episodes and invokes probes at every node.
pub struct SearchTreeDriver<'a, S> {
    probes: Vec<Probe<'a, S>>,
    total_nodes: u64,
    episodes: u64,
}

impl<'a, S> Default for SearchTreeDriver<'a, S>
where
    S: SolverState,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S> SearchTreeDriver<'a, S>
where
    S: SolverState,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            total_nodes: 0,
            episodes: 0,
        }
    }

    #[inline]
    pub fn from_probes(probes: Vec<Probe<'a, S>>) -> Self {
        Self {
            probes,
            total_nodes: 0,
            episodes: 0,
        }
    }

    /// Registers an observation extractor.
    #[inline]
    pub fn add_observation<E>(&mut self, extractor: E) -> &mut Self
    where
        E: ObservationExtractor<S> + 'a,
    {
        self.probes.push(Probe::Observation(Box::new(extractor)));
        self
    }

    /// Registers an information function.
    #[inline]
    pub fn add_information<F>(&mut self, function: F) -> &mut Self
    where
        F: InformationFunction<S> + 'a,
        F::Value: IntoMetric,
    {
        self.probes
            .push(Probe::Information(Box::new(MetricAdapter::new(function))));
        self
    }

    #[inline]
    pub fn add_probe(&mut self, probe: Probe<'a, S>) -> &mut Self {
        self.probes.push(probe);
        self
    }

    #[inline]
    pub fn probes(&self) -> &[Probe<'a, S>] {
        &self.probes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Nodes processed over all finished episodes.
    #[inline]
    pub fn total_nodes(&self) -> u64 {
        self.total_nodes
    }

    /// Number of finished episodes.
    #[inline]
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Fails if two probes report under the same name.
    fn check_names(&self) -> Result<(), ObserveError> {
        for (i, probe) in self.probes.iter().enumerate() {
            let name = probe.name();
            if self.probes[..i].iter().any(|p| p.name() == name) {
                return Err(ObserveError::DuplicateProbe {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Runs one episode on a freshly created `state`.
    ///
    /// Probe names key the episode record, so they must be unique; a
    /// duplicate aborts the episode before any probe is reset.
    pub fn run_episode<T>(&mut self, state: &mut S, timing: &mut T) -> Result<EpisodeRecord, ObserveError>
    where
        T: TimingControl,
    {
        self.check_names()?;
        for probe in self.probes.iter_mut() {
            probe.before_reset(state)?;
        }

        timing.pause()?;
        let started = state.solve_iter();
        timing.resume()?;
        started?;

        let mut information = InformationRecord::new();
        let mut observations: Vec<(String, u64)> = self
            .probes
            .iter()
            .filter(|p| matches!(p, Probe::Observation(_)))
            .map(|p| (p.name().to_string(), 0))
            .collect();

        loop {
            let done = state.solve_iter_is_done();
            let mut slot = 0;
            for probe in self.probes.iter_mut() {
                match probe {
                    Probe::Observation(extractor) => {
                        if extractor.extract(state, done)?.is_some() {
                            observations[slot].1 += 1;
                        }
                        slot += 1;
                    }
                    Probe::Information(function) => {
                        let metric = function.extract(state, done)?;
                        information.insert(function.name(), metric);
                    }
                }
            }
            if done {
                break;
            }

            let node = state.node_count();
            let variable = state
                .lp_branch_candidates()
                .first()
                .copied()
                .ok_or(ObserveError::NoBranchingCandidate { node })?;
            tracing::debug!(
                node,
                depth = state.depth(),
                candidates = state.lp_branch_candidates().len(),
                %variable,
                "node observed"
            );

            timing.pause()?;
            let stepped = state.solve_iter_branch(variable);
            timing.resume()?;
            stepped?;
        }

        let nodes = state.node_count();
        self.total_nodes = self.total_nodes.saturating_add(nodes);
        self.episodes += 1;
        tracing::info!(
            episode = self.episodes,
            nodes,
            status = %state.status(),
            "episode finished"
        );

        Ok(EpisodeRecord {
            information,
            observations,
            nodes,
        })
    }
}

impl<S> std::fmt::Display for SearchTreeDriver<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchTreeDriver(probes: {}, episodes: {}, total_nodes: {})",
            self.probes.len(),
            self.episodes,
            self.total_nodes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        information::{Cumulative, Folded, NodeCount, Timed},
        observation::{Khalil2016, NodeBipartite, Observation},
        test_support::knapsack_solver,
    };
    use sonde_solver::solver::Solver;
    use std::{cell::RefCell, rc::Rc};

    /// Logs every call it receives into a shared journal.
    struct Journal {
        name: &'static str,
        log: Rc<RefCell<Vec<(String, u64, bool)>>>,
    }

    impl ObservationExtractor<Solver> for Journal {
        fn name(&self) -> &str {
            self.name
        }

        fn before_reset(&mut self, _state: &Solver) -> Result<(), ObserveError> {
            self.log.borrow_mut().push((format!("{}:reset", self.name), 0, false));
            Ok(())
        }

        fn extract(&mut self, state: &Solver, done: bool) -> Result<Option<Observation>, ObserveError> {
            self.log
                .borrow_mut()
                .push((self.name.to_string(), state.node_count(), done));
            Ok(None)
        }
    }

    #[test]
    fn test_probes_run_in_registration_order_once_per_node() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut driver = SearchTreeDriver::new();
        driver
            .add_observation(Journal {
                name: "a",
                log: Rc::clone(&log),
            })
            .add_observation(Journal {
                name: "b",
                log: Rc::clone(&log),
            });

        let mut solver = knapsack_solver(784, 10);
        let record = driver.run_episode(&mut solver, &mut NoTiming).unwrap();

        let log = log.borrow();
        assert_eq!(log[0].0, "a:reset");
        assert_eq!(log[1].0, "b:reset");
        let calls = &log[2..];
        assert_eq!(calls.len() % 2, 0);
        for pair in calls.chunks(2) {
            assert_eq!(pair[0].0, "a");
            assert_eq!(pair[1].0, "b");
            assert_eq!(pair[0].1, pair[1].1);
            assert_eq!(pair[0].2, pair[1].2);
        }
        // Exactly the last invocation sees `done`.
        let last = calls.len() - 1;
        assert!(calls[last].2);
        assert!(calls[..last - 1].iter().all(|c| !c.2));
        assert_eq!(record.nodes, solver.node_count());
        assert_eq!(record.observation_count("a"), Some(0));
    }

    #[test]
    fn test_episode_counts_and_information() {
        let mut extractor = NodeBipartite::new();
        let mut khalil = Khalil2016::new();
        let mut driver = SearchTreeDriver::new();
        let timed: Folded<_, TimerSample> =
            Cumulative::sum(Timed::new(&mut khalil, ClockSelection::Wall));
        driver
            .add_observation(&mut extractor)
            .add_information(timed)
            .add_information(NodeCount);

        let mut solver = knapsack_solver(784, 10);
        let mut timer = SplitTimer::start(ClockSelection::Wall).unwrap();
        let record = driver.run_episode(&mut solver, &mut timer).unwrap();
        let elapsed = timer.stop().unwrap();

        assert!(record.nodes >= 1 && record.nodes <= 10);
        assert_eq!(record.information.get("nodes"), Some(&Metric::Integer(record.nodes)));
        assert!(matches!(
            record.information.get("Khalil2016"),
            Some(Metric::Timer(TimerSample { wall: Some(_), cpu: None }))
        ));
        let observed = record.observation_count("NodeBipartite").unwrap();
        assert!(observed >= 1);
        assert!(elapsed.wall.is_some());
        assert_eq!(driver.episodes(), 1);
        assert_eq!(driver.total_nodes(), record.nodes);
    }

    #[test]
    fn test_differently_clocked_wrappers_report_separately() {
        let wall: Folded<_, TimerSample> = Cumulative::sum(Timed::named(
            NodeBipartite::new(),
            ClockSelection::Wall,
            "bipartite.wall_clock",
        ));
        let both: Folded<_, TimerSample> = Cumulative::sum(Timed::named(
            NodeBipartite::new(),
            ClockSelection::Both,
            "bipartite.both_clocks",
        ));
        let mut driver = SearchTreeDriver::new();
        driver.add_information(wall).add_information(both);

        let mut solver = knapsack_solver(784, 10);
        let record = driver.run_episode(&mut solver, &mut NoTiming).unwrap();

        assert_eq!(record.information.len(), 2);
        assert!(matches!(
            record.information.get("bipartite.wall_clock"),
            Some(Metric::Timer(TimerSample { wall: Some(_), cpu: None }))
        ));
        match record.information.get("bipartite.both_clocks") {
            Some(Metric::Timer(sample)) => {
                assert!(sample.wall.is_some());
                #[cfg(unix)]
                assert!(sample.cpu.is_some());
            }
            other => panic!("expected a timer, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_reporting_names_are_rejected() {
        let wall: Folded<_, TimerSample> =
            Cumulative::sum(Timed::new(NodeBipartite::new(), ClockSelection::Wall));
        let cpu: Folded<_, TimerSample> =
            Cumulative::sum(Timed::new(NodeBipartite::new(), ClockSelection::Cpu));
        let mut driver = SearchTreeDriver::new();
        driver.add_information(wall).add_information(cpu);

        let mut solver = knapsack_solver(784, 10);
        let err = driver.run_episode(&mut solver, &mut NoTiming).unwrap_err();
        assert!(matches!(err, ObserveError::DuplicateProbe { ref name } if name == "NodeBipartite"));
        // Nothing was reset or stepped.
        assert_eq!(solver.node_count(), 0);
        assert_eq!(driver.episodes(), 0);
    }

    #[test]
    fn test_totals_accumulate_over_episodes() {
        let mut driver: SearchTreeDriver<'_, Solver> = SearchTreeDriver::new();
        driver.add_observation(NodeBipartite::new());
        let mut total = 0;
        for seed in [1, 2] {
            let mut solver = knapsack_solver(seed, 5);
            total += driver.run_episode(&mut solver, &mut NoTiming).unwrap().nodes;
        }
        assert_eq!(driver.episodes(), 2);
        assert_eq!(driver.total_nodes(), total);
    }

    #[test]
    fn test_solver_errors_abort_the_episode() {
        let mut driver: SearchTreeDriver<'_, Solver> = SearchTreeDriver::new();
        driver.add_observation(NodeBipartite::new());
        let mut solver = knapsack_solver(1, 5);
        driver.run_episode(&mut solver, &mut NoTiming).unwrap();
        // The solver is finished; a second episode on it cannot start.
        let err = driver.run_episode(&mut solver, &mut NoTiming).unwrap_err();
        assert!(matches!(err, ObserveError::Solver(_)));
        assert_eq!(driver.episodes(), 1);
    }

    #[test]
    fn test_split_timer_ignores_paused_intervals() {
        let mut timer = SplitTimer::new(ClockSelection::Wall);
        assert!(!timer.is_running());
        timer.pause().unwrap();
        assert_eq!(timer.total().wall, Some(std::time::Duration::ZERO));
        timer.resume().unwrap();
        timer.resume().unwrap();
        assert!(timer.is_running());
        let total = timer.stop().unwrap();
        assert!(!timer.is_running());
        assert_eq!(timer.stop().unwrap(), total);
    }
}
