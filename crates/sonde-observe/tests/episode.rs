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

use sonde_model::generator::{KnapsackGenerator, KnapsackGeneratorConfig};
use sonde_model::model::Model;
use sonde_observe::clock::{ClockSelection, TimerSample};
use sonde_observe::driver::{NoTiming, SearchTreeDriver};
use sonde_observe::harness::{BenchmarkHarness, ExtractorRegistry, HarnessConfig};
use sonde_observe::information::{Cumulative, Folded, Metric, NodeCount, Timed};
use sonde_observe::observation::{Khalil2016, NodeBipartite, NodeBipartiteDense};
use sonde_observe::record::RecordWriter;
use sonde_solver::settings::SolverSettings;
use sonde_solver::solver::Solver;

fn instance(seed: u64) -> Model {
    KnapsackGenerator::new(KnapsackGeneratorConfig::default(), seed)
        .next()
        .unwrap()
        .unwrap()
}

fn solver(model: &Model) -> Solver {
    let settings = SolverSettings::new()
        .with_seed(784)
        .with_presolve(false)
        .with_cuts(false)
        .with_node_limit(Some(10));
    Solver::new(model.clone(), settings)
}

#[test]
fn test_extractors_agree_on_node_totals() {
    let model = instance(5);

    let mut sparse = SearchTreeDriver::new();
    sparse.add_observation(NodeBipartite::new());
    let mut khalil = SearchTreeDriver::new();
    khalil.add_observation(Khalil2016::new());

    for _ in 0..3 {
        let a = sparse.run_episode(&mut solver(&model), &mut NoTiming).unwrap();
        let b = khalil.run_episode(&mut solver(&model), &mut NoTiming).unwrap();
        assert_eq!(a.nodes, b.nodes);
        assert!(a.nodes >= 1 && a.nodes <= 10);
        // Nodes pruned inside the solver are counted but never observed.
        let observed = a.observation_count("NodeBipartite").unwrap();
        assert!(observed >= 1 && observed <= a.nodes);
        assert_eq!(b.observation_count("Khalil2016"), Some(observed));
    }
    assert_eq!(sparse.total_nodes(), khalil.total_nodes());
    assert_eq!(sparse.episodes(), 3);
}

#[test]
fn test_timed_extraction_is_written_as_csv() {
    let model = instance(9);
    let mut writer = RecordWriter::new(Vec::new());

    for _ in 0..2 {
        let timed: Folded<_, TimerSample> =
            Cumulative::sum(Timed::new(NodeBipartiteDense::new(), ClockSelection::Wall));
        let mut driver = SearchTreeDriver::new();
        driver.add_information(NodeCount).add_information(timed);

        let record = driver.run_episode(&mut solver(&model), &mut NoTiming).unwrap();
        assert!(matches!(
            record.information.get("NodeBipartiteDense"),
            Some(Metric::Timer(TimerSample { wall: Some(_), cpu: None }))
        ));
        writer.write(&record.information).unwrap();
    }

    let text = String::from_utf8(writer.into_inner()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("nodes,NodeBipartiteDense.wall,NodeBipartiteDense.cpu")
    );
    assert_eq!(lines.count(), 2);
}

#[test]
fn test_harness_report_over_standard_extractors() {
    let model = instance(2);
    let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::standard();
    let harness = BenchmarkHarness::new(HarnessConfig {
        iterations: 3,
        clock: ClockSelection::Wall,
    });
    let report = harness.run(&mut registry, || solver(&model)).unwrap();

    let nodes: Vec<u64> = report.iter().map(|s| s.nodes).collect();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.windows(2).all(|w| w[0] == w[1]));
    assert!(report.get("Khalil2016").is_some());
}

#[test]
fn test_one_driver_observes_every_extractor_at_every_node() {
    let model = instance(5);
    let mut driver = SearchTreeDriver::new();
    driver
        .add_observation(NodeBipartite::new())
        .add_observation(Khalil2016::new())
        .add_information(NodeCount);

    let record = driver.run_episode(&mut solver(&model), &mut NoTiming).unwrap();
    assert_eq!(
        record.observation_count("NodeBipartite"),
        record.observation_count("Khalil2016")
    );
    assert_eq!(record.information.get("nodes"), Some(&Metric::Integer(record.nodes)));
    assert_eq!(driver.total_nodes(), record.nodes);
}
