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

//! Command implementations.

use crate::{
    cli::{Cli, Commands, CompareArgs, EpisodesArgs},
    error::CliError,
};
use sonde_model::{
    generator::{
        KnapsackGenerator, KnapsackGeneratorConfig, SetPackingGenerator,
        SetPackingGeneratorConfig,
    },
    loading::ProblemLoader,
    model::{Model, ModelError},
};
use sonde_observe::{
    clock::{ClockSelection, TimerSample},
    driver::{EpisodeRecord, NoTiming, SearchTreeDriver},
    error::ObserveError,
    harness::{BenchmarkHarness, ExtractorRegistry, HarnessConfig},
    information::{Cumulative, Folded, InformationRecord, Metric, NodeCount, NodeLog, Timed},
    record::RecordWriter,
};
use sonde_solver::{settings::SolverSettings, solver::Solver};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// Seed of `episodes` when none is given.
pub const DEFAULT_EPISODE_SEED: u64 = 0;
/// Seed of `compare` when none is given.
pub const DEFAULT_COMPARE_SEED: u64 = 784;

/// Dispatches the parsed command line.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Episodes(args) => episodes(args),
        Commands::Compare(args) => compare(args),
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, CliError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| CliError::Output {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes one CSV row per generated instance and episode.
pub fn episodes(args: &EpisodesArgs) -> Result<(), CliError> {
    let rows = match &args.output {
        Some(path) => {
            let mut writer = RecordWriter::new(create(path)?);
            let rows = write_episodes(args, &mut writer)?;
            writer.flush()?;
            rows
        }
        None => {
            let stdout = io::stdout();
            let mut writer = RecordWriter::new(stdout.lock());
            let rows = write_episodes(args, &mut writer)?;
            writer.flush()?;
            rows
        }
    };
    tracing::info!(rows, "episodes written");
    Ok(())
}

fn write_episodes<W: Write>(
    args: &EpisodesArgs,
    writer: &mut RecordWriter<W>,
) -> Result<u64, CliError> {
    let n = usize::try_from(args.n_instances).unwrap_or(usize::MAX);
    let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::standard();

    let seed = args.seed.unwrap_or(DEFAULT_EPISODE_SEED);
    let settings = SolverSettings::reproducible(seed, args.node_limit);

    let knapsack = KnapsackGenerator::new(KnapsackGeneratorConfig::default(), seed).take(n);
    let packing = SetPackingGenerator::new(SetPackingGeneratorConfig::default(), seed).take(n);

    let mut rows = write_generator("knapsack", knapsack, &mut registry, settings, args, writer)?;
    rows += write_generator("set_packing", packing, &mut registry, settings, args, writer)?;
    Ok(rows)
}

fn write_generator<I, W>(
    generator: &str,
    instances: I,
    registry: &mut ExtractorRegistry<'_, Solver>,
    settings: SolverSettings,
    args: &EpisodesArgs,
    writer: &mut RecordWriter<W>,
) -> Result<u64, CliError>
where
    I: Iterator<Item = Result<Model, ModelError>>,
    W: Write,
{
    let mut rows = 0;
    for (index, model) in instances.enumerate() {
        let model = model?;
        let mut solver = Solver::new(model, settings);
        let episode = timed_episode(registry, &mut solver, args.clock.into())?;

        let mut row = InformationRecord::new()
            .with("generator", Metric::Text(generator.to_string()))
            .with("instance", Metric::Integer(index as u64));
        row.extend(episode.information);
        writer.write(&row)?;
        rows += 1;
    }
    tracing::info!(generator, rows, "generator finished");
    Ok(rows)
}

/// Runs one episode with every extractor of `registry` timed under its
/// registry name.
pub fn timed_episode(
    registry: &mut ExtractorRegistry<'_, Solver>,
    solver: &mut Solver,
    clock: ClockSelection,
) -> Result<EpisodeRecord, ObserveError> {
    let mut driver = SearchTreeDriver::new();
    driver.add_information(NodeCount).add_information(NodeLog::default());
    for (name, extractor) in registry.iter_mut() {
        let timed: Folded<_, TimerSample> =
            Cumulative::sum(Timed::named(extractor, clock, name));
        driver.add_information(timed);
    }
    driver.run_episode(solver, &mut NoTiming)
}

fn load_instance(args: &CompareArgs, seed: u64) -> Result<Model, CliError> {
    match &args.instance {
        Some(path) => ProblemLoader::new()
            .from_path(path)
            .map_err(|source| CliError::Load {
                path: path.clone(),
                source,
            }),
        None => KnapsackGenerator::new(KnapsackGeneratorConfig::default(), seed)
            .next()
            .ok_or(CliError::EmptyGenerator)?
            .map_err(CliError::from),
    }
}

/// Benchmarks the standard extractors on one instance.
pub fn compare(args: &CompareArgs) -> Result<(), CliError> {
    let seed = args.seed.unwrap_or(DEFAULT_COMPARE_SEED);
    let model = load_instance(args, seed)?;
    tracing::info!(
        instance = model.name(),
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        "instance loaded"
    );

    let settings = SolverSettings::reproducible(seed, args.node_limit);
    let harness = BenchmarkHarness::new(HarnessConfig {
        iterations: args.iterations,
        clock: args.clock.into(),
    });
    let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::standard();
    let report = harness.run(&mut registry, || Solver::new(model.clone(), settings))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", report)?;
    out.flush()?;

    if let Some(path) = &args.output {
        let mut writer = RecordWriter::new(create(path)?);
        for record in report.records() {
            writer.write(&record)?;
        }
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_rows_share_one_header() {
        let args = EpisodesArgs {
            n_instances: 2,
            node_limit: 5,
            seed: Some(3),
            clock: crate::cli::ClockArg::Wall,
            output: None,
        };
        let mut writer = RecordWriter::new(Vec::new());
        let rows = write_episodes(&args, &mut writer).unwrap();
        assert_eq!(rows, 4);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "generator,instance,nodes,node_log,NodeBipartite.wall,NodeBipartite.cpu,\
                 NodeBipartiteDense.wall,NodeBipartiteDense.cpu,Khalil2016.wall,Khalil2016.cpu"
            )
        );
        let body: Vec<&str> = lines.collect();
        assert_eq!(body.len(), 4);
        assert!(body[0].starts_with("knapsack,0,"));
        assert!(body[3].starts_with("set_packing,1,"));
    }

    #[test]
    fn test_compare_writes_report_records() {
        let dir = std::env::temp_dir().join(format!("sonde-bench-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("report.csv");
        let args = CompareArgs {
            instance: Some(
                Path::new(env!("CARGO_MANIFEST_DIR"))
                    .join("../../data/mknap-12x3.txt"),
            ),
            iterations: 2,
            node_limit: 10,
            seed: None,
            clock: crate::cli::ClockArg::Wall,
            output: Some(output.clone()),
        };
        compare(&args).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "implementation,iterations,nodes,extraction.wall,extraction.cpu,episode.wall,episode.cpu"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("NodeBipartite,2,"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_registry_names_key_the_timers() {
        let mut registry: ExtractorRegistry<'_, Solver> = ExtractorRegistry::new();
        registry
            .register("sparse", sonde_observe::observation::NodeBipartite::new())
            .unwrap()
            .register("sparse_again", sonde_observe::observation::NodeBipartite::new())
            .unwrap();
        let model = KnapsackGenerator::new(KnapsackGeneratorConfig::default(), DEFAULT_EPISODE_SEED)
            .next()
            .unwrap()
            .unwrap();
        let mut solver = Solver::new(model, SolverSettings::reproducible(DEFAULT_EPISODE_SEED, 5));
        let record = timed_episode(&mut registry, &mut solver, ClockSelection::Wall).unwrap();
        assert!(matches!(record.information.get("sparse"), Some(Metric::Timer(_))));
        assert!(matches!(record.information.get("sparse_again"), Some(Metric::Timer(_))));
        assert!(record.information.get("NodeBipartite").is_none());
    }

    #[test]
    fn test_missing_instance_file() {
        let args = CompareArgs {
            instance: Some("does/not/exist.txt".into()),
            iterations: 1,
            node_limit: 1,
            seed: Some(0),
            clock: crate::cli::ClockArg::Wall,
            output: None,
        };
        let err = compare(&args).unwrap_err();
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }
}
