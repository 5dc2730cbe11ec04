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

//! Command line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use sonde_observe::clock::ClockSelection;
use std::path::PathBuf;

/// Benchmark node-level observation extractors on a step-wise branch-and-bound solver
#[derive(Parser, Debug)]
#[command(name = "sonde-bench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Time every standard extractor on generated instances, one CSV row per episode
    Episodes(EpisodesArgs),

    /// Run the benchmark harness on a single instance and print the report
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EpisodesArgs {
    /// Instances per generator
    #[arg(long, default_value_t = 100, value_parser = parse_positive_u64)]
    pub n_instances: u64,

    /// Nodes processed per episode at most
    #[arg(long, default_value_t = 100, value_parser = parse_positive_u64)]
    pub node_limit: u64,

    /// Seed of the generators and the solver [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Clocks read around every extraction
    #[arg(long, value_enum, default_value_t = ClockArg::Both)]
    pub clock: ClockArg,

    /// CSV output file (default: stdout)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Instance file (default: the first generated knapsack instance)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub instance: Option<PathBuf>,

    /// Episodes per extractor
    #[arg(long, default_value_t = 10, value_parser = parse_positive_u32)]
    pub iterations: u32,

    /// Nodes processed per episode at most
    #[arg(long, default_value_t = 10, value_parser = parse_positive_u64)]
    pub node_limit: u64,

    /// Solver seed [default: 784]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Clocks read around every extraction
    #[arg(long, value_enum, default_value_t = ClockArg::Both)]
    pub clock: ClockArg,

    /// Also write the report as CSV to this file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockArg {
    Wall,
    Cpu,
    Both,
}

impl From<ClockArg> for ClockSelection {
    fn from(value: ClockArg) -> Self {
        match value {
            ClockArg::Wall => ClockSelection::Wall,
            ClockArg::Cpu => ClockSelection::Cpu,
            ClockArg::Both => ClockSelection::Both,
        }
    }
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("`{s}` is not a non-negative integer: {e}")),
    }
}

fn parse_positive_u32(s: &str) -> Result<u32, String> {
    let n = parse_positive_u64(s)?;
    u32::try_from(n).map_err(|_| format!("must be at most {}", u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_episode_defaults() {
        let cli = Cli::try_parse_from(["sonde-bench", "episodes"]).unwrap();
        match cli.command {
            Commands::Episodes(args) => {
                assert_eq!(args.n_instances, 100);
                assert_eq!(args.node_limit, 100);
                assert_eq!(args.clock, ClockArg::Both);
                assert!(args.output.is_none());
                assert_eq!(args.seed, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_compare_flags() {
        let cli = Cli::try_parse_from([
            "sonde-bench", "-vv", "compare", "--iterations", "3", "--clock", "wall",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.iterations, 3);
                assert_eq!(args.seed, None);
                assert_eq!(ClockSelection::from(args.clock), ClockSelection::Wall);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_explicit_seed() {
        let cli = Cli::try_parse_from(["sonde-bench", "episodes", "--seed", "5"]).unwrap();
        match cli.command {
            Commands::Episodes(args) => assert_eq!(args.seed, Some(5)),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["sonde-bench", "compare", "--seed", "x"]).is_err());
    }

    #[test]
    fn test_counts_must_be_positive() {
        assert!(Cli::try_parse_from(["sonde-bench", "episodes", "--node-limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["sonde-bench", "compare", "--iterations", "-1"]).is_err());
        assert_eq!(parse_positive_u64("7"), Ok(7));
        assert!(parse_positive_u32("4294967296").is_err());
    }
}
