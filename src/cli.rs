//! Command line interface for the `sad-search` binary.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;

use crate::bench::{generate_dataset, generate_series, run_suite, run_sweep};
use crate::core::config::SearchConfig;
use crate::core::result::BestMatch;
use crate::core::store::{build_store, Layout};
use crate::io::{load_query_csv, load_series_csv, write_series_csv};
use crate::parallel::Schedule;
use crate::{SearchEngine, Strategy};

/// Exhaustive SAD sliding-window search over time series collections
#[derive(Parser, Debug, Clone)]
#[command(name = "sad-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CliArgs {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Worker-pool size for the parallel strategies (default: one per CPU)
    #[arg(short = 't', long, env = "SAD_SEARCH_THREADS", global = true)]
    pub threads: Option<usize>,

    /// Partitioning of the series range for the outer strategy
    #[arg(long, value_enum, default_value = "dynamic", global = true)]
    pub schedule: ScheduleArg,

    /// Minimum window count before the inner strategy splits a series
    #[arg(long, default_value_t = 2, global = true)]
    pub min_parallel_windows: usize,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Effective verbosity (0 = errors only, 1 = warnings, 2 = info, ...).
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threads: self.threads,
            schedule: self.schedule.into(),
            min_parallel_windows: self.min_parallel_windows,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Find the best-matching series for a query
    Search(SearchArgs),
    /// Time all six layout/strategy variants and write a JSON report
    Bench(BenchArgs),
    /// Write a synthetic dataset and query
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Dataset file, one comma-separated series per line
    #[arg(long)]
    pub dataset: PathBuf,

    /// Query file (first line is used)
    #[arg(long)]
    pub query: PathBuf,

    #[arg(long, value_enum, default_value = "row-major")]
    pub layout: LayoutArg,

    #[arg(long, value_enum, default_value = "sequential")]
    pub strategy: StrategyArg,

    /// Also list the closest N series
    #[arg(long)]
    pub top: Option<usize>,

    /// Include the full distance vector in the output
    #[arg(long)]
    pub distances: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long)]
    pub query: PathBuf,

    /// Timed runs per variant
    #[arg(long, default_value_t = 10)]
    pub runs: usize,

    /// Repeat the suite for each pool size, e.g. `1,2,4,8` (overrides --threads)
    #[arg(long, value_delimiter = ',')]
    pub threads_list: Vec<usize>,

    /// Report path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long)]
    pub num_series: usize,

    #[arg(long)]
    pub length: usize,

    #[arg(long)]
    pub query_length: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long)]
    pub query: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
    RowMajor,
    ColumnMajor,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::RowMajor => Layout::RowMajor,
            LayoutArg::ColumnMajor => Layout::ColumnMajor,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Sequential,
    Outer,
    Inner,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Outer => Strategy::ParallelOuter,
            StrategyArg::Inner => Strategy::ParallelInner,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleArg {
    Static,
    Dynamic,
}

impl From<ScheduleArg> for Schedule {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Static => Schedule::Static,
            ScheduleArg::Dynamic => Schedule::Dynamic,
        }
    }
}

#[derive(Serialize)]
struct SearchOutput {
    layout: Layout,
    strategy: Strategy,
    num_series: usize,
    query_length: usize,
    matched: usize,
    best: Option<BestMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<Vec<BestMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distances: Option<Vec<f64>>,
}

/// Run the parsed command.
pub fn execute(args: CliArgs) -> anyhow::Result<()> {
    let config = args.search_config();
    match args.command {
        Command::Search(cmd) => run_search(config, cmd),
        Command::Bench(cmd) => run_bench(config, cmd),
        Command::Generate(cmd) => run_generate(cmd),
    }
}

fn run_search(config: SearchConfig, args: SearchArgs) -> anyhow::Result<()> {
    let series = load_series_csv(&args.dataset)
        .with_context(|| format!("loading dataset {}", args.dataset.display()))?;
    let query = load_query_csv(&args.query)
        .with_context(|| format!("loading query {}", args.query.display()))?;

    let layout: Layout = args.layout.into();
    let strategy: Strategy = args.strategy.into();
    let store = build_store(layout, &series);
    let engine = SearchEngine::new(config)?;
    let result = engine.search_any(&store, &query, strategy)?;

    let output = SearchOutput {
        layout,
        strategy,
        num_series: result.distances.len(),
        query_length: query.len(),
        matched: result.matched_count(),
        best: result.best,
        top: args.top.map(|k| result.top_k(k)),
        distances: args.distances.then(|| result.distances.clone()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_bench(config: SearchConfig, args: BenchArgs) -> anyhow::Result<()> {
    let series = load_series_csv(&args.dataset)
        .with_context(|| format!("loading dataset {}", args.dataset.display()))?;
    let query = load_query_csv(&args.query)
        .with_context(|| format!("loading query {}", args.query.display()))?;

    let (json, all_match) = if args.threads_list.is_empty() {
        let engine = SearchEngine::new(config)?;
        info!(
            "benchmarking {} series, query length {}, {} runs, {} threads",
            series.len(),
            query.len(),
            args.runs,
            engine.threads()
        );
        let report = run_suite(&engine, &series, &query, args.runs)?;
        (serde_json::to_string_pretty(&report)?, report.all_match())
    } else {
        info!(
            "benchmarking {} series, query length {}, {} runs, threads {:?}",
            series.len(),
            query.len(),
            args.runs,
            args.threads_list
        );
        let report = run_sweep(&config, &args.threads_list, &series, &query, args.runs)?;
        (serde_json::to_string_pretty(&report)?, report.all_match())
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, json)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if !all_match {
        anyhow::bail!("some variants disagree with the sequential row-major reference");
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    use rand::SeedableRng;

    let series = generate_dataset(args.num_series, args.length, args.seed);
    // Query drawn from its own stream so it does not repeat any series
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed.wrapping_add(1));
    let query = generate_series(&mut rng, args.query_length);

    for path in [&args.dataset, &args.query] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
    }
    write_series_csv(&args.dataset, &series)?;
    write_series_csv(&args.query, &[query])?;
    info!(
        "wrote {} series of length {} to {}",
        series.len(),
        args.length,
        args.dataset.display()
    );
    Ok(())
}
