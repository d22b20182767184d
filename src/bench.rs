//! Repeated-run timing of the six layout/strategy variants.
//!
//! A suite builds both stores from the same series, uses the row-major
//! sequential search as the reference result, and records for every variant
//! the per-run wall times, summary statistics, and whether its output agrees
//! with the reference.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::algorithms::search::Strategy;
use crate::core::config::SearchConfig;
use crate::core::error::{Result, SearchError};
use crate::core::result::MatchResult;
use crate::core::series::Series;
use crate::core::store::{build_store, Layout};
use crate::parallel::Schedule;
use crate::SearchEngine;

/// Tolerance used when comparing a variant against the reference.
pub const AGREEMENT_EPSILON: f64 = 1e-9;

/// One of the six layout/strategy combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub layout: Layout,
    pub strategy: Strategy,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::new(Layout::ColumnMajor, Strategy::Sequential),
        Variant::new(Layout::ColumnMajor, Strategy::ParallelOuter),
        Variant::new(Layout::ColumnMajor, Strategy::ParallelInner),
        Variant::new(Layout::RowMajor, Strategy::Sequential),
        Variant::new(Layout::RowMajor, Strategy::ParallelOuter),
        Variant::new(Layout::RowMajor, Strategy::ParallelInner),
    ];

    pub const fn new(layout: Layout, strategy: Strategy) -> Self {
        Self { layout, strategy }
    }

    /// Report name, e.g. `soa_parallel_outer`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.layout.short_name(), self.strategy.short_name())
    }
}

/// Summary statistics over repeated timings, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub mean_ms: f64,
    /// Population standard deviation.
    pub std_deviation_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl RunStats {
    /// All fields are zero for an empty sample.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean_ms: mean,
            std_deviation_ms: var.sqrt(),
            min_ms: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Call `f` `num_runs` times, returning each run's wall time in milliseconds
/// and the last run's output.
pub fn time_runs<T, F>(num_runs: usize, mut f: F) -> Result<(Vec<f64>, T)>
where
    F: FnMut() -> Result<T>,
{
    if num_runs == 0 {
        return Err(SearchError::invalid_config("num_runs must be at least 1"));
    }
    let mut times = Vec::with_capacity(num_runs);
    let mut last = None;
    for _ in 0..num_runs {
        let start = Instant::now();
        let out = f()?;
        times.push(start.elapsed().as_secs_f64() * 1000.0);
        last = Some(out);
    }
    match last {
        Some(out) => Ok((times, out)),
        None => Err(SearchError::invalid_config("num_runs must be at least 1")),
    }
}

/// Timing and outcome of one variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantReport {
    pub name: String,
    pub layout: Layout,
    pub strategy: Strategy,
    pub threads: usize,
    pub num_series: usize,
    /// Longest series length.
    pub series_length: usize,
    pub query_length: usize,
    pub num_runs: usize,
    pub execution_times_ms: Vec<f64>,
    pub stats: RunStats,
    pub best_match_index: Option<usize>,
    pub best_sad_value: Option<f64>,
    pub results_match_reference: bool,
}

/// Parameters a suite ran with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfiguration {
    pub num_series: usize,
    pub series_length: usize,
    pub query_length: usize,
    pub num_runs: usize,
    pub threads: usize,
    pub schedule: Schedule,
}

/// Full benchmark output for one dataset/query pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub configuration: SuiteConfiguration,
    pub variants: Vec<VariantReport>,
    /// Ratios of mean times; `None` when the denominator is zero.
    ///
    /// `{layout}_outer_speedup` / `{layout}_inner_speedup`: sequential over
    /// parallel for that layout. `soa_vs_aos_{strategy}`: row-major over
    /// column-major for that strategy (above 1 means column-major is faster).
    pub speedups: BTreeMap<String, Option<f64>>,
}

impl SuiteReport {
    pub fn variant(&self, variant: Variant) -> Option<&VariantReport> {
        self.variants
            .iter()
            .find(|r| r.layout == variant.layout && r.strategy == variant.strategy)
    }

    /// Whether every variant agreed with the reference.
    pub fn all_match(&self) -> bool {
        self.variants.iter().all(|r| r.results_match_reference)
    }

    fn mean_of(&self, layout: Layout, strategy: Strategy) -> Option<f64> {
        self.variant(Variant::new(layout, strategy))
            .map(|r| r.stats.mean_ms)
    }

    fn compute_speedups(&mut self) {
        let ratio = |num: Option<f64>, den: Option<f64>| match (num, den) {
            (Some(n), Some(d)) if d > 0.0 => Some(n / d),
            _ => None,
        };
        for layout in Layout::ALL {
            let seq = self.mean_of(layout, Strategy::Sequential);
            let outer = self.mean_of(layout, Strategy::ParallelOuter);
            let inner = self.mean_of(layout, Strategy::ParallelInner);
            let prefix = layout.short_name();
            self.speedups
                .insert(format!("{prefix}_outer_speedup"), ratio(seq, outer));
            self.speedups
                .insert(format!("{prefix}_inner_speedup"), ratio(seq, inner));
        }
        for strategy in Strategy::ALL {
            let aos = self.mean_of(Layout::RowMajor, strategy);
            let soa = self.mean_of(Layout::ColumnMajor, strategy);
            self.speedups
                .insert(format!("soa_vs_aos_{}", strategy.short_name()), ratio(aos, soa));
        }
    }
}

/// Time all six variants on `series` / `query`.
pub fn run_suite(
    engine: &SearchEngine,
    series: &[Series],
    query: &[f64],
    num_runs: usize,
) -> Result<SuiteReport> {
    let row_major = build_store(Layout::RowMajor, series);
    let column_major = build_store(Layout::ColumnMajor, series);
    let reference: MatchResult =
        engine.search_any(&row_major, query, Strategy::Sequential)?;

    let series_length = row_major.max_len();
    let mut variants = Vec::with_capacity(Variant::ALL.len());
    for variant in Variant::ALL {
        let store = match variant.layout {
            Layout::RowMajor => &row_major,
            Layout::ColumnMajor => &column_major,
        };
        let (times, result) = time_runs(num_runs, || {
            engine.search_any(store, query, variant.strategy)
        })?;
        let stats = RunStats::from_samples(&times);
        let matches = result.agrees_with(&reference, AGREEMENT_EPSILON);
        info!(
            "{}: mean {:.3} ms (sd {:.3}), best {:?}, match={matches}",
            variant.name(),
            stats.mean_ms,
            stats.std_deviation_ms,
            result.best_index()
        );

        variants.push(VariantReport {
            name: variant.name(),
            layout: variant.layout,
            strategy: variant.strategy,
            threads: match variant.strategy {
                Strategy::Sequential => 1,
                _ => engine.threads(),
            },
            num_series: series.len(),
            series_length,
            query_length: query.len(),
            num_runs,
            execution_times_ms: times,
            stats,
            best_match_index: result.best_index(),
            best_sad_value: result.best.map(|b| b.distance),
            results_match_reference: matches,
        });
    }

    let mut report = SuiteReport {
        configuration: SuiteConfiguration {
            num_series: series.len(),
            series_length,
            query_length: query.len(),
            num_runs,
            threads: engine.threads(),
            schedule: engine.config().schedule,
        },
        variants,
        speedups: BTreeMap::new(),
    };
    report.compute_speedups();
    Ok(report)
}

/// Suites for one dataset/query pair at several pool sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub thread_counts: Vec<usize>,
    pub suites: Vec<SuiteReport>,
}

impl SweepReport {
    pub fn all_match(&self) -> bool {
        self.suites.iter().all(SuiteReport::all_match)
    }

    /// The suite that ran with `threads` workers.
    pub fn suite(&self, threads: usize) -> Option<&SuiteReport> {
        self.suites
            .iter()
            .find(|s| s.configuration.threads == threads)
    }
}

/// Run [`run_suite`] once per entry of `thread_counts`, each on its own
/// engine built from `config` with that pool size.
pub fn run_sweep(
    config: &SearchConfig,
    thread_counts: &[usize],
    series: &[Series],
    query: &[f64],
    num_runs: usize,
) -> Result<SweepReport> {
    if thread_counts.is_empty() {
        return Err(SearchError::invalid_config("thread sweep needs at least one count"));
    }
    let mut suites = Vec::with_capacity(thread_counts.len());
    for &threads in thread_counts {
        let engine = SearchEngine::new(config.clone().with_threads(threads))?;
        info!("suite with {threads} threads");
        suites.push(run_suite(&engine, series, query, num_runs)?);
    }
    Ok(SweepReport {
        thread_counts: thread_counts.to_vec(),
        suites,
    })
}

/// One synthetic hourly series: linear trend (slope 2 per 4 days from a
/// base of 100), weekly sinusoid of amplitude 20, Gaussian noise with
/// standard deviation 5.
pub fn generate_series<R: Rng>(rng: &mut R, length: usize) -> Series {
    const HOURS_PER_DAY: f64 = 24.0;
    let trend_unit = 4.0 * HOURS_PER_DAY;
    let period = 7.0 * HOURS_PER_DAY;
    let noise = Normal::new(0.0, 5.0).expect("valid distribution parameters");

    (0..length)
        .map(|t| {
            let t = t as f64;
            let trend = 100.0 + 2.0 * t / trend_unit;
            let season = 20.0 * (2.0 * PI * t / period).sin();
            trend + season + noise.sample(rng)
        })
        .collect()
}

/// `num_series` synthetic series of equal `length`, reproducible from `seed`.
pub fn generate_dataset(num_series: usize, length: usize, seed: u64) -> Vec<Series> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_series)
        .map(|_| generate_series(&mut rng, length))
        .collect()
}
