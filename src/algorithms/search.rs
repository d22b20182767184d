use std::fmt;
use std::ops::Range;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::algorithms::window::{min_window_sad, min_window_sad_parallel, window_count};
use crate::core::config::SearchConfig;
use crate::core::error::{Result, SearchError};
use crate::core::result::{merge_best, BestMatch, MatchResult, UNMATCHED};
use crate::core::store::SeriesStore;
use crate::parallel::{Schedule, WorkerPool};

/// Execution strategy for a collection-level search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Single-threaded scan over series.
    Sequential,
    /// Series range partitioned across the worker pool.
    ParallelOuter,
    /// Series scanned in order, each series' window offsets partitioned
    /// across the worker pool.
    ParallelInner,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Sequential,
        Strategy::ParallelOuter,
        Strategy::ParallelInner,
    ];

    /// Label used in benchmark reports.
    pub fn short_name(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::ParallelOuter => "parallel_outer",
            Strategy::ParallelInner => "parallel_inner",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Scan the series in `range`, writing each minimal distance into `out`
/// (`out[k]` is series `range.start + k`) and returning the best candidate.
///
/// This is the one place where a per-series distance becomes a best-match
/// candidate, so every strategy applies the same exclusion and tie rules.
#[inline]
fn scan_range<S, F>(
    store: &S,
    query: &[f64],
    range: Range<usize>,
    out: &mut [f64],
    series_min: F,
) -> Option<BestMatch>
where
    S: SeriesStore,
    F: Fn(usize) -> f64,
{
    debug_assert_eq!(range.len(), out.len());
    let mut best = None;
    for (slot, i) in out.iter_mut().zip(range) {
        if store.len_of(i) < query.len() {
            trace!(
                "series {i} shorter than query ({} < {}), skipped",
                store.len_of(i),
                query.len()
            );
            *slot = UNMATCHED;
            continue;
        }
        let d = series_min(i);
        *slot = d;
        merge_best(&mut best, Some(BestMatch::new(i, d)));
    }
    best
}

/// Sequential search: one pass over the series in index order.
pub fn search_sequential<S: SeriesStore>(store: &S, query: &[f64]) -> MatchResult {
    let n = store.num_series();
    let mut distances = vec![UNMATCHED; n];
    let best = scan_range(store, query, 0..n, &mut distances, |i| {
        min_window_sad(store, i, query)
    });
    MatchResult::new(distances, best)
}

/// Outer-parallel search: the series range is partitioned by `schedule`,
/// each worker fills its own disjoint slice of the distance vector and keeps
/// a private best, and the private bests are merged in partition order.
pub fn search_parallel_outer<S: SeriesStore>(
    store: &S,
    query: &[f64],
    pool: &WorkerPool,
    schedule: Schedule,
) -> MatchResult {
    let n = store.num_series();
    let m = query.len();
    let weights: Vec<usize> = (0..n).map(|i| window_count(store.len_of(i), m)).collect();
    let ranges = schedule.partition(&weights, pool.threads());

    let mut distances = vec![UNMATCHED; n];
    let local_bests = pool.map_ranges_mut(&ranges, &mut distances, |range, out| {
        scan_range(store, query, range, out, |i| min_window_sad(store, i, query))
    });

    let mut best = None;
    for candidate in local_bests {
        merge_best(&mut best, candidate);
    }
    MatchResult::new(distances, best)
}

/// Inner-parallel search: series are visited sequentially, and each series
/// with enough windows has its offsets reduced in parallel.
pub fn search_parallel_inner<S: SeriesStore>(
    store: &S,
    query: &[f64],
    pool: &WorkerPool,
    min_parallel_windows: usize,
) -> MatchResult {
    let n = store.num_series();
    let mut distances = vec![UNMATCHED; n];
    let best = scan_range(store, query, 0..n, &mut distances, |i| {
        min_window_sad_parallel(store, i, query, pool, min_parallel_windows)
    });
    MatchResult::new(distances, best)
}

/// Run `strategy` over `store`.
///
/// An empty query is an error. An empty store yields an empty distance
/// vector and no best match (see [`MatchResult::best_match`]).
pub fn search<S: SeriesStore>(
    store: &S,
    query: &[f64],
    strategy: Strategy,
    pool: &WorkerPool,
    config: &SearchConfig,
) -> Result<MatchResult> {
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    if store.is_empty() {
        warn!("search over an empty {} collection", S::LAYOUT);
        return Ok(MatchResult::empty());
    }

    debug!(
        "{strategy} search: layout={}, series={}, query_len={}, threads={}",
        S::LAYOUT,
        store.num_series(),
        query.len(),
        pool.threads()
    );

    let result = match strategy {
        Strategy::Sequential => search_sequential(store, query),
        Strategy::ParallelOuter => search_parallel_outer(store, query, pool, config.schedule),
        Strategy::ParallelInner => {
            search_parallel_inner(store, query, pool, config.min_parallel_windows)
        }
    };

    match result.best {
        Some(b) => debug!("best match: series {} at distance {}", b.index, b.distance),
        None => debug!("no ranked match for a query of length {}", query.len()),
    }
    Ok(result)
}
