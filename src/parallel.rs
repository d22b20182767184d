//! Fork-join substrate for the parallel search strategies.
//!
//! Every parallel region follows the same three phases:
//! 1. the index space is cut into ordered, disjoint, covering ranges;
//! 2. each range is processed by a worker into a private result, with no
//!    shared mutable state (output slices are split up front, so every slot
//!    has exactly one writer);
//! 3. the caller folds the returned results in range order.
//!
//! Phase 3 never depends on which worker finished first, so reductions are
//! deterministic for any thread count or scheduling.
//!
//! With the `parallel` feature disabled the same ranges are processed
//! serially, in order, and produce identical results.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;

/// Number of chunks per worker for [`Schedule::Dynamic`].
const DYNAMIC_OVERSUBSCRIPTION: usize = 4;

/// How a range of work items is divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// One contiguous range per worker with equal item counts.
    Static,
    /// Work-weighted ranges, several per worker, balanced by the work-stealing
    /// scheduler. Preferred when item costs vary (variable-length series).
    #[default]
    Dynamic,
}

impl Schedule {
    /// Partition `weights.len()` items for `workers` workers.
    pub fn partition(&self, weights: &[usize], workers: usize) -> Vec<Range<usize>> {
        match self {
            Schedule::Static => partition_even(weights.len(), workers),
            Schedule::Dynamic => {
                partition_weighted(weights, workers.saturating_mul(DYNAMIC_OVERSUBSCRIPTION))
            }
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Static => write!(f, "static"),
            Schedule::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Split `0..n` into at most `chunks` contiguous ranges whose sizes differ by
/// at most one.
pub fn partition_even(n: usize, chunks: usize) -> Vec<Range<usize>> {
    if n == 0 || chunks == 0 {
        return vec![];
    }
    let chunks = chunks.min(n);
    let base = n / chunks;
    let extra = n % chunks;

    let mut ranges = Vec::with_capacity(chunks);
    let mut start = 0;
    for c in 0..chunks {
        let len = base + usize::from(c < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Split `0..weights.len()` into at most `chunks` contiguous ranges of
/// approximately equal total weight.
///
/// Chunk boundaries are found by binary search over the cumulative weight,
/// so a single heavy item may end up alone in its range while many light
/// items share one. Falls back to [`partition_even`] when all weights are 0.
pub fn partition_weighted(weights: &[usize], chunks: usize) -> Vec<Range<usize>> {
    let n = weights.len();
    if n == 0 || chunks == 0 {
        return vec![];
    }
    let chunks = chunks.min(n);

    // cumwork[i] = total weight of the first i items
    let mut cumwork = Vec::with_capacity(n + 1);
    cumwork.push(0usize);
    for &w in weights {
        let last = cumwork[cumwork.len() - 1];
        cumwork.push(last + w);
    }
    let total = cumwork[n];
    if total == 0 {
        return partition_even(n, chunks);
    }

    let mut ranges = Vec::with_capacity(chunks);
    let mut prev = 0usize;
    for c in 1..=chunks {
        let target = if c == chunks {
            n
        } else {
            let threshold = (c as f64 * total as f64 / chunks as f64).round() as usize;
            prev + cumwork[prev..=n].partition_point(|&w| w < threshold)
        };
        if target > prev {
            ranges.push(prev..target);
            prev = target;
        }
    }
    ranges
}

/// Split `out` into consecutive mutable slices matching `ranges`.
///
/// # Panics
/// Panics if the ranges are not contiguous from 0 or run past `out`.
fn split_by_ranges<'a, E>(out: &'a mut [E], ranges: &[Range<usize>]) -> Vec<&'a mut [E]> {
    let mut rest = out;
    let mut offset = 0;
    let mut parts = Vec::with_capacity(ranges.len());
    for r in ranges {
        assert_eq!(r.start, offset, "ranges must be contiguous from 0");
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(r.len());
        parts.push(head);
        rest = tail;
        offset = r.end;
    }
    parts
}

/// A bounded pool of workers executing fork-join regions.
pub struct WorkerPool {
    threads: usize,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers; `None` uses the default degree
    /// (one per logical CPU, or `RAYON_NUM_THREADS`).
    #[cfg(feature = "parallel")]
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("sad-search-{i}"))
            .build()?;
        let threads = pool.current_num_threads();
        log::debug!("worker pool ready with {threads} threads");
        Ok(Self { threads, pool })
    }

    /// Without the `parallel` feature the pool runs every region inline; the
    /// requested degree is still used for partitioning.
    #[cfg(not(feature = "parallel"))]
    pub fn new(threads: Option<usize>) -> Result<Self> {
        Ok(Self {
            threads: threads.unwrap_or(1).max(1),
        })
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` inside the pool, so nested parallel iterators use its workers.
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        #[cfg(feature = "parallel")]
        {
            self.pool.install(f)
        }
        #[cfg(not(feature = "parallel"))]
        {
            f()
        }
    }

    /// Apply `f` to every range, returning the results in range order.
    pub fn map_ranges<T, F>(&self, ranges: &[Range<usize>], f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.pool
                .install(|| ranges.par_iter().map(|r| f(r.clone())).collect())
        }
        #[cfg(not(feature = "parallel"))]
        {
            ranges.iter().map(|r| f(r.clone())).collect()
        }
    }

    /// Like [`map_ranges`](Self::map_ranges), but each call also receives
    /// exclusive access to `out[range]`.
    ///
    /// `ranges` must be contiguous from 0 and cover `out`.
    pub fn map_ranges_mut<E, T, F>(&self, ranges: &[Range<usize>], out: &mut [E], f: F) -> Vec<T>
    where
        E: Send,
        T: Send,
        F: Fn(Range<usize>, &mut [E]) -> T + Sync + Send,
    {
        let parts = split_by_ranges(out, ranges);
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.pool.install(|| {
                ranges
                    .par_iter()
                    .zip(parts.into_par_iter())
                    .map(|(r, part)| f(r.clone(), part))
                    .collect()
            })
        }
        #[cfg(not(feature = "parallel"))]
        {
            ranges
                .iter()
                .zip(parts)
                .map(|(r, part)| f(r.clone(), part))
                .collect()
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covering(ranges: &[Range<usize>], n: usize) {
        let mut next = 0;
        for r in ranges {
            assert_eq!(r.start, next, "ranges must be contiguous: {ranges:?}");
            assert!(r.end > r.start, "empty range in {ranges:?}");
            next = r.end;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn test_partition_even() {
        let ranges = partition_even(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
        assert_covering(&partition_even(5, 8), 5);
        assert_eq!(partition_even(5, 8).len(), 5);
        assert!(partition_even(0, 4).is_empty());
        assert!(partition_even(4, 0).is_empty());
    }

    #[test]
    fn test_partition_weighted_balances_work() {
        // One heavy item followed by many light ones
        let mut weights = vec![100];
        weights.extend(std::iter::repeat(1).take(100));
        let ranges = partition_weighted(&weights, 2);
        assert_covering(&ranges, weights.len());
        assert_eq!(ranges[0], 0..1);
    }

    #[test]
    fn test_partition_weighted_zero_weights() {
        let ranges = partition_weighted(&[0, 0, 0, 0], 2);
        assert_eq!(ranges, vec![0..2, 2..4]);
    }

    #[test]
    fn test_partition_weighted_covers() {
        let weights: Vec<usize> = (0..97).map(|i| (i * 7919) % 13).collect();
        for chunks in [1, 2, 3, 8, 200] {
            assert_covering(&partition_weighted(&weights, chunks), weights.len());
        }
    }

    #[test]
    fn test_schedule_partition() {
        let weights = vec![1; 16];
        assert_eq!(Schedule::Static.partition(&weights, 4).len(), 4);
        assert_eq!(Schedule::Dynamic.partition(&weights, 2).len(), 8);
    }

    #[test]
    fn test_map_ranges_preserves_order() {
        let pool = WorkerPool::new(Some(4)).unwrap();
        let ranges = partition_even(1000, 16);
        let sums = pool.map_ranges(&ranges, |r| r.sum::<usize>());
        let expected: Vec<usize> = ranges.iter().map(|r| r.clone().sum()).collect();
        assert_eq!(sums, expected);
    }

    #[test]
    fn test_map_ranges_mut_disjoint_writes() {
        let pool = WorkerPool::new(Some(3)).unwrap();
        let mut out = vec![0usize; 50];
        let ranges = partition_even(out.len(), 7);
        let lens = pool.map_ranges_mut(&ranges, &mut out, |r, part| {
            for (slot, i) in part.iter_mut().zip(r.clone()) {
                *slot = i * 2;
            }
            part.len()
        });
        assert_eq!(lens.iter().sum::<usize>(), 50);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(*v, i * 2);
        }
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn test_split_rejects_gaps() {
        let mut out = vec![0.0; 4];
        split_by_ranges(&mut out, &[0..1, 2..4]);
    }

    #[test]
    fn test_pool_threads() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        assert_eq!(pool.threads(), 2);
        assert_eq!(pool.install(|| 7), 7);
    }
}
