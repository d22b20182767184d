use std::ops::Range;

use crate::core::result::UNMATCHED;
use crate::core::store::SeriesStore;
use crate::parallel::{partition_even, WorkerPool};

/// Number of window start offsets for a series of length `len` against a
/// query of length `m` (0 when the series is too short).
#[inline]
pub fn window_count(len: usize, m: usize) -> usize {
    if len < m {
        0
    } else {
        len - m + 1
    }
}

/// Keeps the lower of two window distances, preferring `acc` on ties.
///
/// A NaN accumulator is replaced by anything, so the result is NaN only when
/// every window is NaN.
#[inline]
fn lower_sad(acc: f64, d: f64) -> f64 {
    if d < acc || acc.is_nan() {
        d
    } else {
        acc
    }
}

/// Minimum SAD of series `i` over the window starts in `offsets`, seeded
/// from the first window. `None` for an empty offset range.
#[inline]
fn min_over_offsets<S: SeriesStore>(
    store: &S,
    i: usize,
    query: &[f64],
    offsets: Range<usize>,
) -> Option<f64> {
    offsets
        .map(|j| store.window_sad(i, j, query))
        .reduce(lower_sad)
}

/// Minimal sliding-window SAD of series `i` against `query`.
///
/// - shorter than the query: [`UNMATCHED`]
/// - same length: one full-series SAD, no windowing
/// - longer: minimum over all `len - m + 1` window starts
///
/// Non-finite window sums are reported as computed (see
/// [`crate::core::result`]); only a too-short series yields [`UNMATCHED`].
pub fn min_window_sad<S: SeriesStore>(store: &S, i: usize, query: &[f64]) -> f64 {
    let len = store.len_of(i);
    let m = query.len();
    if len < m {
        return UNMATCHED;
    }
    if len == m {
        return store.window_sad(i, 0, query);
    }
    min_over_offsets(store, i, query, 0..window_count(len, m)).unwrap_or(UNMATCHED)
}

/// Offset-parallel version of [`min_window_sad`].
///
/// The window starts are split evenly across the pool (all windows cost the
/// same), each worker reduces its partition to a local minimum, and the
/// local minima are folded in partition order with the same rule.
/// Series with fewer than `min_parallel_windows` windows (and every series
/// whose window count is 1) take the sequential path.
pub fn min_window_sad_parallel<S: SeriesStore>(
    store: &S,
    i: usize,
    query: &[f64],
    pool: &WorkerPool,
    min_parallel_windows: usize,
) -> f64 {
    let n_windows = window_count(store.len_of(i), query.len());
    if n_windows < 2 || n_windows < min_parallel_windows || pool.threads() < 2 {
        return min_window_sad(store, i, query);
    }

    let ranges = partition_even(n_windows, pool.threads());
    let local_minima = pool.map_ranges(&ranges, |offsets| {
        min_over_offsets(store, i, query, offsets)
    });

    local_minima
        .into_iter()
        .flatten()
        .reduce(lower_sad)
        .unwrap_or(UNMATCHED)
}
