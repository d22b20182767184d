//! Sum of Absolute Differences.
//!
//! Both kernels accumulate strictly left to right (`k = 0, 1, ...`) into a
//! single running sum. The slice kernel and the gather kernel therefore
//! produce bit-identical results for the same values, which is what makes
//! distances comparable across layouts without a tolerance.

/// SAD over two equal-length contiguous runs.
///
/// The loop body has no branches and no carried dependency other than the
/// running sum, so it autovectorizes well on the `abs`/`sub` part.
#[inline]
pub fn sad(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// SAD between `query` and a window read through `value(k)`.
///
/// `value(k)` must return the window element aligned with `query[k]`.
#[inline]
pub fn sad_with<F>(query: &[f64], value: F) -> f64
where
    F: Fn(usize) -> f64,
{
    query
        .iter()
        .enumerate()
        .map(|(k, q)| (value(k) - q).abs())
        .sum()
}
