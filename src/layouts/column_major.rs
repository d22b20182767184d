use crate::algorithms::sad::sad_with;
use crate::core::store::{Layout, SeriesStore};

/// Column-major (struct-of-arrays) collection: one array per time offset,
/// holding the value of every series at that offset.
///
/// All columns are kept exactly `num_series()` wide. Appending a series
/// longer than any before it adds new columns, zero-filled for the earlier
/// series; appending a shorter one zero-fills its slot in the trailing
/// columns. True lengths are tracked separately, and every read is bounded
/// by them so the padding never reaches a distance computation.
#[derive(Debug, Clone, Default)]
pub struct ColumnMajorStore {
    time_points: Vec<Vec<f64>>,
    lengths: Vec<usize>,
}

impl ColumnMajorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of time-offset columns (the longest series length).
    pub fn num_time_points(&self) -> usize {
        self.time_points.len()
    }

    /// Values of every series at offset `t`, padding included.
    ///
    /// # Panics
    /// Panics if `t >= self.num_time_points()`.
    pub fn values_at_time(&self, t: usize) -> &[f64] {
        &self.time_points[t]
    }

    /// Copy series `i` back out of the columns.
    pub fn gather_series(&self, i: usize) -> Vec<f64> {
        (0..self.lengths[i])
            .map(|t| self.time_points[t][i])
            .collect()
    }
}

impl SeriesStore for ColumnMajorStore {
    const LAYOUT: Layout = Layout::ColumnMajor;

    #[inline]
    fn num_series(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    fn len_of(&self, i: usize) -> usize {
        self.lengths[i]
    }

    /// Returns `0.0` for any offset at or beyond the series' true length.
    #[inline]
    fn value_at(&self, i: usize, t: usize) -> f64 {
        if t >= self.lengths[i] {
            return 0.0;
        }
        self.time_points[t][i]
    }

    fn add_series(&mut self, values: &[f64]) {
        let existing = self.lengths.len();
        if values.len() > self.time_points.len() {
            self.time_points
                .resize_with(values.len(), || vec![0.0; existing]);
        }
        for (t, column) in self.time_points.iter_mut().enumerate() {
            column.push(values.get(t).copied().unwrap_or(0.0));
        }
        self.lengths.push(values.len());
    }

    #[inline]
    fn window_sad(&self, i: usize, start: usize, query: &[f64]) -> f64 {
        debug_assert!(start + query.len() <= self.lengths[i]);
        sad_with(query, |k| self.time_points[start + k][i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_major_grows_columns() {
        let mut store = ColumnMajorStore::new();
        store.add_series(&[1.0, 2.0]);
        store.add_series(&[3.0, 4.0, 5.0, 6.0]);

        assert_eq!(store.num_series(), 2);
        assert_eq!(store.num_time_points(), 4);
        // Earlier series padded in the new columns
        assert_eq!(store.values_at_time(3), &[0.0, 6.0]);
        assert_eq!(store.values_at_time(0), &[1.0, 3.0]);
        assert_eq!(store.gather_series(0), vec![1.0, 2.0]);
        assert_eq!(store.gather_series(1), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_column_major_pads_short_series() {
        let mut store = ColumnMajorStore::new();
        store.add_series(&[1.0, 2.0, 3.0]);
        store.add_series(&[9.0]);
        store.add_series(&[]);

        for t in 0..store.num_time_points() {
            assert_eq!(store.values_at_time(t).len(), 3);
        }
        assert_eq!(store.len_of(1), 1);
        assert_eq!(store.len_of(2), 0);
        assert!((store.value_at(1, 0) - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_column_major_padding_reads_zero() {
        let mut store = ColumnMajorStore::new();
        store.add_series(&[5.0]);
        store.add_series(&[7.0, 8.0, 9.0]);
        assert_eq!(store.value_at(0, 1), 0.0);
        assert_eq!(store.value_at(0, 2), 0.0);
        // Beyond every column
        assert_eq!(store.value_at(1, 10), 0.0);
    }

    #[test]
    fn test_column_major_window_sad() {
        let mut store = ColumnMajorStore::new();
        store.add_series(&[4.0, 5.0, 6.0]);
        store.add_series(&[1.0, 2.0, 3.0, 9.0]);
        let d = store.window_sad(1, 1, &[1.0, 2.0, 3.0]);
        assert!((d - 8.0).abs() < 1e-10);
        let d = store.window_sad(0, 0, &[1.0, 2.0, 3.0]);
        assert!((d - 9.0).abs() < 1e-10);
    }
}
