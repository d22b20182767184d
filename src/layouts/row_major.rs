use crate::algorithms::sad::sad;
use crate::core::store::{Layout, SeriesStore};

/// Row-major (array-of-structs) collection: each series is its own
/// contiguous array, so lengths may differ freely across series.
///
/// Every window of series `i` is a plain subslice, which lets the SAD kernel
/// run over contiguous memory.
#[derive(Debug, Clone, Default)]
pub struct RowMajorStore {
    rows: Vec<Box<[f64]>>,
}

impl RowMajorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contiguous values of series `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.num_series()`.
    #[inline]
    pub fn series(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }
}

impl SeriesStore for RowMajorStore {
    const LAYOUT: Layout = Layout::RowMajor;

    #[inline]
    fn num_series(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    fn len_of(&self, i: usize) -> usize {
        self.rows[i].len()
    }

    #[inline]
    fn value_at(&self, i: usize, t: usize) -> f64 {
        self.rows[i][t]
    }

    fn add_series(&mut self, values: &[f64]) {
        self.rows.push(values.into());
    }

    #[inline]
    fn window_sad(&self, i: usize, start: usize, query: &[f64]) -> f64 {
        sad(&self.rows[i][start..start + query.len()], query)
    }
}
