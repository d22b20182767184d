use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithms::sad::sad_with;
use crate::core::series::Series;
use crate::layouts::column_major::ColumnMajorStore;
use crate::layouts::row_major::RowMajorStore;

/// Capability contract shared by the collection backends.
///
/// Designed for static polymorphism: search routines are generic over
/// `S: SeriesStore`, so each layout gets its own monomorphized hot loop and
/// no virtual call sits between the window scan and the data.
///
/// A store is built once by repeated [`add_series`](SeriesStore::add_series)
/// and is read-only afterwards. Reads must stay within `0..len_of(i)`.
pub trait SeriesStore: Default + Send + Sync {
    /// Physical layout of this backend.
    const LAYOUT: Layout;

    /// Number of series in the collection.
    fn num_series(&self) -> usize;

    /// True length of series `i`.
    fn len_of(&self, i: usize) -> usize;

    /// Value of series `i` at time offset `t`, for `t < len_of(i)`.
    fn value_at(&self, i: usize, t: usize) -> f64;

    /// Append a series. There is no removal or mutation API.
    fn add_series(&mut self, values: &[f64]);

    /// SAD between `query` and series `i` at window start `start`.
    ///
    /// The caller guarantees `start + query.len() <= len_of(i)`. The default
    /// gathers values through `value_at` in increasing offset order; backends
    /// with contiguous rows override it with a slice kernel that sums in the
    /// same order, so every layout yields bit-identical distances.
    #[inline]
    fn window_sad(&self, i: usize, start: usize, query: &[f64]) -> f64 {
        debug_assert!(start + query.len() <= self.len_of(i));
        sad_with(query, |k| self.value_at(i, start + k))
    }

    fn is_empty(&self) -> bool {
        self.num_series() == 0
    }

    /// Length of the longest series (0 for an empty store).
    fn max_len(&self) -> usize {
        (0..self.num_series())
            .map(|i| self.len_of(i))
            .max()
            .unwrap_or(0)
    }

    /// Build a store by appending every series in order.
    fn from_series<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let mut store = Self::default();
        for s in series {
            store.add_series(s.values());
        }
        store
    }
}

/// Physical data layout of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One contiguous array per series (AoS).
    RowMajor,
    /// One array per time offset across all series (SoA).
    ColumnMajor,
}

impl Layout {
    pub const ALL: [Layout; 2] = [Layout::RowMajor, Layout::ColumnMajor];

    /// Short label used in benchmark reports.
    pub fn short_name(&self) -> &'static str {
        match self {
            Layout::RowMajor => "aos",
            Layout::ColumnMajor => "soa",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::RowMajor => write!(f, "row-major"),
            Layout::ColumnMajor => write!(f, "column-major"),
        }
    }
}

/// A store whose layout is chosen at runtime.
///
/// Dispatch happens once per search call by matching on the variant; the
/// search itself then runs on the concrete backend type.
#[derive(Debug, Clone)]
pub enum AnyStore {
    RowMajor(RowMajorStore),
    ColumnMajor(ColumnMajorStore),
}

impl AnyStore {
    pub fn layout(&self) -> Layout {
        match self {
            AnyStore::RowMajor(_) => Layout::RowMajor,
            AnyStore::ColumnMajor(_) => Layout::ColumnMajor,
        }
    }

    pub fn num_series(&self) -> usize {
        match self {
            AnyStore::RowMajor(s) => s.num_series(),
            AnyStore::ColumnMajor(s) => s.num_series(),
        }
    }

    pub fn len_of(&self, i: usize) -> usize {
        match self {
            AnyStore::RowMajor(s) => s.len_of(i),
            AnyStore::ColumnMajor(s) => s.len_of(i),
        }
    }

    pub fn max_len(&self) -> usize {
        match self {
            AnyStore::RowMajor(s) => s.max_len(),
            AnyStore::ColumnMajor(s) => s.max_len(),
        }
    }
}

/// Build a populated store in the requested layout.
pub fn build_store(layout: Layout, series: &[Series]) -> AnyStore {
    match layout {
        Layout::RowMajor => AnyStore::RowMajor(RowMajorStore::from_series(series)),
        Layout::ColumnMajor => AnyStore::ColumnMajor(ColumnMajorStore::from_series(series)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Series> {
        vec![
            Series::new(vec![4.0, 5.0, 6.0]),
            Series::new(vec![1.0]),
            Series::new(vec![1.0, 2.0, 3.0, 9.0, -1.5]),
            Series::new(vec![]),
        ]
    }

    #[test]
    fn test_build_store_layouts() {
        let series = sample();
        for layout in Layout::ALL {
            let store = build_store(layout, &series);
            assert_eq!(store.layout(), layout);
            assert_eq!(store.num_series(), 4);
            assert_eq!(store.max_len(), 5);
            assert_eq!(store.len_of(1), 1);
            assert_eq!(store.len_of(3), 0);
        }
    }

    #[test]
    fn test_layouts_agree_on_every_valid_position() {
        let series = sample();
        let aos = RowMajorStore::from_series(&series);
        let soa = ColumnMajorStore::from_series(&series);
        assert_eq!(aos.num_series(), soa.num_series());
        for i in 0..aos.num_series() {
            assert_eq!(aos.len_of(i), soa.len_of(i));
            for t in 0..aos.len_of(i) {
                assert_eq!(aos.value_at(i, t).to_bits(), soa.value_at(i, t).to_bits());
            }
        }
    }

    #[test]
    fn test_window_sad_matches_default_gather() {
        let series = sample();
        let aos = RowMajorStore::from_series(&series);
        let soa = ColumnMajorStore::from_series(&series);
        let query = [1.5, 2.0];
        for start in 0..=3 {
            let a = aos.window_sad(2, start, &query);
            let b = soa.window_sad(2, start, &query);
            assert_eq!(a.to_bits(), b.to_bits(), "start {start}: {a} vs {b}");
        }
    }

    #[test]
    fn test_layout_names() {
        assert_eq!(Layout::RowMajor.short_name(), "aos");
        assert_eq!(Layout::ColumnMajor.short_name(), "soa");
        assert_eq!(Layout::ColumnMajor.to_string(), "column-major");
    }
}
