pub mod algorithms;
pub mod bench;
pub mod cli;
pub mod core;
pub mod io;
pub mod layouts;
pub mod parallel;

pub use crate::algorithms::sad::sad;
pub use crate::algorithms::search::{
    search_parallel_inner, search_parallel_outer, search_sequential, Strategy,
};
pub use crate::core::config::SearchConfig;
pub use crate::core::error::{Result, SearchError};
pub use crate::core::result::{is_ranked, BestMatch, MatchResult, UNMATCHED};
pub use crate::core::series::Series;
pub use crate::core::store::{build_store, AnyStore, Layout, SeriesStore};
pub use crate::layouts::column_major::ColumnMajorStore;
pub use crate::layouts::row_major::RowMajorStore;
pub use crate::parallel::{Schedule, WorkerPool};

/// High-level facade owning a worker pool, generic over the store layout at
/// each call.
///
/// # Examples
///
/// ```
/// use sad_search::{build_store, Layout, SearchConfig, SearchEngine, Series, Strategy};
///
/// let series = vec![
///     Series::new(vec![4.0, 5.0, 6.0]),
///     Series::new(vec![1.0, 2.0, 3.0]),
///     Series::new(vec![1.0, 2.0, 3.0, 9.0]),
/// ];
/// let store = build_store(Layout::ColumnMajor, &series);
/// let engine = SearchEngine::new(SearchConfig::default().with_threads(2)).unwrap();
/// let result = engine
///     .search_any(&store, &[1.0, 2.0, 3.0], Strategy::ParallelOuter)
///     .unwrap();
/// assert_eq!(result.distances, vec![9.0, 0.0, 0.0]);
/// assert_eq!(result.best_index(), Some(1));
/// ```
#[derive(Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    pool: WorkerPool,
}

impl SearchEngine {
    /// Validate `config` and start its worker pool.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.threads)?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of workers used by the parallel strategies.
    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    /// Search a store of statically known layout.
    pub fn search<S: SeriesStore>(
        &self,
        store: &S,
        query: &[f64],
        strategy: Strategy,
    ) -> Result<MatchResult> {
        algorithms::search::search(store, query, strategy, &self.pool, &self.config)
    }

    /// Search a store whose layout was chosen at runtime.
    ///
    /// The layout is matched once here; the scan itself is monomorphized.
    pub fn search_any(
        &self,
        store: &AnyStore,
        query: &[f64],
        strategy: Strategy,
    ) -> Result<MatchResult> {
        match store {
            AnyStore::RowMajor(s) => self.search(s, query, strategy),
            AnyStore::ColumnMajor(s) => self.search(s, query, strategy),
        }
    }
}
