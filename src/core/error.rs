//! Error types for search, loading and benchmarking.

use std::io;

use thiserror::Error;

/// All failures surfaced by the crate.
///
/// Only `EmptyQuery` aborts a search call. A series shorter than the query is
/// not an error during the scan; it is recorded as unmatched and reported as
/// `SeriesTooShort` only when the caller asks for that series' distance.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query has zero length.
    #[error("query is empty")]
    EmptyQuery,

    /// The store holds no series, so there is no best match.
    #[error("collection has no series")]
    EmptyCollection,

    /// The series at `index` is shorter than the query and was excluded.
    #[error("series {index} is shorter than the query")]
    SeriesTooShort { index: usize },

    /// No series produced a ranked distance: all were shorter than the
    /// query or summed to NaN or infinity.
    #[error("no series matched the query")]
    NoMatch,

    /// A series index beyond the collection.
    #[error("series index {index} out of range (collection has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The worker pool could not be created.
    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// File access errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed delimited text.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A delimited-text token that is not a number.
    #[error("line {line}, column {column}: cannot parse {value:?} as a number")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    /// Report serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`SearchError`].
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Create a new configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SearchError::InvalidConfig(msg.into())
    }
}
