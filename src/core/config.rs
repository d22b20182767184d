use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SearchError};
use crate::parallel::Schedule;

/// Configuration for a [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Worker-pool size. `None` uses one worker per logical CPU.
    pub threads: Option<usize>,
    /// Partitioning of the series range for the outer strategy.
    pub schedule: Schedule,
    /// Minimum number of window offsets before the inner strategy splits a
    /// series across workers. Series with fewer windows are scanned inline.
    pub min_parallel_windows: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: None,
            schedule: Schedule::Dynamic,
            min_parallel_windows: 2,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_min_parallel_windows(mut self, windows: usize) -> Self {
        self.min_parallel_windows = windows;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(SearchError::invalid_config("threads must be at least 1"));
        }
        if self.min_parallel_windows == 0 {
            return Err(SearchError::invalid_config(
                "min_parallel_windows must be at least 1",
            ));
        }
        Ok(())
    }
}
