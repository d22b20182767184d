//! Search results and the ranking policy shared by every strategy.
//!
//! A per-series distance is stored exactly as computed. Only distances below
//! [`UNMATCHED`] are ranked: NaN, infinite sums and unmatched slots stay in
//! the distance vector but never become the best match or appear in
//! [`MatchResult::top_k`]. A NaN or infinite distance still belongs to a
//! matched series, so [`MatchResult::distance_of`] returns it unchanged.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SearchError};

/// Distance recorded for a series shorter than the query.
pub const UNMATCHED: f64 = f64::MAX;

/// Whether `distance` takes part in ranking (see the module docs).
#[inline]
pub fn is_ranked(distance: f64) -> bool {
    distance < UNMATCHED
}

/// The winning series of a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    /// Index of the series in the store.
    pub index: usize,
    /// Its minimal sliding-window SAD against the query.
    pub distance: f64,
}

impl BestMatch {
    pub fn new(index: usize, distance: f64) -> Self {
        Self { index, distance }
    }

    /// Lexicographic `(distance, index)` order: a smaller distance wins, and
    /// among exactly equal distances the lower series index wins.
    ///
    /// NaN distances compare as `None` and never win.
    pub fn cmp_key(&self, other: &Self) -> Option<Ordering> {
        match self.distance.partial_cmp(&other.distance)? {
            Ordering::Equal => Some(self.index.cmp(&other.index)),
            ord => Some(ord),
        }
    }

    /// Whether `self` should replace `other` as the running best.
    #[inline]
    pub fn improves_on(&self, other: &Self) -> bool {
        self.cmp_key(other) == Some(Ordering::Less)
    }
}

/// Fold `candidate` into the running best, keeping the lexicographic winner.
///
/// Used by every strategy, both for the per-series scan and for the ordered
/// merge of per-worker candidates. Candidates failing [`is_ranked`] are
/// never accepted.
#[inline]
pub fn merge_best(best: &mut Option<BestMatch>, candidate: Option<BestMatch>) {
    if let Some(c) = candidate.filter(|c| is_ranked(c.distance)) {
        let replace = match *best {
            Some(b) => c.improves_on(&b),
            None => true,
        };
        if replace {
            *best = Some(c);
        }
    }
}

/// Output of a search call: one distance per series plus the best match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Minimal SAD per series index; [`UNMATCHED`] for series shorter than
    /// the query.
    pub distances: Vec<f64>,
    /// `None` when the store is empty or no series qualifies.
    pub best: Option<BestMatch>,
}

impl MatchResult {
    pub fn new(distances: Vec<f64>, best: Option<BestMatch>) -> Self {
        Self { distances, best }
    }

    /// Result for a store with no series.
    pub fn empty() -> Self {
        Self {
            distances: Vec::new(),
            best: None,
        }
    }

    pub fn best_index(&self) -> Option<usize> {
        self.best.map(|b| b.index)
    }

    /// The best match, or the reason there is none.
    pub fn best_match(&self) -> Result<BestMatch> {
        match self.best {
            Some(b) => Ok(b),
            None if self.distances.is_empty() => Err(SearchError::EmptyCollection),
            None => Err(SearchError::NoMatch),
        }
    }

    /// Minimal distance of series `index`.
    pub fn distance_of(&self, index: usize) -> Result<f64> {
        let d = *self
            .distances
            .get(index)
            .ok_or(SearchError::IndexOutOfRange {
                index,
                len: self.distances.len(),
            })?;
        if d == UNMATCHED {
            return Err(SearchError::SeriesTooShort { index });
        }
        Ok(d)
    }

    /// Number of series that took part in the best-match competition.
    pub fn matched_count(&self) -> usize {
        self.distances.iter().filter(|&&d| d != UNMATCHED).count()
    }

    /// The `k` closest series in `(distance, index)` order.
    pub fn top_k(&self, k: usize) -> Vec<BestMatch> {
        let mut ranked: Vec<BestMatch> = self
            .distances
            .iter()
            .enumerate()
            .filter(|&(_, &d)| is_ranked(d))
            .map(|(i, &d)| BestMatch::new(i, d))
            .collect();
        ranked.sort_by(|a, b| a.cmp_key(b).unwrap_or(Ordering::Equal));
        ranked.truncate(k);
        ranked
    }

    /// Whether `other` reports the same best index and the same distances
    /// within `epsilon`. Unmatched slots must agree exactly.
    pub fn agrees_with(&self, other: &MatchResult, epsilon: f64) -> bool {
        if self.best_index() != other.best_index() {
            return false;
        }
        if self.distances.len() != other.distances.len() {
            return false;
        }
        self.distances.iter().zip(&other.distances).all(|(&a, &b)| {
            if a == UNMATCHED || b == UNMATCHED || !a.is_finite() || !b.is_finite() {
                a == b || (a.is_nan() && b.is_nan())
            } else {
                (a - b).abs() <= epsilon
            }
        })
    }
}
