use std::ops::Deref;
use std::sync::Arc;

/// An immutable time series (or query pattern).
///
/// The values are shared behind an `Arc`, so cloning a `Series` is cheap and
/// never copies data. Once constructed, the length and contents are fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: Arc<[f64]>,
}

impl Series {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at time offset `t`.
    ///
    /// # Panics
    /// Panics if `t >= self.len()`.
    #[inline]
    pub fn value(&self, t: usize) -> f64 {
        self.values[t]
    }
}

impl Deref for Series {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for Series {
    fn from(values: &[f64]) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl FromIterator<f64> for Series {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
