//! Validated observation arrays.

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifyError;

/// A non-empty array of finite observations.
///
/// Keeps the values in caller order together with a sorted copy, so every
/// solver can work on sorted data without re-sorting. Immutable once built.
///
/// Serializes as the plain value array; deserializing re-runs validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Observations {
    values: Vec<f64>,
    sorted: Vec<f64>,
    distinct: usize,
}

impl Observations {
    /// Validate and wrap a slice of values.
    ///
    /// Rejects empty input and any NaN or infinite value.
    pub fn new(values: &[f64]) -> Result<Self, ClassifyError> {
        if values.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifyError::NonFinite { index, value });
        }
        Ok(Self::from_finite(values.to_vec()))
    }

    /// Build observations by dropping non-finite values.
    ///
    /// Returns the observations and the number of values dropped.
    pub fn dropping_non_finite(values: &[f64]) -> Result<(Self, usize), ClassifyError> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let dropped = values.len() - finite.len();
        if finite.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        if dropped > 0 {
            tracing::debug!(dropped, kept = finite.len(), "dropped non-finite observations");
        }
        Ok((Self::from_finite(finite), dropped))
    }

    fn from_finite(values: Vec<f64>) -> Self {
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let distinct = count_distinct_sorted(&sorted);
        Self {
            values,
            sorted,
            distinct,
        }
    }

    /// Values in caller order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values in ascending order.
    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct values.
    pub fn distinct_count(&self) -> usize {
        self.distinct
    }

    /// Smallest observation.
    pub fn min(&self) -> f64 {
        self.sorted[0]
    }

    /// Largest observation.
    pub fn max(&self) -> f64 {
        self.sorted[self.sorted.len() - 1]
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> f64 {
        let n = self.values.len() as f64;
        let mean = self.values.iter().sum::<f64>() / n;
        if mean.is_finite() {
            mean
        } else {
            self.values.iter().map(|v| v / n).sum()
        }
    }

    /// Check that `k` classes can be formed from these observations.
    pub fn ensure_k(&self, k: usize) -> Result<(), ClassifyError> {
        if k == 0 {
            return Err(ClassifyError::InvalidK { k });
        }
        if k > self.distinct {
            return Err(ClassifyError::TooFewDistinctValues {
                k,
                distinct: self.distinct,
            });
        }
        Ok(())
    }

    /// Concatenate the values of `self` and `extra` into new observations.
    pub fn extended(&self, extra: &[f64]) -> Result<Self, ClassifyError> {
        let mut values = self.values.clone();
        values.extend_from_slice(extra);
        Self::new(&values)
    }
}

impl TryFrom<Vec<f64>> for Observations {
    type Error = ClassifyError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&values)
    }
}

impl From<Observations> for Vec<f64> {
    fn from(observations: Observations) -> Self {
        observations.values
    }
}

fn count_distinct_sorted(sorted: &[f64]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] < w[1]).count()
}
