//! Shared breaks across several arrays.
//!
//! The arrays are concatenated, one method is fitted on the pooled values and
//! every original array is then classified against exactly those breaks, so
//! maps drawn from different arrays (years, variables) share one legend.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifyError, Classifier};
use crate::method::Method;
use crate::solvers::Solution;
use crate::types::{Breaks, Observations};

/// Result of a pooled fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pooled {
    /// The shared breaks.
    pub breaks: Breaks,
    /// Classifier over the concatenated values.
    pub global: Classifier,
    /// One classifier per input array, in input order.
    pub per_array: Vec<Classifier>,
    /// Start of each array within the concatenated values, followed by the
    /// total length.
    offsets: Vec<usize>,
}

impl Pooled {
    /// Number of input arrays.
    pub fn len(&self) -> usize {
        self.per_array.len()
    }

    /// Always false: a pooled fit needs at least one array.
    pub fn is_empty(&self) -> bool {
        self.per_array.is_empty()
    }

    /// Source `(array, position)` of a value in the concatenated data.
    pub fn source_of(&self, pooled_index: usize) -> Option<(usize, usize)> {
        if pooled_index >= self.offsets[self.offsets.len() - 1] {
            return None;
        }
        let array = self.offsets.partition_point(|&o| o <= pooled_index) - 1;
        Some((array, pooled_index - self.offsets[array]))
    }

    /// Whether every per-array classifier carries bit-identical breaks.
    pub fn breaks_consistent(&self) -> bool {
        let expected = self.breaks.fingerprint();
        self.per_array
            .iter()
            .all(|c| c.classification().breaks_fingerprint == expected)
    }
}

/// Fits one method over several arrays at once.
#[derive(Debug, Clone)]
pub struct PooledClassifier {
    method: Method,
}

impl PooledClassifier {
    /// Create a pooled classifier for `method`.
    pub fn new(method: Method) -> Self {
        Self { method }
    }

    /// The method fitted on the pooled values.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fit shared breaks and classify every array against them.
    ///
    /// Arrays may differ in length. An empty list is `EmptyInput`; an empty
    /// or non-finite array is `InvalidArray` naming its position.
    pub fn fit<A: AsRef<[f64]>>(&self, arrays: &[A]) -> Result<Pooled, ClassifyError> {
        if arrays.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let per_array_obs = arrays
            .iter()
            .enumerate()
            .map(|(index, values)| {
                Observations::new(values.as_ref()).map_err(|source| ClassifyError::InvalidArray {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut offsets = Vec::with_capacity(arrays.len() + 1);
        let mut pooled = Vec::new();
        for obs in &per_array_obs {
            offsets.push(pooled.len());
            pooled.extend_from_slice(obs.values());
        }
        offsets.push(pooled.len());

        let global = Classifier::fit(&pooled, self.method.clone())?;
        let breaks = global.breaks().clone();
        tracing::debug!(
            arrays = arrays.len(),
            n = pooled.len(),
            k = breaks.k(),
            "pooled breaks fitted"
        );

        let per_array = per_array_obs
            .into_iter()
            .map(|obs| {
                Classifier::from_solution(obs, self.method.clone(), Solution::from(breaks.clone()))
            })
            .collect();

        Ok(Pooled {
            breaks,
            global,
            per_array,
            offsets,
        })
    }
}
