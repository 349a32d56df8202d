//! Parameter blocks shared by several methods, and parameter hashing.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing to avoid cross-platform
//! serialization differences. The quantization factor is 1e6 (multiply by
//! 1,000,000 and round to i64), so two parameter sets that differ below that
//! resolution hash identically.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_hash_hex;

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Default iteration cap for the iterative solvers.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default subsample fraction for the sampled solvers.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.10;

/// Subsample size cap applied when `truncate` is set.
pub const SAMPLE_TRUNCATE_SIZE: usize = 1000;

/// Subsampling parameters for the sampled solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    /// Fraction of the observations to draw, in `(0, 1]`.
    #[serde(default = "default_sample_fraction")]
    pub fraction: f64,
    /// Cap the sample at 1000 observations.
    #[serde(default = "default_true")]
    pub truncate: bool,
    /// RNG seed; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SampleParams {
    /// Default sampling with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Number of observations to draw from `n`.
    pub fn sample_size(&self, n: usize) -> usize {
        let size = (n as f64 * self.fraction) as usize;
        if self.truncate {
            size.min(SAMPLE_TRUNCATE_SIZE)
        } else {
            size
        }
    }
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            fraction: DEFAULT_SAMPLE_FRACTION,
            truncate: true,
            seed: None,
        }
    }
}

/// Centroid initialisation for natural breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CentroidInit {
    /// Centroids at the `(2i + 1) / 2k` quantiles. Deterministic.
    Quantiles,
    /// `restarts` runs from k distinct values drawn at random; the run with the
    /// lowest within-class sum of squares wins.
    Random {
        /// Number of random restarts.
        restarts: usize,
    },
}

impl Default for CentroidInit {
    fn default() -> Self {
        Self::Random { restarts: 10 }
    }
}

pub(crate) fn default_sample_fraction() -> f64 {
    DEFAULT_SAMPLE_FRACTION
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

pub(crate) fn default_min_class_size() -> usize {
    1
}

pub(crate) fn default_percentiles() -> Vec<f64> {
    vec![1.0, 10.0, 50.0, 90.0, 99.0, 100.0]
}

pub(crate) fn default_multiples() -> Vec<f64> {
    vec![-2.0, -1.0, 1.0, 2.0]
}

pub(crate) fn default_hinge() -> f64 {
    1.5
}

pub(crate) fn default_max_head_fraction() -> f64 {
    0.4
}

pub(crate) fn default_exhaustive_limit() -> usize {
    50_000
}

pub(crate) fn default_restarts() -> usize {
    100
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Replace every non-integer number in a JSON tree with its quantized form.
fn quantize_value(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => {
            Value::from(quantize_float(n.as_f64().unwrap_or_default()))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(quantize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, quantize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Hash of a parameter set with floats quantized.
pub(crate) fn quantized_params_hash<T: Serialize>(params: &T) -> String {
    let value = serde_json::to_value(params).unwrap_or(Value::Null);
    canonical_hash_hex(&quantize_value(value))
}
