//! Fitted classification results.

use serde::{Deserialize, Serialize};

use super::breaks::Breaks;

/// Statistics of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    /// Number of observations in the class.
    pub count: usize,
    /// Lower (exclusive) bound: the previous break, `None` for the first class.
    pub lower: Option<f64>,
    /// Upper (inclusive) bound: this class's break.
    pub upper: f64,
    /// Class mean, `None` when the class is empty.
    pub mean: Option<f64>,
    /// Class median, `None` when the class is empty.
    pub median: Option<f64>,
    /// Sum of absolute deviations around the class median.
    pub abs_dev: f64,
    /// Sum of squared deviations around the class mean.
    pub sq_dev: f64,
}

/// Solver-specific diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Iterations used by an iterative solver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    /// Whether an iterative solver stopped on its own rather than at the cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    /// Size of the subsample a sampled solver fitted on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
    /// Number of candidate partitions a search evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<usize>,
}

/// The complete output of one fit.
///
/// Plain data: breaks, per-observation class, per-class statistics and the
/// fit score. Produced once per fit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Name of the method that produced the breaks.
    pub method: String,
    /// Hash of the method parameters.
    pub params_hash: String,
    /// Number of classes.
    pub k: usize,
    /// Upper class boundaries.
    pub breaks: Breaks,
    /// Class index of every observation, in input order.
    pub assignments: Vec<usize>,
    /// Per-class statistics.
    pub classes: Vec<ClassStats>,
    /// Goodness of absolute deviation fit in `[0, 1]`.
    pub fit: f64,
    /// Summed within-class absolute deviation.
    pub within_abs_dev: f64,
    /// Absolute deviation of all observations around the global median.
    pub global_abs_dev: f64,
    /// Total sum of squares around the global mean.
    pub total_sum_of_squares: f64,
    /// Solver diagnostics.
    pub diagnostics: Diagnostics,
    /// Bit-exact fingerprint of the breaks.
    pub breaks_fingerprint: String,
}

impl Classification {
    /// Observation counts per class.
    pub fn counts(&self) -> Vec<usize> {
        self.classes.iter().map(|c| c.count).collect()
    }

    /// Number of classes holding at least one observation.
    pub fn effective_k(&self) -> usize {
        self.classes.iter().filter(|c| c.count > 0).count()
    }

    /// Indices of the observations in a given class.
    pub fn members(&self, class: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == class)
            .map(|(i, _)| i)
            .collect()
    }
}
