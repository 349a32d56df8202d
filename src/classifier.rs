//! Fitted classifiers.
//!
//! A [`Classifier`] is the result of running one [`Method`] over one set of
//! [`Observations`]: the breaks, the class of every observation, per-class
//! statistics and the fit score. It is immutable; [`Classifier::update`] and
//! every other refit return a new classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::method::Method;
use crate::solvers::{self, baseline::box_plot_fences, Solution};
use crate::stats;
use crate::types::{Breaks, Classification, Observations};

/// Error type for classification.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// No observations.
    #[error("Empty input: at least one observation is required")]
    EmptyInput,
    /// A NaN or infinite value.
    #[error("Non-finite value {value} at index {index}")]
    NonFinite {
        /// Position of the value.
        index: usize,
        /// The offending value.
        value: f64,
    },
    /// k outside the allowed range.
    #[error("Invalid class count k = {k}")]
    InvalidK {
        /// Requested class count.
        k: usize,
    },
    /// Fewer distinct values than requested classes.
    #[error("Cannot form {k} classes from {distinct} distinct values")]
    TooFewDistinctValues {
        /// Requested class count.
        k: usize,
        /// Distinct values in the data.
        distinct: usize,
    },
    /// Breaks that are empty, non-finite or not strictly increasing.
    #[error("Invalid breaks: {0}")]
    InvalidBreaks(String),
    /// A method parameter outside its range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// No partition gives every class the minimum size.
    #[error("Cannot form {k} classes of at least {min_class_size} observations from {n} values")]
    InfeasibleClassFloor {
        /// Requested class count.
        k: usize,
        /// Minimum observations per class.
        min_class_size: usize,
        /// Number of observations.
        n: usize,
    },
    /// One array of a pooled fit is invalid.
    #[error("Invalid array {index}: {source}")]
    InvalidArray {
        /// Position of the array in the input list.
        index: usize,
        /// Why it was rejected.
        source: Box<ClassifyError>,
    },
    /// A k sweep was requested for a method without a k parameter.
    #[error("Method `{0}` has no class count to sweep")]
    UnsupportedForKSweep(String),
    /// A method name that is not in the catalogue.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
}

impl ClassifyError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::NonFinite { .. } => "NON_FINITE",
            Self::InvalidK { .. } => "INVALID_K",
            Self::TooFewDistinctValues { .. } => "TOO_FEW_DISTINCT_VALUES",
            Self::InvalidBreaks(_) => "INVALID_BREAKS",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InfeasibleClassFloor { .. } => "INFEASIBLE_CLASS_FLOOR",
            Self::InvalidArray { .. } => "INVALID_ARRAY",
            Self::UnsupportedForKSweep(_) => "UNSUPPORTED_FOR_K_SWEEP",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
        }
    }
}

/// Observation indices outside the box-plot fences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outliers {
    /// Indices of values below the lower fence.
    pub low: Vec<usize>,
    /// Indices of values above the upper fence.
    pub high: Vec<usize>,
}

/// A method fitted to a set of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
    method: Method,
    observations: Observations,
    classification: Classification,
}

impl Classifier {
    /// Validate `values` and fit `method` to them.
    pub fn fit(values: &[f64], method: Method) -> Result<Self, ClassifyError> {
        Self::fit_observations(Observations::new(values)?, method)
    }

    /// Fit `method` to already validated observations.
    pub fn fit_observations(
        observations: Observations,
        method: Method,
    ) -> Result<Self, ClassifyError> {
        let solution = solvers::solve(&method, &observations)?;
        Ok(Self::from_solution(observations, method, solution))
    }

    /// Classify observations against breaks fitted elsewhere.
    pub(crate) fn from_solution(
        observations: Observations,
        method: Method,
        solution: Solution,
    ) -> Self {
        let Solution {
            breaks,
            diagnostics,
        } = solution;
        let sorted = observations.sorted();
        let classes = stats::class_stats(sorted, &breaks);
        let assignments = observations
            .values()
            .iter()
            .map(|v| breaks.bin_of(*v))
            .collect();
        let within_abs_dev: f64 = classes.iter().map(|c| c.abs_dev).sum();
        let global_abs_dev = stats::global_abs_dev(sorted);

        let classification = Classification {
            method: method.name().to_string(),
            params_hash: method.params_hash(),
            k: breaks.k(),
            breaks_fingerprint: breaks.fingerprint(),
            assignments,
            classes,
            fit: stats::fit_of(sorted, &breaks),
            within_abs_dev,
            global_abs_dev,
            total_sum_of_squares: stats::total_sum_of_squares(sorted),
            diagnostics,
            breaks,
        };

        tracing::debug!(
            method = %method,
            k = classification.k,
            fit = classification.fit,
            "classifier fitted"
        );

        Self {
            method,
            observations,
            classification,
        }
    }

    /// The fitted method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The observations the classifier was fitted to.
    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// The full fit result.
    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Consume the classifier, keeping the fit result.
    pub fn into_classification(self) -> Classification {
        self.classification
    }

    /// The fitted breaks.
    pub fn breaks(&self) -> &Breaks {
        &self.classification.breaks
    }

    /// Number of classes.
    pub fn k(&self) -> usize {
        self.classification.k
    }

    /// Class of every observation, in input order.
    pub fn assignments(&self) -> &[usize] {
        &self.classification.assignments
    }

    /// Goodness of absolute deviation fit.
    pub fn gadf(&self) -> f64 {
        self.classification.fit
    }

    /// Class of a new value under the fitted breaks.
    pub fn find_bin(&self, value: f64) -> Result<usize, ClassifyError> {
        if !value.is_finite() {
            return Err(ClassifyError::NonFinite { index: 0, value });
        }
        Ok(self.breaks().bin_of(value))
    }

    /// Classes of several new values.
    pub fn find_bins(&self, values: &[f64]) -> Result<Vec<usize>, ClassifyError> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                if value.is_finite() {
                    Ok(self.breaks().bin_of(value))
                } else {
                    Err(ClassifyError::NonFinite { index, value })
                }
            })
            .collect()
    }

    /// Refit the same method on the observations plus `extra`.
    pub fn update(&self, extra: &[f64]) -> Result<Self, ClassifyError> {
        Self::fit_observations(self.observations.extended(extra)?, self.method.clone())
    }

    /// Refit the same observations with another method.
    pub fn refit(&self, method: Method) -> Result<Self, ClassifyError> {
        Self::fit_observations(self.observations.clone(), method)
    }

    /// Box-plot outliers; `None` for other methods.
    pub fn outliers(&self) -> Option<Outliers> {
        let Method::BoxPlot { hinge } = self.method else {
            return None;
        };
        let (lower, upper) = box_plot_fences(self.observations.sorted(), hinge);
        let mut outliers = Outliers::default();
        for (i, &v) in self.observations.values().iter().enumerate() {
            if v < lower {
                outliers.low.push(i);
            } else if v > upper {
                outliers.high.push(i);
            }
        }
        Some(outliers)
    }
}

impl fmt::Display for Classifier {
    /// Class table: interval and count per class.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.classification;
        writeln!(f, "{} (k={}, gadf={:.4})", self.method.name(), c.k, c.fit)?;
        let labels: Vec<String> = c
            .classes
            .iter()
            .map(|class| match class.lower {
                None => {
                    let lower = self.observations.min().min(class.upper);
                    format!("[{:.2}, {:.2}]", lower, class.upper)
                }
                Some(lower) => format!("({:.2}, {:.2}]", lower, class.upper),
            })
            .collect();
        let width = labels.iter().map(String::len).max().unwrap_or(0).max(8);
        writeln!(f, "{:<width$}  Count", "Interval")?;
        for (label, class) in labels.iter().zip(&c.classes) {
            writeln!(f, "{:<width$}  {:>5}", label, class.count)?;
        }
        Ok(())
    }
}
