//! Class count selection for one method family.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifyError, Classifier};
use crate::method::Method;
use crate::types::Observations;

/// Sweep bounds and the fit target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KOptimizerParams {
    /// First k tried.
    #[serde(default = "default_start_k")]
    pub start_k: usize,
    /// Last k tried, capped at the number of distinct values.
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    /// Stop at the first k whose fit reaches this; `None` sweeps every k and
    /// keeps the best.
    #[serde(default = "default_target_fit")]
    pub target_fit: Option<f64>,
}

fn default_start_k() -> usize {
    2
}

fn default_max_k() -> usize {
    15
}

fn default_target_fit() -> Option<f64> {
    Some(0.8)
}

impl Default for KOptimizerParams {
    fn default() -> Self {
        Self {
            start_k: default_start_k(),
            max_k: default_max_k(),
            target_fit: default_target_fit(),
        }
    }
}

/// Fit at one k of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KSweepPoint {
    /// Class count.
    pub k: usize,
    /// Fit at that class count.
    pub fit: f64,
}

/// Outcome of a k sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KOptimum {
    /// Chosen class count.
    pub k: usize,
    /// Fit at the chosen class count.
    pub fit: f64,
    /// Whether the fit reached the target.
    pub target_met: bool,
    /// The classifier fitted at the chosen k.
    pub classifier: Classifier,
    /// Every k tried, in order.
    pub trace: Vec<KSweepPoint>,
}

/// Refits a k-parameterised method over a range of k.
///
/// Picks the smallest k whose fit is at least the target; when no k reaches
/// it (or there is no target), the k with the best fit, ties to the smaller k.
#[derive(Debug, Clone, Default)]
pub struct KOptimizer {
    params: KOptimizerParams,
}

impl KOptimizer {
    /// Create an optimizer with the given bounds.
    pub fn new(params: KOptimizerParams) -> Self {
        Self { params }
    }

    /// The sweep parameters.
    pub fn params(&self) -> &KOptimizerParams {
        &self.params
    }

    /// Sweep k for `method` over raw values.
    pub fn optimize(&self, values: &[f64], method: &Method) -> Result<KOptimum, ClassifyError> {
        self.optimize_observations(&Observations::new(values)?, method)
    }

    /// Sweep k for `method` over validated observations.
    ///
    /// The k of `method` itself is ignored. A k whose class floor cannot be
    /// met ends the sweep early.
    pub fn optimize_observations(
        &self,
        obs: &Observations,
        method: &Method,
    ) -> Result<KOptimum, ClassifyError> {
        let KOptimizerParams {
            start_k,
            max_k,
            target_fit,
        } = self.params;
        if method.k().is_none() {
            return Err(ClassifyError::UnsupportedForKSweep(method.name().to_string()));
        }
        if start_k == 0 {
            return Err(ClassifyError::InvalidK { k: start_k });
        }
        if let Some(target) = target_fit {
            if !(0.0..=1.0).contains(&target) {
                return Err(ClassifyError::InvalidParameter {
                    name: "target_fit",
                    reason: format!("{target} is outside [0, 1]"),
                });
            }
        }
        let max_k = max_k.min(obs.distinct_count());
        if start_k > max_k {
            return Err(ClassifyError::TooFewDistinctValues {
                k: start_k,
                distinct: obs.distinct_count(),
            });
        }

        let mut trace = Vec::new();
        let mut best: Option<(usize, Classifier)> = None;

        for k in start_k..=max_k {
            let Some(candidate) = method.with_k(k) else {
                break;
            };
            let classifier = match Classifier::fit_observations(obs.clone(), candidate) {
                Ok(classifier) => classifier,
                Err(err @ ClassifyError::InfeasibleClassFloor { .. }) => {
                    tracing::debug!(k, error = %err, "k sweep stopped");
                    if best.is_none() {
                        return Err(err);
                    }
                    break;
                }
                Err(err) => return Err(err),
            };
            let fit = classifier.gadf();
            trace.push(KSweepPoint { k, fit });
            tracing::trace!(method = method.name(), k, fit, "k sweep point");

            if target_fit.is_some_and(|target| fit >= target) {
                tracing::debug!(method = method.name(), k, fit, "fit target reached");
                return Ok(KOptimum {
                    k,
                    fit,
                    target_met: true,
                    classifier,
                    trace,
                });
            }
            if best.as_ref().map_or(true, |(_, b)| fit > b.gadf()) {
                best = Some((k, classifier));
            }
        }

        let (k, classifier) = best.ok_or(ClassifyError::InvalidK { k: start_k })?;
        tracing::debug!(
            method = method.name(),
            k,
            fit = classifier.gadf(),
            "fit target not reached, using best fit"
        );
        Ok(KOptimum {
            k,
            fit: classifier.gadf(),
            target_met: false,
            classifier,
            trace,
        })
    }
}
