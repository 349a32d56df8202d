//! Ranking every k-parameterised method family.

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifyError, Classifier};
use crate::method::{Method, K_METHODS};
use crate::types::Observations;

use super::k_optimizer::{KOptimizer, KOptimizerParams};

/// One method family's k sweep result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KCandidate {
    /// Method name.
    pub method: String,
    /// Chosen class count.
    pub k: usize,
    /// Fit at that class count.
    pub fit: f64,
    /// Whether the fit reached the target.
    pub target_met: bool,
    /// The fitted classifier.
    pub classifier: Classifier,
}

/// Ranked sweep results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KRanking {
    /// Every family that produced a result, best first.
    pub table: Vec<KCandidate>,
}

impl KRanking {
    /// The top-ranked candidate.
    pub fn best(&self) -> Option<&KCandidate> {
        self.table.first()
    }
}

/// Runs the k sweep for every k-parameterised method and ranks the results
/// by (target met, smaller k, higher fit).
///
/// Randomised families only run when a seed is given, so the ranking is
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct KClassifiers {
    optimizer: KOptimizer,
    seed: Option<u64>,
}

impl KClassifiers {
    /// Create a ranking run with the given sweep bounds.
    pub fn new(params: KOptimizerParams) -> Self {
        Self {
            optimizer: KOptimizer::new(params),
            seed: None,
        }
    }

    /// Include the randomised families, seeded with `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sweep and rank over raw values.
    pub fn rank(&self, values: &[f64]) -> Result<KRanking, ClassifyError> {
        self.rank_observations(&Observations::new(values)?)
    }

    /// Sweep and rank over validated observations.
    ///
    /// A family that fails is skipped; the first failure is returned only
    /// when every family fails.
    pub fn rank_observations(&self, obs: &Observations) -> Result<KRanking, ClassifyError> {
        let start_k = self.optimizer.params().start_k;
        let mut table = Vec::new();
        let mut first_error = None;

        for name in K_METHODS {
            let method = Method::from_name(name, Some(start_k))?;
            let method = match (method.is_randomized(), self.seed) {
                (false, _) => method,
                (true, Some(seed)) => method.with_seed(seed),
                (true, None) => continue,
            };

            match self.optimizer.optimize_observations(obs, &method) {
                Ok(optimum) => table.push(KCandidate {
                    method: method.name().to_string(),
                    k: optimum.k,
                    fit: optimum.fit,
                    target_met: optimum.target_met,
                    classifier: optimum.classifier,
                }),
                Err(err) => {
                    tracing::warn!(method = name, error = %err, "k sweep failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        if table.is_empty() {
            return Err(first_error.unwrap_or(ClassifyError::EmptyInput));
        }

        table.sort_by(|a, b| {
            b.target_met
                .cmp(&a.target_met)
                .then(a.k.cmp(&b.k))
                .then(b.fit.total_cmp(&a.fit))
        });
        Ok(KRanking { table })
    }
}
