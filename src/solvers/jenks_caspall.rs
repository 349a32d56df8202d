//! Jenks-Caspall boundary local search.

use crate::classifier::ClassifyError;
use crate::types::{Diagnostics, Observations};

use super::baseline::quantiles;
use super::partition::{local_search, Grouped, SearchOutcome};
use super::Solution;

/// Local search starting from quantile breaks.
///
/// Tied data can collapse the quantile start to fewer than `k` classes; the
/// search then runs on that smaller partition.
pub fn jenks_caspall(
    obs: &Observations,
    k: usize,
    max_iterations: usize,
) -> Result<Solution, ClassifyError> {
    let start = quantiles(obs, k)?;
    let grouped = Grouped::new(obs.sorted());
    let cuts = grouped.cuts_for(&start);
    finish(&grouped, local_search(&grouped, cuts, 1, max_iterations))
}

/// Local search with exactly `k` classes of at least `min_class_size`
/// observations each.
pub fn jenks_caspall_forced(
    obs: &Observations,
    k: usize,
    max_iterations: usize,
    min_class_size: usize,
) -> Result<Solution, ClassifyError> {
    obs.ensure_k(k)?;
    let infeasible = || ClassifyError::InfeasibleClassFloor {
        k,
        min_class_size,
        n: obs.len(),
    };
    if obs.len() < k * min_class_size {
        return Err(infeasible());
    }

    let grouped = Grouped::new(obs.sorted());
    let from_quantiles = grouped.cuts_for(&quantiles(obs, k)?);
    let cuts = if from_quantiles.len() == k + 1
        && grouped.is_feasible(&from_quantiles, min_class_size)
    {
        from_quantiles
    } else {
        tracing::debug!(k, min_class_size, "quantile start infeasible, using balanced split");
        grouped
            .balanced_cuts(k, min_class_size)
            .ok_or_else(infeasible)?
    };

    finish(
        &grouped,
        local_search(&grouped, cuts, min_class_size, max_iterations),
    )
}

fn finish(grouped: &Grouped<'_>, outcome: SearchOutcome) -> Result<Solution, ClassifyError> {
    if !outcome.converged {
        tracing::debug!(
            iterations = outcome.iterations,
            "jenks-caspall stopped at iteration cap"
        );
    }
    Ok(Solution {
        breaks: grouped.breaks(&outcome.cuts)?,
        diagnostics: Diagnostics {
            iterations: Some(outcome.iterations),
            converged: Some(outcome.converged),
            ..Diagnostics::default()
        },
    })
}
