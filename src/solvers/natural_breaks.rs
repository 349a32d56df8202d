//! One-dimensional k-means.

use crate::classifier::ClassifyError;
use crate::method::CentroidInit;
use crate::stats::{midpoint, quantile_sorted, SegmentCost};
use crate::types::{Breaks, Diagnostics, Observations};

use super::sampling::rng_for;
use super::Solution;

/// A finished Lloyd run over sorted data.
#[derive(Debug, Clone)]
struct Run {
    centroids: Vec<f64>,
    /// End index of each cluster's run in the sorted data.
    ends: Vec<usize>,
    sse: f64,
    iterations: usize,
    converged: bool,
}

/// Natural breaks: k-means on the line, breaks at the midpoints between
/// neighbouring non-empty clusters.
pub fn natural_breaks(
    obs: &Observations,
    k: usize,
    init: &CentroidInit,
    max_iterations: usize,
    seed: Option<u64>,
) -> Result<Solution, ClassifyError> {
    obs.ensure_k(k)?;
    let sorted = obs.sorted();
    let costs = SegmentCost::new(sorted);

    let (best, runs) = match init {
        CentroidInit::Quantiles => {
            let centroids = (0..k)
                .map(|i| quantile_sorted(sorted, (2 * i + 1) as f64 / (2 * k) as f64))
                .collect();
            (lloyd(sorted, &costs, centroids, max_iterations), 1)
        }
        CentroidInit::Random { restarts } => {
            let mut distinct = sorted.to_vec();
            distinct.dedup();
            let mut rng = rng_for(seed);
            let mut best: Option<Run> = None;
            for _ in 0..*restarts {
                let centroids = rand::seq::index::sample(&mut rng, distinct.len(), k)
                    .into_iter()
                    .map(|i| distinct[i])
                    .collect();
                let run = lloyd(sorted, &costs, centroids, max_iterations);
                tracing::trace!(sse = run.sse, iterations = run.iterations, "k-means restart");
                if best.as_ref().map_or(true, |b| run.sse < b.sse) {
                    best = Some(run);
                }
            }
            match best {
                Some(run) => (run, *restarts),
                None => {
                    return Err(ClassifyError::InvalidParameter {
                        name: "restarts",
                        reason: "must be at least 1".to_string(),
                    })
                }
            }
        }
    };

    if !best.converged {
        tracing::debug!(
            iterations = best.iterations,
            "k-means stopped at iteration cap"
        );
    }

    Ok(Solution {
        breaks: breaks_of(&best, obs.max())?,
        diagnostics: Diagnostics {
            iterations: Some(best.iterations),
            converged: Some(best.converged),
            candidates: Some(runs),
            ..Diagnostics::default()
        },
    })
}

fn lloyd(sorted: &[f64], costs: &SegmentCost, initial: Vec<f64>, max_iterations: usize) -> Run {
    let mut centroids = normalized(initial);
    let mut ends = assign(sorted, &centroids);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;
        let mut start = 0;
        for (centroid, &end) in centroids.iter_mut().zip(&ends) {
            if end > start {
                *centroid = costs.mean(start, end);
            }
            start = end;
        }
        centroids = normalized(centroids);

        let next = assign(sorted, &centroids);
        let stable = next == ends;
        ends = next;
        if stable {
            converged = true;
            break;
        }
    }

    let mut start = 0;
    let mut sse = 0.0;
    for &end in &ends {
        sse += costs.scaled_sq_dev(start, end);
        start = end;
    }

    Run {
        centroids,
        ends,
        sse,
        iterations,
        converged,
    }
}

fn normalized(mut centroids: Vec<f64>) -> Vec<f64> {
    centroids.sort_by(f64::total_cmp);
    centroids.dedup();
    centroids
}

/// Nearest-centroid assignment: every value up to the midpoint of two
/// neighbouring centroids goes to the lower one.
fn assign(sorted: &[f64], centroids: &[f64]) -> Vec<usize> {
    let mut ends: Vec<usize> = centroids
        .windows(2)
        .map(|w| {
            let mid = midpoint(w[0], w[1]);
            sorted.partition_point(|v| *v <= mid)
        })
        .collect();
    ends.push(sorted.len());
    ends
}

fn breaks_of(run: &Run, max: f64) -> Result<Breaks, ClassifyError> {
    let mut start = 0;
    let mut occupied = Vec::with_capacity(run.centroids.len());
    for (&centroid, &end) in run.centroids.iter().zip(&run.ends) {
        if end > start {
            occupied.push(centroid);
        }
        start = end;
    }
    let mut cuts: Vec<f64> = occupied.windows(2).map(|w| midpoint(w[0], w[1])).collect();
    cuts.push(max);
    Breaks::collapsed(cuts)
}
