//! Best-fit partition under a minimum class size.

use rand::Rng;

use crate::classifier::ClassifyError;
use crate::types::{Diagnostics, Observations};

use super::partition::{local_search, Grouped};
use super::sampling::rng_for;
use super::Solution;

/// Iteration cap for each local search run.
const SEARCH_ITERATIONS: usize = 100;

/// Tuning for [`max_p`].
#[derive(Debug, Clone, Copy)]
pub struct MaxPParams {
    /// Number of classes.
    pub k: usize,
    /// Minimum observations per class.
    pub min_class_size: usize,
    /// Enumerate every partition when there are at most this many.
    pub exhaustive_limit: usize,
    /// Random starts for the heuristic search.
    pub restarts: usize,
    /// RNG seed.
    pub seed: Option<u64>,
}

/// Partition into exactly `k` classes that minimises the summed within-class
/// absolute deviation while every class holds at least `min_class_size`
/// observations.
///
/// Exhaustive when the number of candidate partitions is within
/// `exhaustive_limit`; otherwise a balanced start plus `restarts` random
/// feasible starts, each refined by the constrained local search.
pub fn max_p(obs: &Observations, params: MaxPParams) -> Result<Solution, ClassifyError> {
    let MaxPParams {
        k,
        min_class_size,
        exhaustive_limit,
        restarts,
        seed,
    } = params;
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
    let g = grouped.groups();
    let candidates = binomial(g - 1, k - 1, exhaustive_limit);

    let (cuts, diagnostics) = if candidates <= exhaustive_limit {
        let mut search = Exhaustive::new(&grouped, k, min_class_size);
        search.run();
        tracing::debug!(k, candidates = search.visited, "max-p exhaustive search");
        let diagnostics = Diagnostics {
            candidates: Some(search.visited),
            converged: Some(true),
            ..Diagnostics::default()
        };
        (search.best.map(|(cuts, _)| cuts), diagnostics)
    } else {
        heuristic(&grouped, k, min_class_size, restarts, seed)
    };

    let cuts = cuts.ok_or_else(infeasible)?;
    Ok(Solution {
        breaks: grouped.breaks(&cuts)?,
        diagnostics,
    })
}

/// `C(n, r)`, saturating just above `limit`.
fn binomial(n: usize, r: usize, limit: usize) -> usize {
    let r = r.min(n - r);
    let mut value: u128 = 1;
    for i in 0..r {
        value = value * (n - i) as u128 / (i + 1) as u128;
        if value > limit as u128 {
            return limit.saturating_add(1);
        }
    }
    value as usize
}

struct Exhaustive<'g, 'a> {
    grouped: &'g Grouped<'a>,
    k: usize,
    floor: usize,
    cuts: Vec<usize>,
    best: Option<(Vec<usize>, f64)>,
    visited: usize,
}

impl<'g, 'a> Exhaustive<'g, 'a> {
    fn new(grouped: &'g Grouped<'a>, k: usize, floor: usize) -> Self {
        Self {
            grouped,
            k,
            floor,
            cuts: vec![0],
            best: None,
            visited: 0,
        }
    }

    fn run(&mut self) {
        self.extend(0.0);
    }

    /// Place the next cut after the last one, pruning classes under the floor.
    fn extend(&mut self, cost_so_far: f64) {
        let g = self.grouped.groups();
        let last = self.cuts[self.cuts.len() - 1];
        let placed = self.cuts.len() - 1;

        if placed + 1 == self.k {
            self.visited += 1;
            if self.grouped.count(last, g) < self.floor {
                return;
            }
            let cost = cost_so_far + self.grouped.cost(last, g);
            if self.best.as_ref().map_or(true, |(_, best)| cost < *best) {
                let mut cuts = self.cuts.clone();
                cuts.push(g);
                self.best = Some((cuts, cost));
            }
            return;
        }

        let remaining = self.k - placed - 1;
        for next in (last + 1)..=(g - remaining) {
            if self.grouped.count(last, next) < self.floor {
                continue;
            }
            let cost = cost_so_far + self.grouped.cost(last, next);
            self.cuts.push(next);
            self.extend(cost);
            self.cuts.pop();
        }
    }
}

fn heuristic(
    grouped: &Grouped<'_>,
    k: usize,
    floor: usize,
    restarts: usize,
    seed: Option<u64>,
) -> (Option<Vec<usize>>, Diagnostics) {
    let g = grouped.groups();
    let mut rng = rng_for(seed);
    let mut best: Option<(Vec<usize>, f64)> = None;
    let mut starts = 0;
    let mut converged = true;

    let mut consider = |start: Vec<usize>, best: &mut Option<(Vec<usize>, f64)>| {
        let outcome = local_search(grouped, start, floor, SEARCH_ITERATIONS);
        converged &= outcome.converged;
        if best.as_ref().map_or(true, |(_, cost)| outcome.cost < *cost) {
            *best = Some((outcome.cuts, outcome.cost));
        }
    };

    if let Some(start) = grouped.balanced_cuts(k, floor) {
        starts += 1;
        consider(start, &mut best);
    }

    for _ in 0..restarts {
        let mut start: Vec<usize> = rand::seq::index::sample(&mut rng, g - 1, k - 1)
            .into_iter()
            .map(|c| c + 1)
            .collect();
        start.sort_unstable();
        start.insert(0, 0);
        start.push(g);
        if !grouped.is_feasible(&start, floor) {
            // Nudge one random interior cut toward balance before giving up.
            if k > 1 {
                let i = rng.gen_range(1..k);
                start[i] = (start[i - 1] + start[i + 1]) / 2;
            }
            if !grouped.is_feasible(&start, floor) {
                continue;
            }
        }
        starts += 1;
        consider(start, &mut best);
    }

    tracing::debug!(k, starts, restarts, "max-p heuristic search");
    let diagnostics = Diagnostics {
        candidates: Some(starts),
        converged: Some(converged),
        ..Diagnostics::default()
    };
    (best.map(|(cuts, _)| cuts), diagnostics)
}
