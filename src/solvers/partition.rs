//! Contiguous partitions of sorted data over distinct-value groups.
//!
//! The optimal-partition solvers never split a run of equal values, so they
//! work on *group boundaries*: boundary `b` sits before the `b`-th distinct
//! value. A partition into `k` classes is a strictly increasing cut vector
//! `[0, c1, ..., c(k-1), g]` over the `g` groups.
//!
//! The class cost is the sum of absolute deviations around the class median,
//! which makes every solver here agree with the fit score.

use crate::classifier::ClassifyError;
use crate::stats::SegmentCost;
use crate::types::Breaks;

/// Sorted data with group boundaries and prefix sums.
#[derive(Debug, Clone)]
pub(crate) struct Grouped<'a> {
    sorted: &'a [f64],
    costs: SegmentCost,
    /// Start position of every group, followed by `n`.
    bounds: Vec<usize>,
}

impl<'a> Grouped<'a> {
    pub(crate) fn new(sorted: &'a [f64]) -> Self {
        let mut bounds = Vec::new();
        for (i, v) in sorted.iter().enumerate() {
            if i == 0 || sorted[i - 1] < *v {
                bounds.push(i);
            }
        }
        bounds.push(sorted.len());
        Self {
            sorted,
            costs: SegmentCost::new(sorted),
            bounds,
        }
    }

    /// Number of distinct-value groups.
    pub(crate) fn groups(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Number of observations.
    pub(crate) fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Observations between two group boundaries.
    pub(crate) fn count(&self, from: usize, to: usize) -> usize {
        self.bounds[to] - self.bounds[from]
    }

    /// Within-class cost of the groups between two boundaries, in scaled
    /// units (see [`SegmentCost::scaled_abs_dev`]).
    pub(crate) fn cost(&self, from: usize, to: usize) -> f64 {
        self.costs.scaled_abs_dev(self.bounds[from], self.bounds[to])
    }

    /// Total cost of a partition.
    pub(crate) fn total_cost(&self, cuts: &[usize]) -> f64 {
        cuts.windows(2).map(|w| self.cost(w[0], w[1])).sum()
    }

    /// Whether every class of a partition holds at least `floor` observations.
    pub(crate) fn is_feasible(&self, cuts: &[usize], floor: usize) -> bool {
        cuts.windows(2).all(|w| w[0] < w[1] && self.count(w[0], w[1]) >= floor)
    }

    /// Breaks of a partition: the largest value of every class.
    pub(crate) fn breaks(&self, cuts: &[usize]) -> Result<Breaks, ClassifyError> {
        Breaks::new(
            cuts[1..]
                .iter()
                .map(|&c| self.sorted[self.bounds[c] - 1])
                .collect(),
        )
    }

    /// Partition induced by arbitrary break values.
    ///
    /// Classes that would be empty are dropped, so the result may have fewer
    /// classes than there are breaks.
    pub(crate) fn cuts_for(&self, breaks: &Breaks) -> Vec<usize> {
        let g = self.groups();
        let firsts: Vec<f64> = self.bounds[..g].iter().map(|&p| self.sorted[p]).collect();
        let mut cuts = vec![0];
        for &b in breaks.as_slice() {
            let c = firsts.partition_point(|v| *v <= b);
            if c > cuts[cuts.len() - 1] {
                cuts.push(c);
            }
        }
        if cuts[cuts.len() - 1] < g {
            let last = cuts.len() - 1;
            if last == 0 {
                cuts.push(g);
            } else {
                cuts[last] = g;
            }
        }
        cuts
    }

    /// Greedy split into exactly `k` classes of roughly equal count, each
    /// holding at least `floor` observations.
    pub(crate) fn balanced_cuts(&self, k: usize, floor: usize) -> Option<Vec<usize>> {
        let g = self.groups();
        let n = self.len();
        if k == 0 || k > g || n < k * floor {
            return None;
        }
        let mut cuts = vec![0];
        let mut b = 0;
        let mut used = 0;
        for class in 0..k - 1 {
            let remaining = k - class;
            let target = (((n - used) as f64 / remaining as f64).round() as usize).max(floor);
            let limit = g - (remaining - 1);
            let mut count = 0;
            while b < limit && count < target {
                count += self.count(b, b + 1);
                b += 1;
            }
            if count < floor {
                return None;
            }
            cuts.push(b);
            used += count;
        }
        cuts.push(g);
        self.is_feasible(&cuts, floor).then_some(cuts)
    }
}

/// Result of a boundary local search.
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub cuts: Vec<usize>,
    pub cost: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Move single groups across class boundaries while that strictly lowers the
/// total cost.
///
/// Each iteration scans the boundaries left to right. At each boundary the
/// nearest group on either side may move into the neighbouring class; the
/// better strictly improving move is applied (ties go to the leftward move).
/// A move is rejected when it would leave a class with fewer than `floor`
/// observations or with no group at all. Stops after an iteration without a
/// move, or at `max_iterations`.
pub(crate) fn local_search(
    grouped: &Grouped<'_>,
    mut cuts: Vec<usize>,
    floor: usize,
    max_iterations: usize,
) -> SearchOutcome {
    let mut cost = grouped.total_cost(&cuts);
    let tolerance = 1e-12 * cost.abs().max(1.0);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;
        let mut moved = false;

        for i in 1..cuts.len() - 1 {
            let (lo, mid, hi) = (cuts[i - 1], cuts[i], cuts[i + 1]);
            let current = grouped.cost(lo, mid) + grouped.cost(mid, hi);

            let left_move = (mid - 1 > lo && grouped.count(lo, mid - 1) >= floor)
                .then(|| grouped.cost(lo, mid - 1) + grouped.cost(mid - 1, hi) - current);
            let right_move = (mid + 1 < hi && grouped.count(mid + 1, hi) >= floor)
                .then(|| grouped.cost(lo, mid + 1) + grouped.cost(mid + 1, hi) - current);

            let best = match (left_move, right_move) {
                (Some(l), Some(r)) if r < l => Some((mid + 1, r)),
                (Some(l), _) => Some((mid - 1, l)),
                (None, Some(r)) => Some((mid + 1, r)),
                (None, None) => None,
            };

            if let Some((new_cut, delta)) = best {
                if delta < -tolerance {
                    cuts[i] = new_cut;
                    cost += delta;
                    moved = true;
                }
            }
        }

        tracing::trace!(iteration = iterations, cost, moved, "local search pass");

        if !moved {
            converged = true;
            break;
        }
    }

    SearchOutcome {
        cost: grouped.total_cost(&cuts),
        cuts,
        iterations,
        converged,
    }
}
