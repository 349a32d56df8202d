//! Exact optimal partition by dynamic programming.

use crate::classifier::ClassifyError;
use crate::types::{Breaks, Observations};

use super::partition::Grouped;

/// Partition that minimises the summed within-class absolute deviation.
///
/// Runs over distinct-value groups, so equal values always share a class.
/// `O(k * g^2)` time for `g` distinct values. Among equally good partitions
/// the one found first (earliest split points) wins.
pub fn fisher_jenks(obs: &Observations, k: usize) -> Result<Breaks, ClassifyError> {
    obs.ensure_k(k)?;
    let grouped = Grouped::new(obs.sorted());
    let cuts = optimal_cuts(&grouped, k);
    grouped.breaks(&cuts)
}

/// Optimal cut vector `[0, c1, ..., g]` for exactly `k` classes.
///
/// Callers guarantee `1 <= k <= g`.
pub(crate) fn optimal_cuts(grouped: &Grouped<'_>, k: usize) -> Vec<usize> {
    let g = grouped.groups();

    // cost[j][b]: best cost of splitting the first b groups into j + 1 classes.
    // prev[j][b]: where the last of those classes starts.
    let mut cost = vec![vec![f64::INFINITY; g + 1]; k];
    let mut prev = vec![vec![0usize; g + 1]; k];

    for b in 1..=g {
        cost[0][b] = grouped.cost(0, b);
    }

    for j in 1..k {
        for b in (j + 1)..=g {
            let mut best = f64::INFINITY;
            let mut best_start = j;
            for a in j..b {
                let candidate = cost[j - 1][a] + grouped.cost(a, b);
                if candidate < best {
                    best = candidate;
                    best_start = a;
                }
            }
            cost[j][b] = best;
            prev[j][b] = best_start;
        }
    }

    let mut cuts = vec![g];
    let mut b = g;
    for j in (1..k).rev() {
        b = prev[j][b];
        cuts.push(b);
    }
    cuts.push(0);
    cuts.reverse();
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(values: &[f64]) -> Observations {
        Observations::new(values).unwrap()
    }

    #[test]
    fn test_two_natural_groups() {
        let breaks = fisher_jenks(&obs(&[1.0, 2.0, 3.0, 10.0, 11.0, 12.0]), 2).unwrap();
        assert_eq!(breaks.as_slice(), &[3.0, 12.0]);
    }

    #[test]
    fn test_three_clusters() {
        let data = [1.0, 1.5, 2.0, 20.0, 21.0, 22.0, 50.0, 51.0];
        let breaks = fisher_jenks(&obs(&data), 3).unwrap();
        assert_eq!(breaks.as_slice(), &[2.0, 22.0, 51.0]);
    }

    #[test]
    fn test_k_equals_distinct_count() {
        let breaks = fisher_jenks(&obs(&[4.0, 1.0, 4.0, 2.0]), 3).unwrap();
        assert_eq!(breaks.as_slice(), &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_ties_never_split() {
        let data = [1.0, 5.0, 5.0, 5.0, 5.0, 9.0];
        let breaks = fisher_jenks(&obs(&data), 2).unwrap();
        assert!(breaks.as_slice()[0] == 1.0 || breaks.as_slice()[0] == 5.0);
    }

    #[test]
    fn test_rejects_k_above_distinct() {
        assert!(matches!(
            fisher_jenks(&obs(&[1.0, 1.0, 2.0]), 3),
            Err(ClassifyError::TooFewDistinctValues { .. })
        ));
    }

    #[test]
    fn test_single_class() {
        let breaks = fisher_jenks(&obs(&[3.0, 1.0, 2.0]), 1).unwrap();
        assert_eq!(breaks.as_slice(), &[3.0]);
    }
}
