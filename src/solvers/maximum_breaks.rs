//! Breaks at the widest gaps between neighbouring values.

use crate::classifier::ClassifyError;
use crate::stats::midpoint;
use crate::types::{Breaks, Observations};

/// Midpoints of the `k - 1` widest gaps between consecutive distinct values,
/// followed by the maximum.
///
/// Only gaps wider than `min_diff` qualify; with fewer qualifying gaps the
/// result has fewer classes. Equal gaps are taken left to right.
pub fn maximum_breaks(
    obs: &Observations,
    k: usize,
    min_diff: f64,
) -> Result<Breaks, ClassifyError> {
    obs.ensure_k(k)?;
    let mut distinct = obs.sorted().to_vec();
    distinct.dedup();

    let mut gaps: Vec<(usize, f64)> = distinct
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i, w[1] - w[0]))
        .filter(|(_, gap)| *gap > min_diff)
        .collect();
    // Stable sort keeps the earlier gap first on ties.
    gaps.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut cuts: Vec<f64> = gaps
        .iter()
        .take(k - 1)
        .map(|&(i, _)| midpoint(distinct[i], distinct[i + 1]))
        .collect();
    cuts.sort_by(f64::total_cmp);
    cuts.push(obs.max());
    Breaks::collapsed(cuts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(values: &[f64]) -> Observations {
        Observations::new(values).unwrap()
    }

    #[test]
    fn test_widest_gaps() {
        let data = [1.0, 2.0, 3.0, 10.0, 11.0, 30.0];
        let breaks = maximum_breaks(&obs(&data), 3, 0.0).unwrap();
        assert_eq!(breaks.as_slice(), &[6.5, 20.5, 30.0]);
    }

    #[test]
    fn test_equal_gaps_prefer_earlier() {
        let data = [0.0, 5.0, 10.0, 15.0];
        let breaks = maximum_breaks(&obs(&data), 2, 0.0).unwrap();
        assert_eq!(breaks.as_slice(), &[2.5, 15.0]);
    }

    #[test]
    fn test_min_diff_filters_gaps() {
        let data = [1.0, 2.0, 3.0, 10.0];
        let breaks = maximum_breaks(&obs(&data), 3, 2.0).unwrap();
        assert_eq!(breaks.as_slice(), &[6.5, 10.0]);
    }

    #[test]
    fn test_duplicates_ignored() {
        let data = [1.0, 1.0, 1.0, 4.0, 4.0, 5.0];
        let breaks = maximum_breaks(&obs(&data), 2, 0.0).unwrap();
        assert_eq!(breaks.as_slice(), &[2.5, 5.0]);
    }
}
