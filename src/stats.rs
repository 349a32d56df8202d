//! Stateless statistics over (data, breaks) pairs.
//!
//! Every solver and the classifier share these helpers. Nothing here keeps
//! state between calls: class statistics and fit are always recomputed from
//! the observations and the breaks they are asked about.

use crate::types::{Breaks, ClassStats};

/// Quantile of sorted data using linear interpolation between order
/// statistics (position `p * (n - 1)`).
///
/// `p` is clamped to `[0, 1]`. Returns `NaN` for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let j = h.floor() as usize;
    let g = h - h.floor();
    if j + 1 >= n {
        return sorted[n - 1];
    }
    let (lo, hi) = (sorted[j], sorted[j + 1]);
    let gap = hi - lo;
    if gap.is_finite() {
        (lo + g * gap).min(hi)
    } else {
        lo * (1.0 - g) + hi * g
    }
}

/// Midpoint of two finite values, without overflowing near the f64 limits.
pub fn midpoint(a: f64, b: f64) -> f64 {
    let mid = (a + b) / 2.0;
    if mid.is_finite() {
        mid
    } else {
        a / 2.0 + b / 2.0
    }
}

/// Median of sorted data.
pub fn median_sorted(sorted: &[f64]) -> f64 {
    quantile_sorted(sorted, 0.5)
}

/// Sample standard deviation (n - 1 denominator). Zero for a single value.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Magnitude above which [`SegmentCost`] rescales its input.
///
/// Below it, squares of every value and sums over any realistic run length
/// stay finite.
const RESCALE_ABOVE: f64 = 3.1e144; // ~2^480

/// Power-of-two unit used for data beyond [`RESCALE_ABOVE`].
const LARGE_UNIT: f64 = 4.149515568880993e180; // 2^600

/// Prefix sums over sorted data for O(1) run costs.
///
/// Runs are half-open index ranges `[start, end)` of the sorted array.
/// Very large magnitudes are divided by a power-of-two unit before summing,
/// so the `scaled_*` costs stay finite for any finite input. Ratios of
/// scaled costs equal ratios of the true costs.
#[derive(Debug, Clone)]
pub struct SegmentCost {
    prefix: Vec<f64>,
    prefix_sq: Vec<f64>,
    unit: f64,
}

impl SegmentCost {
    /// Build prefix sums for sorted data.
    pub fn new(sorted: &[f64]) -> Self {
        let magnitude = match (sorted.first(), sorted.last()) {
            (Some(lo), Some(hi)) => lo.abs().max(hi.abs()),
            _ => 0.0,
        };
        let unit = if magnitude > RESCALE_ABOVE { LARGE_UNIT } else { 1.0 };

        let mut prefix = Vec::with_capacity(sorted.len() + 1);
        let mut prefix_sq = Vec::with_capacity(sorted.len() + 1);
        prefix.push(0.0);
        prefix_sq.push(0.0);
        let (mut s, mut sq) = (0.0, 0.0);
        for &v in sorted {
            let v = v / unit;
            s += v;
            sq += v * v;
            prefix.push(s);
            prefix_sq.push(sq);
        }
        Self {
            prefix,
            prefix_sq,
            unit,
        }
    }

    /// The unit scaled costs are expressed in (1.0 unless the data is huge).
    pub fn unit(&self) -> f64 {
        self.unit
    }

    /// Sum of values in a run.
    pub fn sum(&self, start: usize, end: usize) -> f64 {
        (self.prefix[end] - self.prefix[start]) * self.unit
    }

    /// Mean of a run; `NaN` for an empty run.
    pub fn mean(&self, start: usize, end: usize) -> f64 {
        (self.prefix[end] - self.prefix[start]) / (end - start) as f64 * self.unit
    }

    /// Sum of absolute deviations around the run median, in units of
    /// [`unit`](Self::unit).
    ///
    /// For sorted data this is the sum of the upper half minus the sum of the
    /// lower half; the middle element of an odd run cancels out.
    pub fn scaled_abs_dev(&self, start: usize, end: usize) -> f64 {
        let half = (end - start) / 2;
        let lower = self.prefix[start + half] - self.prefix[start];
        let upper = self.prefix[end] - self.prefix[end - half];
        (upper - lower).max(0.0)
    }

    /// Sum of absolute deviations around the run median.
    pub fn abs_dev(&self, start: usize, end: usize) -> f64 {
        self.scaled_abs_dev(start, end) * self.unit
    }

    /// Sum of squared deviations around the run mean, in units of
    /// `unit()²`.
    pub fn scaled_sq_dev(&self, start: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        if n == 0.0 {
            return 0.0;
        }
        let s = self.prefix[end] - self.prefix[start];
        let sq = self.prefix_sq[end] - self.prefix_sq[start];
        (sq - s * s / n).max(0.0)
    }

    /// Sum of squared deviations around the run mean.
    pub fn sq_dev(&self, start: usize, end: usize) -> f64 {
        self.scaled_sq_dev(start, end) * self.unit * self.unit
    }
}

/// Index ranges of each class within the sorted data.
///
/// Class `c` holds the sorted values `v` with `b(c-1) < v <= b(c)`; the top
/// class also takes everything above the last break.
pub fn class_ranges(sorted: &[f64], breaks: &Breaks) -> Vec<(usize, usize)> {
    let b = breaks.as_slice();
    let k = b.len();
    let mut ranges = Vec::with_capacity(k);
    let mut start = 0;
    for (c, &upper) in b.iter().enumerate() {
        let end = if c + 1 == k {
            sorted.len()
        } else {
            sorted.partition_point(|v| *v <= upper)
        };
        let end = end.max(start);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Per-class statistics for sorted data under the given breaks.
pub fn class_stats(sorted: &[f64], breaks: &Breaks) -> Vec<ClassStats> {
    let costs = SegmentCost::new(sorted);
    let b = breaks.as_slice();
    class_ranges(sorted, breaks)
        .into_iter()
        .enumerate()
        .map(|(c, (start, end))| {
            let count = end - start;
            let run = &sorted[start..end];
            let (mean, median) = if count == 0 {
                (None, None)
            } else {
                (Some(costs.mean(start, end)), Some(median_sorted(run)))
            };
            ClassStats {
                count,
                lower: if c == 0 { None } else { Some(b[c - 1]) },
                upper: b[c],
                mean,
                median,
                abs_dev: costs.abs_dev(start, end),
                sq_dev: costs.sq_dev(start, end),
            }
        })
        .collect()
}

/// Sum of absolute deviations of sorted data around its median.
pub fn global_abs_dev(sorted: &[f64]) -> f64 {
    SegmentCost::new(sorted).abs_dev(0, sorted.len())
}

/// Total sum of squares around the mean.
pub fn total_sum_of_squares(sorted: &[f64]) -> f64 {
    SegmentCost::new(sorted).sq_dev(0, sorted.len())
}

/// Goodness of absolute deviation fit.
///
/// `1 - within / global`, where `within` is the summed within-class absolute
/// deviation and `global` the deviation of all data around its median.
/// Data with no spread fits perfectly.
pub fn gadf(within: f64, global: f64) -> f64 {
    if global <= 0.0 {
        return 1.0;
    }
    (1.0 - within / global).clamp(0.0, 1.0)
}

/// Fit score of sorted data under the given breaks.
///
/// Computed on scaled costs, so it stays meaningful even when the absolute
/// deviations themselves overflow.
pub fn fit_of(sorted: &[f64], breaks: &Breaks) -> f64 {
    let costs = SegmentCost::new(sorted);
    let within: f64 = class_ranges(sorted, breaks)
        .into_iter()
        .map(|(start, end)| costs.scaled_abs_dev(start, end))
        .sum();
    gadf(within, costs.scaled_abs_dev(0, sorted.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_abs_dev(run: &[f64]) -> f64 {
        let m = median_sorted(run);
        run.iter().map(|v| (v - m).abs()).sum()
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&data, 0.0), 1.0);
        assert_eq!(quantile_sorted(&data, 1.0), 4.0);
        assert!((quantile_sorted(&data, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&data, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_segment_abs_dev_matches_brute_force() {
        let sorted = [1.0, 2.0, 2.0, 3.0, 7.0, 10.0, 11.0];
        let costs = SegmentCost::new(&sorted);
        for start in 0..sorted.len() {
            for end in start..=sorted.len() {
                let expected = if start == end { 0.0 } else { brute_abs_dev(&sorted[start..end]) };
                assert!(
                    (costs.abs_dev(start, end) - expected).abs() < 1e-9,
                    "run {start}..{end}"
                );
            }
        }
    }

    #[test]
    fn test_segment_sq_dev() {
        let sorted = [1.0, 2.0, 3.0];
        let costs = SegmentCost::new(&sorted);
        assert!((costs.sq_dev(0, 3) - 2.0).abs() < 1e-12);
        assert_eq!(costs.sq_dev(1, 1), 0.0);
    }

    #[test]
    fn test_class_stats_counts_and_bounds() {
        let sorted = [1.0, 2.0, 2.0, 3.0, 10.0];
        let breaks = Breaks::new(vec![3.0, 10.0]).unwrap();
        let stats = class_stats(&sorted, &breaks);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 4);
        assert_eq!(stats[1].count, 1);
        assert_eq!(stats[0].mean, Some(2.0));
        assert_eq!(stats[0].lower, None);
        assert_eq!(stats[1].lower, Some(3.0));
        assert!((stats[0].abs_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats[1].abs_dev, 0.0);
    }

    #[test]
    fn test_class_stats_empty_class() {
        let sorted = [5.0, 6.0];
        let breaks = Breaks::new(vec![1.0, 6.0]).unwrap();
        let stats = class_stats(&sorted, &breaks);
        assert_eq!(stats[0].count, 0);
        assert_eq!(stats[0].mean, None);
        assert_eq!(stats[1].count, 2);
    }

    #[test]
    fn test_huge_magnitudes_keep_finite_costs() {
        let sorted = [-1e308, 0.0, 1e308];
        let costs = SegmentCost::new(&sorted);
        assert!(costs.unit() > 1.0);
        assert!(costs.scaled_abs_dev(0, 3).is_finite());
        assert_eq!(costs.mean(0, 2), -1e308 / 2.0);
        assert_eq!(costs.abs_dev(1, 3), 1e308);

        let breaks = Breaks::new(vec![-1e308, 1e308]).unwrap();
        assert_eq!(fit_of(&sorted, &breaks), 0.5);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(1.0, 4.0), 2.5);
        assert_eq!(midpoint(f64::MAX, f64::MAX), f64::MAX);
    }

    #[test]
    fn test_quantile_across_overflowing_gap() {
        let q = quantile_sorted(&[-1e308, 1e308], 0.5);
        assert!(q.is_finite());
        assert_eq!(q, 0.0);
    }

    #[test]
    fn test_gadf_bounds() {
        assert_eq!(gadf(0.0, 10.0), 1.0);
        assert_eq!(gadf(10.0, 10.0), 0.0);
        assert_eq!(gadf(0.0, 0.0), 1.0);
        let sorted = [1.0, 2.0, 2.0, 3.0, 10.0];
        let one = Breaks::new(vec![10.0]).unwrap();
        assert_eq!(fit_of(&sorted, &one), 0.0);
    }
}
