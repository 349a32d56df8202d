//! Equal-width, quantile and distribution-based breaks.

use crate::classifier::ClassifyError;
use crate::stats::{quantile_sorted, sample_std};
use crate::types::{Breaks, Observations};

/// Equal-width classes: `min + i * (max - min) / k`, the last break set
/// exactly to the maximum.
///
/// When the range is only a few ulps wide, neighbouring cuts can round onto
/// each other or onto the maximum; those cuts collapse and the result has
/// fewer than `k` classes.
pub fn equal_interval(obs: &Observations, k: usize) -> Result<Breaks, ClassifyError> {
    obs.ensure_k(k)?;
    let (min, max) = (obs.min(), obs.max());
    let n = k as f64;
    let mut width = (max - min) / n;
    if !width.is_finite() {
        // The range itself overflows.
        width = max / n - min / n;
    }
    let mut cuts: Vec<f64> = (1..k)
        .map(|i| min + width * i as f64)
        .filter(|c| *c < max)
        .collect();
    cuts.push(max);
    Breaks::collapsed(cuts)
}

/// Breaks at the `i / k` quantiles.
///
/// Tied data can make neighbouring quantiles coincide; duplicates are
/// collapsed and the result then has fewer than `k` classes.
pub fn quantiles(obs: &Observations, k: usize) -> Result<Breaks, ClassifyError> {
    obs.ensure_k(k)?;
    let sorted = obs.sorted();
    let cuts = (1..=k)
        .map(|i| quantile_sorted(sorted, i as f64 / k as f64))
        .collect();
    Breaks::collapsed(cuts)
}

/// Breaks at fixed percentiles, with the maximum appended when the last
/// percentile falls below it.
pub fn percentiles(obs: &Observations, percentiles: &[f64]) -> Result<Breaks, ClassifyError> {
    let sorted = obs.sorted();
    let mut cuts: Vec<f64> = percentiles
        .iter()
        .map(|p| quantile_sorted(sorted, p / 100.0))
        .collect();
    if cuts.iter().all(|c| *c < obs.max()) {
        cuts.push(obs.max());
    }
    Breaks::collapsed(cuts)
}

/// Breaks at the mean plus multiples of the sample standard deviation.
///
/// Only cuts inside `[min, max)` are kept, then the maximum closes the top
/// class. With `anchor` every integer multiple whose cut lies in that range is
/// used instead of `multiples`.
pub fn std_mean(
    obs: &Observations,
    multiples: &[f64],
    anchor: bool,
) -> Result<Breaks, ClassifyError> {
    let (min, max) = (obs.min(), obs.max());
    let mean = obs.mean();
    let sd = sample_std(obs.values());
    if sd == 0.0 {
        return Breaks::new(vec![max]);
    }

    let raw: Vec<f64> = if anchor {
        let lowest = ((min - mean) / sd).ceil() as i64;
        let highest = ((max - mean) / sd).floor() as i64;
        (lowest..=highest).map(|m| mean + m as f64 * sd).collect()
    } else {
        multiples.iter().map(|m| mean + m * sd).collect()
    };

    let mut cuts: Vec<f64> = raw.into_iter().filter(|c| *c >= min && *c < max).collect();
    cuts.push(max);
    Breaks::collapsed(cuts)
}

/// Lower and upper box-plot fences: `q1 - hinge * iqr` and `q3 + hinge * iqr`.
pub fn box_plot_fences(sorted: &[f64], hinge: f64) -> (f64, f64) {
    let q1 = quantile_sorted(sorted, 0.25);
    let q3 = quantile_sorted(sorted, 0.75);
    let iqr = q3 - q1;
    (q1 - hinge * iqr, q3 + hinge * iqr)
}

/// Box-plot breaks: `[lower fence, q1, median, q3, upper fence, max]`.
///
/// The first class holds low outliers and may be empty. The upper fence is
/// dropped when no value exceeds it, so the last break is always the maximum.
pub fn box_plot(obs: &Observations, hinge: f64) -> Result<Breaks, ClassifyError> {
    let sorted = obs.sorted();
    let max = obs.max();
    let (lower, upper) = box_plot_fences(sorted, hinge);
    let mut cuts = vec![
        lower,
        quantile_sorted(sorted, 0.25),
        quantile_sorted(sorted, 0.5),
        quantile_sorted(sorted, 0.75),
    ];
    if upper < max {
        cuts.push(upper);
    }
    cuts.push(max);
    Breaks::collapsed(cuts)
}

/// Caller-supplied breaks, extended with the maximum when data lies above the
/// last one.
pub fn user_defined(obs: &Observations, breaks: &[f64]) -> Result<Breaks, ClassifyError> {
    let breaks = Breaks::new(breaks.to_vec())?;
    if obs.max() > breaks.last() {
        let mut extended: Vec<f64> = breaks.into();
        extended.push(obs.max());
        return Breaks::new(extended);
    }
    Ok(breaks)
}
