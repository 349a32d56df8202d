//! Head/tail breaks for heavy-tailed distributions.

use crate::classifier::ClassifyError;
use crate::types::{Breaks, Observations};

/// Recursive mean splits.
///
/// Records the mean of the current values, keeps the head (values strictly
/// above the mean) and repeats while the head holds at most
/// `max_head_fraction` of the current values, has at least `min_head_size`
/// values and is not a single repeated value. Breaks are the recorded means
/// followed by the maximum.
pub fn head_tail_breaks(
    obs: &Observations,
    max_head_fraction: f64,
    min_head_size: usize,
) -> Result<Breaks, ClassifyError> {
    let mut current = obs.sorted();
    let mut cuts = Vec::new();

    loop {
        let top = current[current.len() - 1];
        // Float summation can overshoot the largest value by an ulp.
        let mean = (current.iter().sum::<f64>() / current.len() as f64).min(top);
        cuts.push(mean);

        let head = &current[current.partition_point(|v| *v <= mean)..];
        if head.is_empty() || head[0] == top {
            break;
        }
        let fraction = head.len() as f64 / current.len() as f64;
        if fraction > max_head_fraction || head.len() < min_head_size {
            tracing::trace!(fraction, head = head.len(), "head/tail recursion stopped");
            break;
        }
        current = head;
    }

    if cuts.iter().all(|c| *c < obs.max()) {
        cuts.push(obs.max());
    }
    Breaks::collapsed(cuts)
}
