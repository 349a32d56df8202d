//! Seeded random number generation and subsampling.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::classifier::ClassifyError;
use crate::method::SampleParams;
use crate::types::Observations;

/// RNG for one call: seeded when a seed is given, OS entropy otherwise.
pub(crate) fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draw a subsample for the sampled solvers.
///
/// The sample is drawn without replacement and always contains the minimum
/// and maximum, so breaks fitted on it cover the full data range. Returns
/// `None` when the sample would be the whole array or would hold fewer than
/// `k` distinct values; callers then fit on the full data.
pub(crate) fn subsample(
    obs: &Observations,
    params: &SampleParams,
    k: usize,
) -> Result<Option<Observations>, ClassifyError> {
    let n = obs.len();
    let size = params.sample_size(n).max(2);
    if size >= n {
        return Ok(None);
    }

    let mut rng = rng_for(params.seed);
    let values = obs.values();
    let mut sample: Vec<f64> = rand::seq::index::sample(&mut rng, n, size)
        .into_iter()
        .map(|i| values[i])
        .collect();
    sample.push(obs.min());
    sample.push(obs.max());

    let sample = Observations::new(&sample)?;
    if sample.distinct_count() < k {
        tracing::warn!(
            sample_size = sample.len(),
            distinct = sample.distinct_count(),
            k,
            "sample too small for k classes, fitting on full data"
        );
        return Ok(None);
    }
    Ok(Some(sample))
}
