//! Break-point solvers.
//!
//! One pure function per algorithm, all taking validated [`Observations`] and
//! returning breaks whose last value is the data maximum (user-defined breaks
//! excepted). [`solve`] dispatches a [`Method`] to its solver.

pub mod baseline;
pub mod fisher_jenks;
pub mod head_tail;
pub mod jenks_caspall;
pub mod max_p;
pub mod maximum_breaks;
pub mod natural_breaks;
pub(crate) mod partition;
pub(crate) mod sampling;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifyError;
use crate::method::{Method, SampleParams};
use crate::types::{Breaks, Diagnostics, Observations};

pub use max_p::MaxPParams;

/// Breaks produced by a solver, with run diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The break points.
    pub breaks: Breaks,
    /// Iterations, convergence and sampling details.
    pub diagnostics: Diagnostics,
}

impl From<Breaks> for Solution {
    fn from(breaks: Breaks) -> Self {
        Self {
            breaks,
            diagnostics: Diagnostics::default(),
        }
    }
}

/// Run the solver for `method` on `obs`.
pub fn solve(method: &Method, obs: &Observations) -> Result<Solution, ClassifyError> {
    method.validate()?;
    tracing::debug!(method = %method, n = obs.len(), "solving breaks");

    let solution = match method {
        Method::EqualInterval { k } => baseline::equal_interval(obs, *k)?.into(),
        Method::Quantiles { k } => baseline::quantiles(obs, *k)?.into(),
        Method::Percentiles { percentiles } => baseline::percentiles(obs, percentiles)?.into(),
        Method::StdMean { multiples, anchor } => {
            baseline::std_mean(obs, multiples, *anchor)?.into()
        }
        Method::BoxPlot { hinge } => baseline::box_plot(obs, *hinge)?.into(),
        Method::HeadTailBreaks {
            max_head_fraction,
            min_head_size,
        } => head_tail::head_tail_breaks(obs, *max_head_fraction, *min_head_size)?.into(),
        Method::FisherJenks { k } => fisher_jenks::fisher_jenks(obs, *k)?.into(),
        Method::FisherJenksSampled { k, sample } => on_sample(obs, sample, *k, |data| {
            fisher_jenks::fisher_jenks(data, *k).map(Solution::from)
        })?,
        Method::JenksCaspall { k, max_iterations } => {
            jenks_caspall::jenks_caspall(obs, *k, *max_iterations)?
        }
        Method::JenksCaspallForced {
            k,
            max_iterations,
            min_class_size,
        } => jenks_caspall::jenks_caspall_forced(obs, *k, *max_iterations, *min_class_size)?,
        Method::JenksCaspallSampled {
            k,
            max_iterations,
            sample,
        } => on_sample(obs, sample, *k, |data| {
            jenks_caspall::jenks_caspall(data, *k, *max_iterations)
        })?,
        Method::MaxP {
            k,
            min_class_size,
            exhaustive_limit,
            restarts,
            seed,
        } => max_p::max_p(
            obs,
            MaxPParams {
                k: *k,
                min_class_size: *min_class_size,
                exhaustive_limit: *exhaustive_limit,
                restarts: *restarts,
                seed: *seed,
            },
        )?,
        Method::MaximumBreaks { k, min_diff } => {
            maximum_breaks::maximum_breaks(obs, *k, *min_diff)?.into()
        }
        Method::NaturalBreaks {
            k,
            init,
            max_iterations,
            seed,
        } => natural_breaks::natural_breaks(obs, *k, init, *max_iterations, *seed)?,
        Method::UserDefined { breaks } => baseline::user_defined(obs, breaks)?.into(),
    };

    tracing::debug!(
        method = method.name(),
        k = solution.breaks.k(),
        "breaks solved"
    );
    Ok(solution)
}

/// Fit on a subsample when one can be drawn, otherwise on the full data.
fn on_sample<F>(
    obs: &Observations,
    params: &SampleParams,
    k: usize,
    fit: F,
) -> Result<Solution, ClassifyError>
where
    F: Fn(&Observations) -> Result<Solution, ClassifyError>,
{
    obs.ensure_k(k)?;
    match sampling::subsample(obs, params, k)? {
        Some(sample) => {
            let mut solution = fit(&sample)?;
            solution.diagnostics.sample_size = Some(sample.len());
            Ok(solution)
        }
        None => fit(obs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Observations {
        let values: Vec<f64> = (0..n).map(|i| (i as f64).powf(1.5)).collect();
        Observations::new(&values).unwrap()
    }

    #[test]
    fn test_every_method_ends_at_max() {
        let obs = ramp(60);
        for name in crate::method::CLASSIFIERS
            .iter()
            .filter(|n| **n != "user_defined")
        {
            let method = Method::from_name(name, Some(4)).unwrap().with_seed(1);
            let solution = solve(&method, &obs).unwrap();
            assert_eq!(solution.breaks.last(), obs.max(), "{name}");
        }
    }

    #[test]
    fn test_sampled_records_sample_size() {
        let obs = ramp(2000);
        let solution = solve(&Method::fisher_jenks_sampled(5, Some(3)), &obs).unwrap();
        assert_eq!(solution.diagnostics.sample_size, Some(202));
        assert_eq!(solution.breaks.k(), 5);
        assert_eq!(solution.breaks.last(), obs.max());
    }

    #[test]
    fn test_sampled_falls_back_on_small_input() {
        let obs = ramp(12);
        let method = Method::FisherJenksSampled {
            k: 3,
            sample: SampleParams {
                fraction: 1.0,
                ..SampleParams::seeded(3)
            },
        };
        let sampled = solve(&method, &obs).unwrap();
        let exact = solve(&Method::fisher_jenks(3), &obs).unwrap();
        assert_eq!(sampled.diagnostics.sample_size, None);
        assert_eq!(sampled.breaks, exact.breaks);
    }

    #[test]
    fn test_validation_runs_first() {
        let obs = ramp(10);
        assert!(matches!(
            solve(&Method::quantiles(0), &obs),
            Err(ClassifyError::InvalidK { k: 0 })
        ));
    }
}
