//! The closed set of classification methods and their parameters.
//!
//! Every algorithm is one tagged variant of [`Method`]; the variant is chosen
//! at construction time and dispatched by [`crate::solvers::solve`].

pub mod params;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classifier::ClassifyError;
use params::{
    default_exhaustive_limit, default_hinge, default_max_head_fraction, default_max_iterations,
    default_min_class_size, default_multiples, default_percentiles, default_restarts,
    quantized_params_hash,
};

pub use params::{CentroidInit, SampleParams, DEFAULT_MAX_ITERATIONS};

/// Names of every method, in catalogue order.
pub const CLASSIFIERS: &[&str] = &[
    "box_plot",
    "equal_interval",
    "fisher_jenks",
    "fisher_jenks_sampled",
    "head_tail_breaks",
    "jenks_caspall",
    "jenks_caspall_forced",
    "jenks_caspall_sampled",
    "max_p",
    "maximum_breaks",
    "natural_breaks",
    "quantiles",
    "percentiles",
    "std_mean",
    "user_defined",
];

/// Names of the methods that take a class count `k`.
pub const K_METHODS: &[&str] = &[
    "equal_interval",
    "fisher_jenks",
    "fisher_jenks_sampled",
    "jenks_caspall",
    "jenks_caspall_forced",
    "jenks_caspall_sampled",
    "max_p",
    "maximum_breaks",
    "natural_breaks",
    "quantiles",
];

/// A classification method with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Method {
    /// Equal-width classes over the data range.
    EqualInterval {
        /// Number of classes.
        k: usize,
    },
    /// Classes at the i/k empirical quantiles.
    Quantiles {
        /// Number of classes.
        k: usize,
    },
    /// Classes at fixed percentiles.
    Percentiles {
        /// Percentile cut points in `[0, 100]`.
        #[serde(default = "default_percentiles")]
        percentiles: Vec<f64>,
    },
    /// Classes at mean plus multiples of the standard deviation.
    StdMean {
        /// Multiples of the standard deviation.
        #[serde(default = "default_multiples")]
        multiples: Vec<f64>,
        /// Use every integer multiple inside the data range instead.
        #[serde(default)]
        anchor: bool,
    },
    /// Box-plot fences and quartiles.
    BoxPlot {
        /// Fence multiplier of the inter-quartile range.
        #[serde(default = "default_hinge")]
        hinge: f64,
    },
    /// Recursive mean splits for heavy-tailed data.
    HeadTailBreaks {
        /// Recurse only while the head holds at most this fraction of values.
        #[serde(default = "default_max_head_fraction")]
        max_head_fraction: f64,
        /// Stop when the head would hold fewer values than this.
        #[serde(default = "default_min_class_size")]
        min_head_size: usize,
    },
    /// Exact optimal partition by dynamic programming.
    FisherJenks {
        /// Number of classes.
        k: usize,
    },
    /// Fisher-Jenks on a random subsample.
    FisherJenksSampled {
        /// Number of classes.
        k: usize,
        /// Subsampling parameters.
        #[serde(default)]
        sample: SampleParams,
    },
    /// Boundary local search starting from quantiles.
    JenksCaspall {
        /// Number of classes.
        k: usize,
        /// Iteration cap.
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
    },
    /// Boundary local search with exactly k classes and a size floor.
    JenksCaspallForced {
        /// Number of classes.
        k: usize,
        /// Iteration cap.
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
        /// Minimum observations per class.
        #[serde(default = "default_min_class_size")]
        min_class_size: usize,
    },
    /// Boundary local search on a random subsample.
    JenksCaspallSampled {
        /// Number of classes.
        k: usize,
        /// Iteration cap.
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
        /// Subsampling parameters.
        #[serde(default)]
        sample: SampleParams,
    },
    /// Best-fit partition subject to a minimum class size.
    MaxP {
        /// Number of classes.
        k: usize,
        /// Minimum observations per class.
        #[serde(default = "default_min_class_size")]
        min_class_size: usize,
        /// Enumerate every partition when there are at most this many.
        #[serde(default = "default_exhaustive_limit")]
        exhaustive_limit: usize,
        /// Random starts for the heuristic search.
        #[serde(default = "default_restarts")]
        restarts: usize,
        /// RNG seed; `None` draws from OS entropy.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Breaks at the midpoints of the largest gaps.
    MaximumBreaks {
        /// Number of classes.
        k: usize,
        /// Gaps must exceed this width to be used.
        #[serde(default)]
        min_diff: f64,
    },
    /// One-dimensional k-means.
    NaturalBreaks {
        /// Number of classes.
        k: usize,
        /// Centroid initialisation.
        #[serde(default)]
        init: CentroidInit,
        /// Iteration cap per run.
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
        /// RNG seed; `None` draws from OS entropy.
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Caller-supplied breaks.
    UserDefined {
        /// The breaks.
        breaks: Vec<f64>,
    },
}

impl Method {
    /// Equal interval with k classes.
    pub fn equal_interval(k: usize) -> Self {
        Self::EqualInterval { k }
    }

    /// Quantiles with k classes.
    pub fn quantiles(k: usize) -> Self {
        Self::Quantiles { k }
    }

    /// Default percentiles `[1, 10, 50, 90, 99, 100]`.
    pub fn percentiles() -> Self {
        Self::Percentiles {
            percentiles: default_percentiles(),
        }
    }

    /// Std-mean with multiples `[-2, -1, 1, 2]`.
    pub fn std_mean() -> Self {
        Self::StdMean {
            multiples: default_multiples(),
            anchor: false,
        }
    }

    /// Box plot with the 1.5 IQR hinge.
    pub fn box_plot() -> Self {
        Self::BoxPlot {
            hinge: default_hinge(),
        }
    }

    /// Head/tail breaks with the 40% head threshold.
    pub fn head_tail_breaks() -> Self {
        Self::HeadTailBreaks {
            max_head_fraction: default_max_head_fraction(),
            min_head_size: default_min_class_size(),
        }
    }

    /// Exact Fisher-Jenks with k classes.
    pub fn fisher_jenks(k: usize) -> Self {
        Self::FisherJenks { k }
    }

    /// Sampled Fisher-Jenks with default sampling.
    pub fn fisher_jenks_sampled(k: usize, seed: Option<u64>) -> Self {
        Self::FisherJenksSampled {
            k,
            sample: SampleParams {
                seed,
                ..SampleParams::default()
            },
        }
    }

    /// Jenks-Caspall with the default iteration cap.
    pub fn jenks_caspall(k: usize) -> Self {
        Self::JenksCaspall {
            k,
            max_iterations: default_max_iterations(),
        }
    }

    /// Forced Jenks-Caspall with a class size floor.
    pub fn jenks_caspall_forced(k: usize, min_class_size: usize) -> Self {
        Self::JenksCaspallForced {
            k,
            max_iterations: default_max_iterations(),
            min_class_size,
        }
    }

    /// Sampled Jenks-Caspall with default sampling.
    pub fn jenks_caspall_sampled(k: usize, seed: Option<u64>) -> Self {
        Self::JenksCaspallSampled {
            k,
            max_iterations: default_max_iterations(),
            sample: SampleParams {
                seed,
                ..SampleParams::default()
            },
        }
    }

    /// Max-P with a class size floor.
    pub fn max_p(k: usize, min_class_size: usize, seed: Option<u64>) -> Self {
        Self::MaxP {
            k,
            min_class_size,
            exhaustive_limit: default_exhaustive_limit(),
            restarts: default_restarts(),
            seed,
        }
    }

    /// Maximum breaks with k classes.
    pub fn maximum_breaks(k: usize) -> Self {
        Self::MaximumBreaks { k, min_diff: 0.0 }
    }

    /// Natural breaks with random restarts.
    pub fn natural_breaks(k: usize, seed: Option<u64>) -> Self {
        Self::NaturalBreaks {
            k,
            init: CentroidInit::default(),
            max_iterations: default_max_iterations(),
            seed,
        }
    }

    /// User-defined breaks.
    pub fn user_defined(breaks: Vec<f64>) -> Self {
        Self::UserDefined { breaks }
    }

    /// Build a method by name with default parameters.
    ///
    /// `k` is required by the k-parameterised methods and ignored otherwise.
    /// Randomised methods get `seed: None`.
    pub fn from_name(name: &str, k: Option<usize>) -> Result<Self, ClassifyError> {
        let name = name.trim().to_lowercase().replace(['-', ' '], "_");
        let need_k = || {
            k.ok_or_else(|| ClassifyError::InvalidParameter {
                name: "k",
                reason: format!("method `{name}` requires k"),
            })
        };
        let method = match name.as_str() {
            "equal_interval" => Self::equal_interval(need_k()?),
            "quantiles" => Self::quantiles(need_k()?),
            "percentiles" => Self::percentiles(),
            "std_mean" => Self::std_mean(),
            "box_plot" => Self::box_plot(),
            "head_tail_breaks" => Self::head_tail_breaks(),
            "fisher_jenks" => Self::fisher_jenks(need_k()?),
            "fisher_jenks_sampled" => Self::fisher_jenks_sampled(need_k()?, None),
            "jenks_caspall" => Self::jenks_caspall(need_k()?),
            "jenks_caspall_forced" => Self::jenks_caspall_forced(need_k()?, 1),
            "jenks_caspall_sampled" => Self::jenks_caspall_sampled(need_k()?, None),
            "max_p" => Self::max_p(need_k()?, 1, None),
            "maximum_breaks" => Self::maximum_breaks(need_k()?),
            "natural_breaks" => Self::natural_breaks(need_k()?, None),
            "user_defined" => {
                return Err(ClassifyError::InvalidParameter {
                    name: "breaks",
                    reason: "user_defined needs explicit breaks".to_string(),
                })
            }
            _ => return Err(ClassifyError::UnknownMethod(name.clone())),
        };
        Ok(method)
    }

    /// Stable snake-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EqualInterval { .. } => "equal_interval",
            Self::Quantiles { .. } => "quantiles",
            Self::Percentiles { .. } => "percentiles",
            Self::StdMean { .. } => "std_mean",
            Self::BoxPlot { .. } => "box_plot",
            Self::HeadTailBreaks { .. } => "head_tail_breaks",
            Self::FisherJenks { .. } => "fisher_jenks",
            Self::FisherJenksSampled { .. } => "fisher_jenks_sampled",
            Self::JenksCaspall { .. } => "jenks_caspall",
            Self::JenksCaspallForced { .. } => "jenks_caspall_forced",
            Self::JenksCaspallSampled { .. } => "jenks_caspall_sampled",
            Self::MaxP { .. } => "max_p",
            Self::MaximumBreaks { .. } => "maximum_breaks",
            Self::NaturalBreaks { .. } => "natural_breaks",
            Self::UserDefined { .. } => "user_defined",
        }
    }

    /// Requested class count for k-parameterised methods.
    pub fn k(&self) -> Option<usize> {
        match self {
            Self::EqualInterval { k }
            | Self::Quantiles { k }
            | Self::FisherJenks { k }
            | Self::FisherJenksSampled { k, .. }
            | Self::JenksCaspall { k, .. }
            | Self::JenksCaspallForced { k, .. }
            | Self::JenksCaspallSampled { k, .. }
            | Self::MaxP { k, .. }
            | Self::MaximumBreaks { k, .. }
            | Self::NaturalBreaks { k, .. } => Some(*k),
            Self::Percentiles { .. }
            | Self::StdMean { .. }
            | Self::BoxPlot { .. }
            | Self::HeadTailBreaks { .. }
            | Self::UserDefined { .. } => None,
        }
    }

    /// The same method with a different class count.
    ///
    /// `None` for methods whose k is implied by their parameters.
    pub fn with_k(&self, new_k: usize) -> Option<Self> {
        let mut method = self.clone();
        match &mut method {
            Self::EqualInterval { k }
            | Self::Quantiles { k }
            | Self::FisherJenks { k }
            | Self::FisherJenksSampled { k, .. }
            | Self::JenksCaspall { k, .. }
            | Self::JenksCaspallForced { k, .. }
            | Self::JenksCaspallSampled { k, .. }
            | Self::MaxP { k, .. }
            | Self::MaximumBreaks { k, .. }
            | Self::NaturalBreaks { k, .. } => *k = new_k,
            _ => return None,
        }
        Some(method)
    }

    /// Whether the method draws random numbers.
    pub fn is_randomized(&self) -> bool {
        match self {
            Self::FisherJenksSampled { .. }
            | Self::JenksCaspallSampled { .. }
            | Self::MaxP { .. } => true,
            Self::NaturalBreaks { init, .. } => matches!(init, CentroidInit::Random { .. }),
            _ => false,
        }
    }

    /// The same method with its RNG seed fixed. No-op for deterministic methods.
    pub fn with_seed(&self, new_seed: u64) -> Self {
        let mut method = self.clone();
        match &mut method {
            Self::FisherJenksSampled { sample, .. } | Self::JenksCaspallSampled { sample, .. } => {
                sample.seed = Some(new_seed)
            }
            Self::MaxP { seed, .. } | Self::NaturalBreaks { seed, .. } => *seed = Some(new_seed),
            _ => {}
        }
        method
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if let Some(k) = self.k() {
            if k == 0 {
                return Err(ClassifyError::InvalidK { k });
            }
        }
        match self {
            Self::Percentiles { percentiles } => {
                if percentiles.is_empty() {
                    return Err(invalid("percentiles", "at least one percentile is required"));
                }
                if percentiles.iter().any(|p| !(0.0..=100.0).contains(p)) {
                    return Err(invalid("percentiles", "percentiles must lie in [0, 100]"));
                }
            }
            Self::StdMean { multiples, anchor } => {
                if !anchor && multiples.iter().any(|m| !m.is_finite()) {
                    return Err(invalid("multiples", "multiples must be finite"));
                }
            }
            Self::BoxPlot { hinge } => {
                if !(hinge.is_finite() && *hinge >= 0.0) {
                    return Err(invalid("hinge", "hinge must be finite and non-negative"));
                }
            }
            Self::HeadTailBreaks {
                max_head_fraction,
                min_head_size,
            } => {
                if !(*max_head_fraction > 0.0 && *max_head_fraction <= 1.0) {
                    return Err(invalid("max_head_fraction", "must lie in (0, 1]"));
                }
                if *min_head_size == 0 {
                    return Err(invalid("min_head_size", "must be at least 1"));
                }
            }
            Self::FisherJenksSampled { sample, .. } => validate_sample(sample)?,
            Self::JenksCaspall { max_iterations, .. } => validate_iterations(*max_iterations)?,
            Self::JenksCaspallForced {
                max_iterations,
                min_class_size,
                ..
            } => {
                validate_iterations(*max_iterations)?;
                if *min_class_size == 0 {
                    return Err(invalid("min_class_size", "must be at least 1"));
                }
            }
            Self::JenksCaspallSampled {
                max_iterations,
                sample,
                ..
            } => {
                validate_iterations(*max_iterations)?;
                validate_sample(sample)?;
            }
            Self::MaxP {
                min_class_size,
                restarts,
                ..
            } => {
                if *min_class_size == 0 {
                    return Err(invalid("min_class_size", "must be at least 1"));
                }
                if *restarts == 0 {
                    return Err(invalid("restarts", "must be at least 1"));
                }
            }
            Self::MaximumBreaks { min_diff, .. } => {
                if !(min_diff.is_finite() && *min_diff >= 0.0) {
                    return Err(invalid("min_diff", "must be finite and non-negative"));
                }
            }
            Self::NaturalBreaks {
                init,
                max_iterations,
                ..
            } => {
                validate_iterations(*max_iterations)?;
                if let CentroidInit::Random { restarts: 0 } = init {
                    return Err(invalid("restarts", "must be at least 1"));
                }
            }
            Self::EqualInterval { .. }
            | Self::Quantiles { .. }
            | Self::FisherJenks { .. }
            | Self::UserDefined { .. } => {}
        }
        Ok(())
    }

    /// Hash of the method and its parameters.
    ///
    /// Floats are quantized before hashing; see [`params`].
    pub fn params_hash(&self) -> String {
        quantized_params_hash(self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.k() {
            Some(k) => write!(f, "{}(k={})", self.name(), k),
            None => write!(f, "{}", self.name()),
        }
    }
}

fn invalid(name: &'static str, reason: &str) -> ClassifyError {
    ClassifyError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

fn validate_iterations(max_iterations: usize) -> Result<(), ClassifyError> {
    if max_iterations == 0 {
        return Err(invalid("max_iterations", "must be at least 1"));
    }
    Ok(())
}

fn validate_sample(sample: &SampleParams) -> Result<(), ClassifyError> {
    if !(sample.fraction > 0.0 && sample.fraction <= 1.0) {
        return Err(invalid("fraction", "sample fraction must lie in (0, 1]"));
    }
    Ok(())
}
