//! # choropleth-kernel
//!
//! Deterministic class-break computation and greedy map coloring for
//! choropleth maps.
//!
//! The kernel answers two questions:
//!
//! > Given a column of values, where should the class boundaries go?
//!
//! > Given which regions touch, which color does each region get?
//!
//! ## Core Contract
//!
//! 1. Validate the values once ([`Observations`]): non-empty, all finite
//! 2. Compute upper class bounds ([`Breaks`]) with one of fifteen [`Method`]s
//! 3. Assign every value to a class and report the fit (GADF) with diagnostics
//! 4. Optionally sweep k ([`KOptimizer`]), rank families ([`KClassifiers`]) or
//!    share breaks across arrays ([`PooledClassifier`])
//!
//! ## Architecture
//!
//! ```text
//! values → Observations → Method → solvers::solve → Breaks → Classification
//!                                                      ↑
//!                          KOptimizer / KClassifiers / PooledClassifier
//!
//! AdjacencyGraph → VertexOrdering → GreedyColorer → ColorAssignment
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same values + same method + same seed → bit-identical breaks
//! - Randomness only from a seeded `StdRng` created per call
//! - Graphs and colorings iterate in ascending region id
//!
//! ## Example
//!
//! ```
//! use choropleth_kernel::{Classifier, Method};
//!
//! let clf = Classifier::fit(&[1.0, 2.0, 2.0, 3.0, 10.0], Method::fisher_jenks(2)).unwrap();
//! assert_eq!(clf.breaks().as_slice(), &[3.0, 10.0]);
//! assert_eq!(clf.assignments(), &[0, 0, 0, 0, 1]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod classifier;
pub mod coloring;
pub mod method;
pub mod pooled;
pub mod select;
pub mod solvers;
pub mod stats;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use classifier::{Classifier, ClassifyError, Outliers};
pub use coloring::{
    AdjacencyGraph, Balance, ColorAssignment, ColorChoice, ColoringError, GreedyColorer,
    Strategy, VertexOrdering,
};
pub use method::{CentroidInit, Method, SampleParams, CLASSIFIERS, K_METHODS};
pub use pooled::{Pooled, PooledClassifier};
pub use select::{KCandidate, KClassifiers, KOptimizer, KOptimizerParams, KOptimum, KRanking};
pub use solvers::{solve, MaxPParams, Solution};
pub use types::{Breaks, ClassStats, Classification, Diagnostics, Observations, RegionId};
