//! Choosing the number of classes.

pub mod k_classifiers;
pub mod k_optimizer;

pub use k_classifiers::{KCandidate, KClassifiers, KRanking};
pub use k_optimizer::{KOptimizer, KOptimizerParams, KOptimum, KSweepPoint};
