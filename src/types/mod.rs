//! Core data types for the classification engine and the colorer.

pub mod observations;
pub mod breaks;
pub mod classification;
pub mod region;

pub use observations::Observations;
pub use breaks::Breaks;
pub use classification::{Classification, ClassStats, Diagnostics};
pub use region::RegionId;
