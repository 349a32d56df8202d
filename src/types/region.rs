//! Region identifiers for the adjacency graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a map region (a vertex of the adjacency graph).
///
/// Implements `Ord` so graphs and colorings iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(u64);

impl RegionId {
    /// Create a region identifier.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RegionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<usize> for RegionId {
    fn from(id: usize) -> Self {
        Self(id as u64)
    }
}
