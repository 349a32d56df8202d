//! Greedy coloring of region adjacency graphs.
//!
//! Independent of the classifier: takes a pre-built [`AdjacencyGraph`] and
//! returns integer color ids such that no two neighbouring regions share one.

pub mod graph;
pub mod greedy;
pub mod ordering;

pub use graph::AdjacencyGraph;
pub use greedy::{
    Balance, ColorAssignment, ColorChoice, ColoringError, GreedyColorer, Strategy,
    DEFAULT_MIN_COLORS,
};
pub use ordering::{
    ConnectedSequential, GivenOrder, LargestFirst, NaturalOrder, RandomSequential, SmallestLast,
    Traversal, VertexOrdering,
};
