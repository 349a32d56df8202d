//! Region adjacency graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::RegionId;

/// Undirected adjacency between map regions.
///
/// Uses BTreeMap/BTreeSet for deterministic iteration order. Every edge is
/// stored in both directions, so a neighbour list given for one side only is
/// still read symmetrically. Self-loops are kept so the colorer can report
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    neighbors: BTreeMap<RegionId, BTreeSet<RegionId>>,
}

impl AdjacencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list.
    pub fn from_edges<I, R>(edges: I) -> Self
    where
        I: IntoIterator<Item = (R, R)>,
        R: Into<RegionId>,
    {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(a.into(), b.into());
        }
        graph
    }

    /// Build a graph from per-region neighbour lists.
    ///
    /// Regions with an empty list become isolated vertices.
    pub fn from_neighbors<I, N, R>(lists: I) -> Self
    where
        I: IntoIterator<Item = (R, N)>,
        N: IntoIterator<Item = R>,
        R: Into<RegionId>,
    {
        let mut graph = Self::new();
        for (region, neighbors) in lists {
            let region = region.into();
            graph.add_vertex(region);
            for neighbor in neighbors {
                graph.add_edge(region, neighbor.into());
            }
        }
        graph
    }

    /// Add a vertex with no edges. No-op if it already exists.
    pub fn add_vertex(&mut self, region: RegionId) {
        self.neighbors.entry(region).or_default();
    }

    /// Add an undirected edge.
    pub fn add_edge(&mut self, a: RegionId, b: RegionId) {
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    /// Whether the graph has this vertex.
    pub fn contains(&self, region: RegionId) -> bool {
        self.neighbors.contains_key(&region)
    }

    /// All vertices in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.neighbors.keys().copied()
    }

    /// Neighbours of a vertex in ascending order; empty for unknown vertices.
    pub fn neighbors(&self, region: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        self.neighbors
            .get(&region)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of neighbours of a vertex.
    pub fn degree(&self, region: RegionId) -> usize {
        self.neighbors.get(&region).map_or(0, BTreeSet::len)
    }

    /// Largest degree in the graph (Δ).
    pub fn max_degree(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Get number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    /// Get number of undirected edges, self-loops counted once.
    pub fn num_edges(&self) -> usize {
        let loops = self
            .neighbors
            .iter()
            .filter(|(v, set)| set.contains(*v))
            .count();
        let ends: usize = self.neighbors.values().map(BTreeSet::len).sum();
        (ends - loops) / 2 + loops
    }

    /// The smallest vertex adjacent to itself, if any.
    pub fn first_self_loop(&self) -> Option<RegionId> {
        self.neighbors
            .iter()
            .find(|(v, set)| set.contains(*v))
            .map(|(v, _)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: u64) -> RegionId {
        RegionId::new(id)
    }

    #[test]
    fn test_edges_are_symmetric() {
        let graph = AdjacencyGraph::from_edges([(1u64, 2u64), (2, 3)]);
        assert_eq!(graph.neighbors(r(2)).collect::<Vec<_>>(), vec![r(1), r(3)]);
        assert_eq!(graph.neighbors(r(1)).collect::<Vec<_>>(), vec![r(2)]);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.max_degree(), 2);
    }

    #[test]
    fn test_one_sided_neighbor_lists() {
        let graph = AdjacencyGraph::from_neighbors([
            (0u64, vec![1u64, 2]),
            (1, vec![]),
            (2, vec![]),
            (5, vec![]),
        ]);
        assert_eq!(graph.degree(r(1)), 1);
        assert_eq!(graph.degree(r(5)), 0);
        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_self_loop_is_kept() {
        let graph = AdjacencyGraph::from_edges([(1u64, 2u64), (3, 3)]);
        assert_eq!(graph.first_self_loop(), Some(r(3)));
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(AdjacencyGraph::from_edges([(1u64, 2u64)]).first_self_loop(), None);
    }

    #[test]
    fn test_unknown_vertex() {
        let graph = AdjacencyGraph::new();
        assert_eq!(graph.degree(r(9)), 0);
        assert_eq!(graph.neighbors(r(9)).count(), 0);
        assert!(!graph.contains(r(9)));
    }
}
