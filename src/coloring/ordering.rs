//! Vertex visiting orders for the greedy colorer.
//!
//! The coloring loop never changes; only the order in which it visits
//! vertices does. Every ordering returns each vertex of the graph exactly
//! once, and is deterministic for a fixed graph (and seed, where one applies).

use rand::seq::SliceRandom;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use super::graph::AdjacencyGraph;
use crate::solvers::sampling::rng_for;
use crate::types::RegionId;

/// Policy deciding the order in which vertices are colored.
pub trait VertexOrdering: fmt::Debug + Send + Sync {
    /// Every vertex of `graph`, each exactly once, in visiting order.
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Ascending region id.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl VertexOrdering for NaturalOrder {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        graph.vertices().collect()
    }

    fn name(&self) -> &'static str {
        "natural"
    }
}

/// Descending degree, ties by ascending id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestFirst;

impl VertexOrdering for LargestFirst {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        let mut order: Vec<RegionId> = graph.vertices().collect();
        // Stable sort keeps ascending id within a degree.
        order.sort_by(|a, b| graph.degree(*b).cmp(&graph.degree(*a)));
        order
    }

    fn name(&self) -> &'static str {
        "largest_first"
    }
}

/// Smallest-last (degeneracy) order.
///
/// Repeatedly removes a vertex of minimum degree in the remaining graph
/// (ties by ascending id); vertices are visited in reverse removal order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestLast;

impl VertexOrdering for SmallestLast {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        let mut degree: std::collections::BTreeMap<RegionId, usize> = graph
            .vertices()
            .map(|v| (v, graph.neighbors(v).filter(|n| *n != v).count()))
            .collect();
        let mut queue: BTreeSet<(usize, RegionId)> =
            degree.iter().map(|(v, d)| (*d, *v)).collect();
        let mut removed = Vec::with_capacity(degree.len());

        while let Some((_, v)) = queue.pop_first() {
            degree.remove(&v);
            for n in graph.neighbors(v) {
                if let Some(d) = degree.get_mut(&n) {
                    queue.remove(&(*d, n));
                    *d -= 1;
                    queue.insert((*d, n));
                }
            }
            removed.push(v);
        }

        removed.reverse();
        removed
    }

    fn name(&self) -> &'static str {
        "smallest_last"
    }
}

/// Random permutation from a seeded RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSequential {
    /// RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl VertexOrdering for RandomSequential {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        let mut order: Vec<RegionId> = graph.vertices().collect();
        order.shuffle(&mut rng_for(self.seed));
        order
    }

    fn name(&self) -> &'static str {
        "random_sequential"
    }
}

/// Graph traversal used by [`ConnectedSequential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Breadth-first.
    Bfs,
    /// Depth-first (preorder).
    Dfs,
}

/// Traversal order, so that every vertex after the first of its component
/// has an already visited neighbour.
///
/// Components are entered at their smallest id; neighbours are explored in
/// ascending id order.
#[derive(Debug, Clone, Copy)]
pub struct ConnectedSequential {
    /// BFS or DFS.
    pub traversal: Traversal,
}

impl ConnectedSequential {
    /// Breadth-first traversal.
    pub fn bfs() -> Self {
        Self {
            traversal: Traversal::Bfs,
        }
    }

    /// Depth-first traversal.
    pub fn dfs() -> Self {
        Self {
            traversal: Traversal::Dfs,
        }
    }
}

impl VertexOrdering for ConnectedSequential {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        let mut visited = BTreeSet::new();
        let mut order = Vec::with_capacity(graph.num_vertices());

        for root in graph.vertices() {
            if visited.contains(&root) {
                continue;
            }
            match self.traversal {
                Traversal::Bfs => {
                    let mut queue = VecDeque::from([root]);
                    visited.insert(root);
                    while let Some(v) = queue.pop_front() {
                        order.push(v);
                        for n in graph.neighbors(v) {
                            if visited.insert(n) {
                                queue.push_back(n);
                            }
                        }
                    }
                }
                Traversal::Dfs => {
                    let mut stack = vec![root];
                    while let Some(v) = stack.pop() {
                        if !visited.insert(v) {
                            continue;
                        }
                        order.push(v);
                        let mut next: Vec<RegionId> =
                            graph.neighbors(v).filter(|n| !visited.contains(n)).collect();
                        next.reverse();
                        stack.extend(next);
                    }
                }
            }
        }
        order
    }

    fn name(&self) -> &'static str {
        match self.traversal {
            Traversal::Bfs => "connected_sequential_bfs",
            Traversal::Dfs => "connected_sequential_dfs",
        }
    }
}

/// Caller-given order.
///
/// Ids not in the graph and repeats are ignored; vertices the order leaves
/// out are appended in ascending id.
#[derive(Debug, Clone, Default)]
pub struct GivenOrder(pub Vec<RegionId>);

impl VertexOrdering for GivenOrder {
    fn order(&self, graph: &AdjacencyGraph) -> Vec<RegionId> {
        let mut seen = BTreeSet::new();
        let mut order: Vec<RegionId> = self
            .0
            .iter()
            .copied()
            .filter(|v| graph.contains(*v) && seen.insert(*v))
            .collect();
        order.extend(graph.vertices().filter(|v| !seen.contains(v)));
        order
    }

    fn name(&self) -> &'static str {
        "given"
    }
}
