//! Greedy proper coloring of region adjacency graphs.
//!
//! ## Algorithm
//!
//! 1. Order the vertices with a [`VertexOrdering`]
//! 2. Visit each vertex in that order and pick a color not used by any
//!    already colored neighbour:
//!    - [`ColorChoice::Smallest`]: the smallest free color
//!    - [`ColorChoice::Balanced`]: the least loaded free color of a fixed
//!      pool; when a vertex finds no free pool color the pass restarts with
//!      one more color
//! 3. Done when every vertex has a color
//!
//! A vertex has at most Δ neighbours, so at most Δ + 1 colors are ever used.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::graph::AdjacencyGraph;
use super::ordering::{
    ConnectedSequential, LargestFirst, NaturalOrder, RandomSequential, SmallestLast,
    VertexOrdering,
};
use crate::types::RegionId;

/// Default pool size for balanced coloring.
pub const DEFAULT_MIN_COLORS: usize = 4;

/// Error type for coloring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColoringError {
    /// A region listed as its own neighbour cannot be colored properly.
    #[error("Region {0} is adjacent to itself")]
    SelfLoop(RegionId),
}

/// Load measure for balanced coloring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "weights", rename_all = "snake_case")]
pub enum Balance {
    /// Number of regions per color.
    #[default]
    Count,
    /// Summed caller weight per color (area, population). Regions without a
    /// weight count as 1.
    Weight(BTreeMap<RegionId, f64>),
}

impl Balance {
    fn load_of(&self, region: RegionId) -> f64 {
        match self {
            Self::Count => 1.0,
            Self::Weight(weights) => weights.get(&region).copied().unwrap_or(1.0),
        }
    }
}

/// How a vertex picks among its free colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum ColorChoice {
    /// Smallest free color id.
    Smallest,
    /// Least loaded free color from a pool of `min(min_colors, Δ + 1)`.
    Balanced {
        /// Initial pool size.
        min_colors: usize,
        /// Load measure.
        #[serde(default)]
        balance: Balance,
    },
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Balanced {
            min_colors: DEFAULT_MIN_COLORS,
            balance: Balance::Count,
        }
    }
}

/// Named ordering + choice combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Largest-first order with balanced choice over four colors.
    #[default]
    Balanced,
    /// Largest-first order, smallest color.
    LargestFirst,
    /// Smallest-last order, smallest color.
    SmallestLast,
    /// Seeded random order, smallest color.
    RandomSequential,
    /// Breadth-first order, smallest color.
    ConnectedSequentialBfs,
    /// Depth-first order, smallest color.
    ConnectedSequentialDfs,
    /// Ascending id, smallest color.
    Natural,
}

impl Strategy {
    /// Every strategy.
    pub const ALL: [Strategy; 7] = [
        Self::Balanced,
        Self::LargestFirst,
        Self::SmallestLast,
        Self::RandomSequential,
        Self::ConnectedSequentialBfs,
        Self::ConnectedSequentialDfs,
        Self::Natural,
    ];

    /// The vertex ordering of this strategy. `seed` only affects
    /// [`Strategy::RandomSequential`].
    pub fn ordering(&self, seed: Option<u64>) -> Box<dyn VertexOrdering> {
        match self {
            Self::Balanced | Self::LargestFirst => Box::new(LargestFirst),
            Self::SmallestLast => Box::new(SmallestLast),
            Self::RandomSequential => Box::new(RandomSequential { seed }),
            Self::ConnectedSequentialBfs => Box::new(ConnectedSequential::bfs()),
            Self::ConnectedSequentialDfs => Box::new(ConnectedSequential::dfs()),
            Self::Natural => Box::new(NaturalOrder),
        }
    }

    /// The color choice of this strategy.
    pub fn choice(&self) -> ColorChoice {
        match self {
            Self::Balanced => ColorChoice::default(),
            _ => ColorChoice::Smallest,
        }
    }
}

/// Color of every region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorAssignment {
    colors: BTreeMap<RegionId, usize>,
}

impl ColorAssignment {
    /// Color of a region, if it was colored.
    pub fn color_of(&self, region: RegionId) -> Option<usize> {
        self.colors.get(&region).copied()
    }

    /// Colors in ascending region order.
    pub fn as_vec(&self) -> Vec<usize> {
        self.colors.values().copied().collect()
    }

    /// `(region, color)` pairs in ascending region order.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, usize)> + '_ {
        self.colors.iter().map(|(r, c)| (*r, *c))
    }

    /// Number of colored regions.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no region was colored.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Number of distinct colors used.
    pub fn num_colors(&self) -> usize {
        self.colors.values().collect::<BTreeSet<_>>().len()
    }

    /// Regions per color, indexed by color id.
    pub fn counts_per_color(&self) -> Vec<usize> {
        let size = self.colors.values().max().map_or(0, |m| m + 1);
        let mut counts = vec![0; size];
        for &c in self.colors.values() {
            counts[c] += 1;
        }
        counts
    }

    /// Whether no edge of `graph` joins two regions of the same color.
    pub fn is_proper(&self, graph: &AdjacencyGraph) -> bool {
        graph.vertices().all(|v| {
            graph
                .neighbors(v)
                .all(|n| n == v || self.color_of(v) != self.color_of(n))
        })
    }
}

/// Greedy colorer: an injected vertex ordering plus a color choice rule.
#[derive(Debug)]
pub struct GreedyColorer {
    ordering: Box<dyn VertexOrdering>,
    choice: ColorChoice,
}

impl Default for GreedyColorer {
    fn default() -> Self {
        Self::from_strategy(Strategy::default(), None)
    }
}

impl GreedyColorer {
    /// Create a colorer from an ordering and a choice rule.
    pub fn new(ordering: Box<dyn VertexOrdering>, choice: ColorChoice) -> Self {
        Self { ordering, choice }
    }

    /// Create a colorer for a named strategy.
    pub fn from_strategy(strategy: Strategy, seed: Option<u64>) -> Self {
        Self::new(strategy.ordering(seed), strategy.choice())
    }

    /// The color choice rule.
    pub fn choice(&self) -> &ColorChoice {
        &self.choice
    }

    /// Color every region of `graph`.
    ///
    /// Fails only on a self-loop. Isolated regions get color 0.
    pub fn color(&self, graph: &AdjacencyGraph) -> Result<ColorAssignment, ColoringError> {
        if let Some(region) = graph.first_self_loop() {
            return Err(ColoringError::SelfLoop(region));
        }
        let order = self.ordering.order(graph);

        let colors = match &self.choice {
            ColorChoice::Smallest => color_smallest(graph, &order),
            ColorChoice::Balanced {
                min_colors,
                balance,
            } => color_balanced(graph, &order, *min_colors, balance),
        };
        let assignment = ColorAssignment { colors };

        tracing::debug!(
            ordering = self.ordering.name(),
            regions = assignment.len(),
            colors = assignment.num_colors(),
            "graph colored"
        );
        Ok(assignment)
    }
}

fn used_by_neighbors(
    graph: &AdjacencyGraph,
    region: RegionId,
    colors: &BTreeMap<RegionId, usize>,
) -> BTreeSet<usize> {
    graph
        .neighbors(region)
        .filter_map(|n| colors.get(&n).copied())
        .collect()
}

fn color_smallest(graph: &AdjacencyGraph, order: &[RegionId]) -> BTreeMap<RegionId, usize> {
    let mut colors = BTreeMap::new();
    for &region in order {
        let used = used_by_neighbors(graph, region, &colors);
        let color = (0..).find(|c| !used.contains(c)).unwrap_or(0);
        colors.insert(region, color);
    }
    colors
}

fn color_balanced(
    graph: &AdjacencyGraph,
    order: &[RegionId],
    min_colors: usize,
    balance: &Balance,
) -> BTreeMap<RegionId, usize> {
    let mut pool = min_colors.min(graph.max_degree() + 1).max(1);

    'pass: loop {
        let mut colors = BTreeMap::new();
        let mut loads = vec![0.0_f64; pool];

        for &region in order {
            if graph.degree(region) == 0 {
                colors.insert(region, 0);
                loads[0] += balance.load_of(region);
                continue;
            }
            let used = used_by_neighbors(graph, region, &colors);
            let free = (0..pool)
                .filter(|c| !used.contains(c))
                .min_by(|a, b| loads[*a].total_cmp(&loads[*b]));
            match free {
                Some(color) => {
                    colors.insert(region, color);
                    loads[color] += balance.load_of(region);
                }
                None => {
                    tracing::trace!(pool, %region, "color pool exhausted, widening");
                    pool += 1;
                    continue 'pass;
                }
            }
        }
        return colors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: u64) -> AdjacencyGraph {
        AdjacencyGraph::from_edges((0..n - 1).map(|i| (i, i + 1)))
    }

    #[test]
    fn test_path_natural_order() {
        let colors = GreedyColorer::from_strategy(Strategy::Natural, None)
            .color(&path(5))
            .unwrap();
        assert_eq!(colors.as_vec(), vec![0, 1, 0, 1, 0]);
        assert_eq!(colors.num_colors(), 2);
    }

    #[test]
    fn test_every_strategy_is_proper() {
        let graph = AdjacencyGraph::from_edges([
            (0u64, 1u64),
            (0, 2),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 0),
            (5, 6),
        ]);
        for strategy in Strategy::ALL {
            let colors = GreedyColorer::from_strategy(strategy, Some(9))
                .color(&graph)
                .unwrap();
            assert!(colors.is_proper(&graph), "{strategy:?}");
            assert!(colors.num_colors() <= graph.max_degree() + 1, "{strategy:?}");
            assert_eq!(colors.len(), graph.num_vertices());
        }
    }

    #[test]
    fn test_balanced_spreads_colors() {
        // Star: the leaves can share any color but the centre's.
        let graph = AdjacencyGraph::from_edges((1u64..=8).map(|leaf| (0u64, leaf)));
        let colors = GreedyColorer::default().color(&graph).unwrap();
        assert!(colors.is_proper(&graph));
        assert_eq!(colors.num_colors(), 4);
        assert_eq!(colors.counts_per_color(), vec![1, 3, 3, 2]);

        let smallest = GreedyColorer::from_strategy(Strategy::LargestFirst, None)
            .color(&graph)
            .unwrap();
        assert_eq!(smallest.num_colors(), 2);
    }

    #[test]
    fn test_balanced_pool_limited_by_degree() {
        let colors = GreedyColorer::default().color(&path(4)).unwrap();
        assert!(colors.num_colors() <= 3);
        assert!(colors.is_proper(&path(4)));
    }

    #[test]
    fn test_balanced_widens_pool() {
        // K5 needs five colors; the pool starts at two.
        let mut edges = Vec::new();
        for a in 0u64..5 {
            for b in (a + 1)..5 {
                edges.push((a, b));
            }
        }
        let graph = AdjacencyGraph::from_edges(edges);
        let colorer = GreedyColorer::new(
            Box::new(NaturalOrder),
            ColorChoice::Balanced {
                min_colors: 2,
                balance: Balance::Count,
            },
        );
        let colors = colorer.color(&graph).unwrap();
        assert!(colors.is_proper(&graph));
        assert_eq!(colors.num_colors(), 5);
    }

    #[test]
    fn test_weighted_balance() {
        let graph = AdjacencyGraph::from_edges([(0u64, 1u64), (2, 3), (4, 5)]);
        let mut weights = BTreeMap::new();
        weights.insert(RegionId::new(0), 10.0);
        let colorer = GreedyColorer::new(
            Box::new(NaturalOrder),
            ColorChoice::Balanced {
                min_colors: 2,
                balance: Balance::Weight(weights),
            },
        );
        let colors = colorer.color(&graph).unwrap();
        // Region 0 outweighs the rest, so free choices lean to color 1.
        assert_eq!(colors.as_vec(), vec![0, 1, 1, 0, 1, 0]);

        let by_count = GreedyColorer::new(
            Box::new(NaturalOrder),
            ColorChoice::Balanced {
                min_colors: 2,
                balance: Balance::Count,
            },
        );
        assert_eq!(by_count.color(&graph).unwrap().as_vec(), vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_isolated_and_self_loop() {
        let graph = AdjacencyGraph::from_neighbors([(3u64, vec![]), (7, vec![])]);
        let colors = GreedyColorer::default().color(&graph).unwrap();
        assert_eq!(colors.as_vec(), vec![0, 0]);

        let graph = AdjacencyGraph::from_edges([(1u64, 2u64), (2, 2)]);
        assert_eq!(
            GreedyColorer::default().color(&graph).unwrap_err(),
            ColoringError::SelfLoop(RegionId::new(2))
        );
    }
}
