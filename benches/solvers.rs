//! Performance benchmarks for the break solvers and the colorer.
//!
//! Run with: `cargo bench --bench solvers`
//!
//! ## Scaling
//!
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | Baseline methods | O(n log n) | Dominated by the sort |
//! | Fisher-Jenks | O(k g²) | g = distinct values |
//! | Fisher-Jenks sampled | O(k s²) | s ≤ 1000 |
//! | K-Optimizer | O(K · solver) | Stops at the fit target |
//! | Greedy coloring | O(V + E) per pass | Balanced may restart |

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};

use choropleth_kernel::{
    AdjacencyGraph, Classifier, GreedyColorer, KOptimizer, Method, Observations,
    PooledClassifier, Strategy,
};

/// Deterministic skewed values.
fn skewed(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = ((i * 7919) % n) as f64 / n as f64;
            (x * 5.0).exp()
        })
        .collect()
}

/// Grid of `side × side` regions with rook adjacency.
fn grid(side: u64) -> AdjacencyGraph {
    let mut edges = Vec::new();
    for row in 0..side {
        for col in 0..side {
            let id = row * side + col;
            if col + 1 < side {
                edges.push((id, id + 1));
            }
            if row + 1 < side {
                edges.push((id, id + side));
            }
        }
    }
    AdjacencyGraph::from_edges(edges)
}

fn bench_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("baseline");

    for n in [1_000usize, 10_000, 100_000] {
        let values = skewed(n);
        group.throughput(Throughput::Elements(n as u64));
        for method in [
            Method::equal_interval(5),
            Method::quantiles(5),
            Method::box_plot(),
            Method::head_tail_breaks(),
        ] {
            group.bench_with_input(BenchmarkId::new(method.name(), n), &values, |b, values| {
                b.iter(|| Classifier::fit(black_box(values), method.clone()))
            });
        }
    }

    group.finish();
}

fn bench_optimal(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimal_partition");
    group.sample_size(20);

    for n in [100usize, 500, 1_000] {
        let obs = Observations::new(&skewed(n)).unwrap();
        group.throughput(Throughput::Elements(n as u64));
        for method in [
            Method::fisher_jenks(5),
            Method::jenks_caspall(5),
            Method::natural_breaks(5, Some(1)),
        ] {
            group.bench_with_input(BenchmarkId::new(method.name(), n), &obs, |b, obs| {
                b.iter(|| Classifier::fit_observations(black_box(obs.clone()), method.clone()))
            });
        }
    }

    group.finish();
}

fn bench_sampled(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampled");
    group.sample_size(20);

    let values = skewed(50_000);
    group.throughput(Throughput::Elements(values.len() as u64));
    for method in [
        Method::fisher_jenks_sampled(5, Some(7)),
        Method::jenks_caspall_sampled(5, Some(7)),
    ] {
        group.bench_function(method.name(), |b| {
            b.iter(|| Classifier::fit(black_box(&values), method.clone()))
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10);

    let values = skewed(500);
    group.bench_function("k_optimizer_fisher_jenks", |b| {
        let optimizer = KOptimizer::default();
        let method = Method::fisher_jenks(2);
        b.iter(|| optimizer.optimize(black_box(&values), &method))
    });

    let arrays: Vec<Vec<f64>> = (0..10).map(|_| skewed(200)).collect();
    group.bench_function("pooled_fisher_jenks_10x200", |b| {
        let pooled = PooledClassifier::new(Method::fisher_jenks(5));
        b.iter(|| pooled.fit(black_box(&arrays)))
    });

    group.finish();
}

fn bench_coloring(c: &mut Criterion) {
    let mut group = c.benchmark_group("coloring");

    for side in [10u64, 50, 100] {
        let graph = grid(side);
        group.throughput(Throughput::Elements(graph.num_vertices() as u64));
        for strategy in [Strategy::Balanced, Strategy::LargestFirst, Strategy::SmallestLast] {
            let colorer = GreedyColorer::from_strategy(strategy, None);
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), side * side),
                &graph,
                |b, graph| b.iter(|| colorer.color(black_box(graph))),
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_baseline,
    bench_optimal,
    bench_sampled,
    bench_selection,
    bench_coloring
);
criterion_main!(benches);
