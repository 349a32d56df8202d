//! Golden tests for the choropleth kernel.
//!
//! These tests pin exact breaks, assignments and colorings for small inputs
//! and check that seeded methods are reproducible.

use choropleth_kernel::{
    canonical_hash_hex, AdjacencyGraph, Classifier, GreedyColorer, KOptimizer, Method,
    RegionId, Strategy,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Skewed values with a long upper tail, enough for the sampled methods to
/// draw a real subsample.
fn skewed(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = (i * 7919 % n) as f64 / n as f64;
            (x * 6.0).exp()
        })
        .collect()
}

fn path(n: u64) -> AdjacencyGraph {
    AdjacencyGraph::from_edges((1..n).map(|i| (i - 1, i)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Exact breaks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_equal_interval() {
    let clf = Classifier::fit(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0], Method::equal_interval(2))
        .unwrap();
    assert_eq!(clf.breaks().as_slice(), &[50.5, 100.0]);
    assert_eq!(clf.assignments(), &[0, 0, 0, 0, 0, 1]);
    assert_eq!(clf.classification().counts(), vec![5, 1]);
}

#[test]
fn golden_fisher_jenks() {
    let clf = Classifier::fit(&[1.0, 2.0, 2.0, 3.0, 10.0], Method::fisher_jenks(2)).unwrap();
    assert_eq!(clf.breaks().as_slice(), &[3.0, 10.0]);
    assert_eq!(clf.assignments(), &[0, 0, 0, 0, 1]);
}

#[test]
fn golden_quantiles() {
    let values: Vec<f64> = (1..=10).map(f64::from).collect();
    let clf = Classifier::fit(&values, Method::quantiles(4)).unwrap();
    assert_eq!(clf.breaks().as_slice(), &[3.25, 5.5, 7.75, 10.0]);
    assert_eq!(clf.classification().counts(), vec![3, 2, 2, 3]);
}

#[test]
fn golden_user_defined_keeps_breaks() {
    let clf = Classifier::fit(&[1.0, 5.0, 9.0], Method::user_defined(vec![2.0, 20.0])).unwrap();
    assert_eq!(clf.breaks().as_slice(), &[2.0, 20.0]);
    assert_eq!(clf.assignments(), &[0, 1, 1]);
}

#[test]
fn golden_fit_is_one_for_perfect_split() {
    let clf = Classifier::fit(&[1.0, 1.0, 5.0, 5.0], Method::fisher_jenks(2)).unwrap();
    assert_eq!(clf.gadf(), 1.0);
    assert_eq!(clf.classification().within_abs_dev, 0.0);
}

#[test]
fn golden_fisher_jenks_fit_on_extreme_magnitudes() {
    let clf = Classifier::fit(&[-1e308, 0.0, 1e308], Method::fisher_jenks(2)).unwrap();
    assert_eq!(clf.k(), 2);
    assert_eq!(clf.gadf(), 0.5);

    let clf = Classifier::fit(&[-1e308, 0.0, 1e308], Method::equal_interval(2)).unwrap();
    assert_eq!(clf.breaks().as_slice(), &[0.0, 1e308]);
}

#[test]
fn golden_equal_interval_on_ulp_wide_range() {
    let hi = 1.0 + 2.0 * f64::EPSILON;
    let clf = Classifier::fit(&[1.0 + f64::EPSILON, hi], Method::equal_interval(2)).unwrap();
    assert_eq!(clf.breaks().last(), hi);
}

#[test]
fn golden_constant_input() {
    let clf = Classifier::fit(&[4.0, 4.0, 4.0], Method::equal_interval(1)).unwrap();
    assert_eq!(clf.breaks().as_slice(), &[4.0]);
    assert_eq!(clf.gadf(), 1.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Coloring
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_path_natural_coloring() {
    let colorer = GreedyColorer::from_strategy(Strategy::Natural, None);
    let colors = colorer.color(&path(5)).unwrap();
    assert_eq!(colors.as_vec(), vec![0, 1, 0, 1, 0]);
    assert_eq!(colors.num_colors(), 2);
}

#[test]
fn golden_path_balanced_coloring_stays_proper() {
    let graph = path(8);
    let colors = GreedyColorer::default().color(&graph).unwrap();
    assert!(colors.is_proper(&graph));
    // Largest-first visits 1..=6 then the two ends, over a pool of Δ + 1 = 3.
    assert_eq!(colors.as_vec(), vec![1, 0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(colors.counts_per_color(), vec![3, 3, 2]);
    assert_eq!(colors.color_of(RegionId::new(7)), Some(0));
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_same_seed_same_breaks() {
    let values = skewed(3000);
    let methods = [
        Method::fisher_jenks_sampled(5, Some(42)),
        Method::jenks_caspall_sampled(5, Some(42)),
        Method::max_p(4, 2, Some(42)),
        Method::natural_breaks(5, Some(42)),
    ];
    for method in methods {
        let a = Classifier::fit(&values, method.clone()).unwrap();
        let b = Classifier::fit(&values, method.clone()).unwrap();
        assert_eq!(
            a.classification().breaks_fingerprint,
            b.classification().breaks_fingerprint,
            "{method}"
        );
        assert_eq!(a.breaks(), b.breaks(), "{method}");
    }
}

#[test]
fn golden_params_hash_is_stable() {
    let a = Method::jenks_caspall_forced(4, 3);
    let b = Method::jenks_caspall_forced(4, 3);
    assert_eq!(a.params_hash(), b.params_hash());
    assert_ne!(a.params_hash(), Method::jenks_caspall_forced(4, 2).params_hash());
    assert_eq!(a.params_hash().len(), 16);
}

#[test]
fn golden_classification_hash_is_stable() {
    let values = skewed(200);
    let a = Classifier::fit(&values, Method::fisher_jenks(4)).unwrap();
    let b = Classifier::fit(&values, Method::fisher_jenks(4)).unwrap();
    assert_eq!(
        canonical_hash_hex(a.classification()),
        canonical_hash_hex(b.classification())
    );
}

#[test]
fn golden_k_optimizer_trace_is_reproducible() {
    let values = skewed(500);
    let optimizer = KOptimizer::default();
    let a = optimizer.optimize(&values, &Method::fisher_jenks(2)).unwrap();
    let b = optimizer.optimize(&values, &Method::fisher_jenks(2)).unwrap();
    assert_eq!(a.k, b.k);
    assert_eq!(a.trace, b.trace);
    assert_eq!(a.trace.first().map(|p| p.k), Some(2));
}
