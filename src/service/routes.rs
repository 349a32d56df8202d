//! Axum routes for the choropleth service.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::classifier::{ClassifyError, Classifier};
use crate::coloring::{
    AdjacencyGraph, Balance, ColorChoice, ColoringError, GreedyColorer, Strategy,
    DEFAULT_MIN_COLORS,
};
use crate::method::{Method, CLASSIFIERS};
use crate::pooled::PooledClassifier;
use crate::select::{KClassifiers, KOptimizer, KOptimizerParams, KSweepPoint};
use crate::types::{Classification, RegionId};

use super::middleware::{record_classification_metrics, record_coloring_metrics};
use super::state::{LimitExceeded, MethodRef, ServiceState};

/// Shared state handed to every handler.
pub type AppState = ServiceState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to classify one array.
///
/// Exactly one of `method_ref` (a registered parameter set) or `method`
/// (inline parameters) is used; `method_ref` wins when both are given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Values to classify.
    pub values: Vec<f64>,
    /// Inline method parameters.
    #[serde(default)]
    pub method: Option<Method>,
    /// Reference to a registered method.
    #[serde(default)]
    pub method_ref: Option<MethodRef>,
}

/// Response containing a classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// The fitted classification.
    pub classification: Classification,
    /// Method used.
    pub method_ref: MethodRef,
}

/// Request to classify several arrays against shared breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledRequest {
    /// Arrays to pool; lengths may differ.
    pub arrays: Vec<Vec<f64>>,
    /// Inline method parameters.
    #[serde(default)]
    pub method: Option<Method>,
    /// Reference to a registered method.
    #[serde(default)]
    pub method_ref: Option<MethodRef>,
}

/// Pooled classification response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledResponse {
    /// The shared breaks.
    pub breaks: Vec<f64>,
    /// Classification of the concatenated values.
    pub global: Classification,
    /// One classification per input array, in input order.
    pub per_array: Vec<Classification>,
    /// Whether every array carries bit-identical breaks.
    pub breaks_consistent: bool,
    /// Method used.
    pub method_ref: MethodRef,
}

/// Request to choose a class count.
///
/// With a method (inline or by reference) the K-Optimizer sweeps that method;
/// without one every k family is ranked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Values to classify.
    pub values: Vec<f64>,
    /// Inline method parameters.
    #[serde(default)]
    pub method: Option<Method>,
    /// Reference to a registered method.
    #[serde(default)]
    pub method_ref: Option<MethodRef>,
    /// Sweep bounds and fit target.
    #[serde(default)]
    pub params: KOptimizerParams,
    /// Seed for randomised families when ranking.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One row of a family ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// Method name.
    pub method: String,
    /// Chosen k.
    pub k: usize,
    /// Fit at that k.
    pub fit: f64,
    /// Whether the target was reached.
    pub target_met: bool,
}

/// K-selection response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    /// Chosen k.
    pub k: usize,
    /// Fit at the chosen k.
    pub fit: f64,
    /// Whether the fit target was reached.
    pub target_met: bool,
    /// Classification at the chosen k.
    pub classification: Classification,
    /// Method of the chosen classification.
    pub method_ref: MethodRef,
    /// `(k, fit)` per evaluated k; empty when ranking families.
    pub trace: Vec<KSweepPoint>,
    /// Family ranking; empty for a single-method sweep.
    pub ranking: Vec<CandidateSummary>,
}

/// Request to color a region adjacency graph.
///
/// `edges` and `neighbors` are merged; ids listed only as `neighbors` keys
/// become isolated regions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorRequest {
    /// Undirected edges.
    #[serde(default)]
    pub edges: Vec<(u64, u64)>,
    /// Per-region neighbour lists.
    #[serde(default)]
    pub neighbors: BTreeMap<u64, Vec<u64>>,
    /// Coloring strategy.
    #[serde(default)]
    pub strategy: Strategy,
    /// Seed for random orderings.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Initial pool for balanced coloring.
    #[serde(default)]
    pub min_colors: Option<usize>,
    /// Per-region weights for balanced coloring; counts are balanced when absent.
    #[serde(default)]
    pub weights: Option<BTreeMap<u64, f64>>,
}

/// Coloring response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorResponse {
    /// Color per region.
    pub colors: BTreeMap<u64, usize>,
    /// Number of distinct colors.
    pub num_colors: usize,
    /// Regions per color id.
    pub counts_per_color: Vec<usize>,
    /// Strategy used.
    pub strategy: Strategy,
}

/// Request to register a new method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterMethodRequest {
    /// Method parameters to register.
    pub method: Method,
}

/// Response containing a method reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRefResponse {
    /// Reference to the registered method.
    pub method_ref: MethodRef,
}

/// List of registered methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodListResponse {
    /// Registered parameter sets.
    pub methods: Vec<MethodRef>,
    /// Registry fingerprint.
    pub registry_fingerprint: String,
    /// Every method name the service understands.
    pub catalogue: Vec<String>,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" when the service answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Number of registered methods.
    pub method_count: usize,
    /// Registry fingerprint.
    pub registry_fingerprint: String,
    /// Largest number of values accepted in one request.
    pub max_observations: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always "alive".
    pub status: String,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub error: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&ClassifyError> for ErrorResponse {
    fn from(e: &ClassifyError) -> Self {
        let response = Self::new(e.code(), e.to_string());
        match e {
            ClassifyError::InvalidArray { source, .. } => response.with_details(source.code()),
            _ => response,
        }
    }
}

fn bad_request(e: ClassifyError) -> ApiError {
    tracing::debug!(code = e.code(), error = %e, "rejected request");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the method of a request (registered reference first).
fn resolve_method(
    state: &AppState,
    method: Option<Method>,
    method_ref: Option<MethodRef>,
) -> Result<(Method, MethodRef), ApiError> {
    if let Some(method_ref) = method_ref {
        let registry = state.registry();
        let method = registry.resolve(&method_ref).cloned().ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(
                    ErrorResponse::new(
                        "METHOD_NOT_FOUND",
                        format!("Method not registered: {}", method_ref.method),
                    )
                    .with_details(method_ref.params_hash.clone()),
                ),
            )
        })?;
        return Ok((method, method_ref));
    }

    match method {
        Some(method) => {
            let method_ref = MethodRef::from_method(&method);
            Ok((method, method_ref))
        }
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "MISSING_METHOD",
                "Either `method` or `method_ref` is required",
            )),
        )),
    }
}

fn check_limits(state: &AppState, method: &Method) -> Result<(), ApiError> {
    state
        .config
        .limits
        .check_method(method)
        .map_err(limit_exceeded)
}

fn limit_exceeded(e: LimitExceeded) -> ApiError {
    tracing::debug!(name = e.name, value = e.value, limit = e.limit, "search limit exceeded");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("SEARCH_LIMIT_EXCEEDED", e.to_string()).with_details(e.name)),
    )
}

/// Run CPU-bound work on the blocking pool, off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("INTERNAL_ERROR", "Computation failed")),
        )
    })?
}

fn check_size(state: &AppState, n: usize) -> Result<(), ApiError> {
    let max = state.config.max_observations;
    if n > max {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(
                ErrorResponse::new(
                    "TOO_MANY_OBSERVATIONS",
                    format!("Request holds {} values, limit is {}", n, max),
                )
                .with_details(max.to_string()),
            ),
        ));
    }
    Ok(())
}

fn record(classifier: &Classifier) {
    record_classification_metrics(
        classifier.method().name(),
        classifier.observations().len(),
        classifier.k(),
        classifier.gadf(),
    );
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Classify one array.
async fn classify_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    check_size(&state, request.values.len())?;
    let (method, method_ref) = resolve_method(&state, request.method, request.method_ref)?;
    check_limits(&state, &method)?;

    let values = request.values;
    let classifier =
        blocking(move || Classifier::fit(&values, method).map_err(bad_request)).await?;
    record(&classifier);

    Ok(Json(ClassifyResponse {
        classification: classifier.into_classification(),
        method_ref,
    }))
}

/// Classify several arrays against shared breaks.
async fn pooled_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PooledRequest>,
) -> Result<Json<PooledResponse>, ApiError> {
    check_size(&state, request.arrays.iter().map(Vec::len).sum())?;
    let (method, method_ref) = resolve_method(&state, request.method, request.method_ref)?;
    check_limits(&state, &method)?;

    let arrays = request.arrays;
    let pooled = blocking(move || {
        PooledClassifier::new(method)
            .fit(&arrays)
            .map_err(bad_request)
    })
    .await?;
    record(&pooled.global);

    let breaks_consistent = pooled.breaks_consistent();
    Ok(Json(PooledResponse {
        breaks: pooled.breaks.into(),
        global: pooled.global.into_classification(),
        per_array: pooled
            .per_array
            .into_iter()
            .map(Classifier::into_classification)
            .collect(),
        breaks_consistent,
        method_ref,
    }))
}

/// Choose k for one method, or rank every k family.
async fn optimize_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    check_size(&state, request.values.len())?;
    state
        .config
        .limits
        .check_sweep(&request.params)
        .map_err(limit_exceeded)?;
    let values = request.values;

    if request.method.is_none() && request.method_ref.is_none() {
        let mut ranker = KClassifiers::new(request.params);
        if let Some(seed) = request.seed {
            ranker = ranker.with_seed(seed);
        }
        let ranking = blocking(move || ranker.rank(&values).map_err(bad_request)).await?;
        let summary = ranking
            .table
            .iter()
            .map(|c| CandidateSummary {
                method: c.method.clone(),
                k: c.k,
                fit: c.fit,
                target_met: c.target_met,
            })
            .collect();
        let best = ranking.table.into_iter().next().ok_or_else(|| {
            bad_request(ClassifyError::InvalidParameter {
                name: "values",
                reason: "no k family could classify the values".to_string(),
            })
        })?;
        record(&best.classifier);

        return Ok(Json(OptimizeResponse {
            k: best.k,
            fit: best.fit,
            target_met: best.target_met,
            method_ref: MethodRef::from_method(best.classifier.method()),
            classification: best.classifier.into_classification(),
            trace: Vec::new(),
            ranking: summary,
        }));
    }

    let (method, _) = resolve_method(&state, request.method, request.method_ref)?;
    check_limits(&state, &method)?;
    let optimizer = KOptimizer::new(request.params);
    let optimum =
        blocking(move || optimizer.optimize(&values, &method).map_err(bad_request)).await?;
    record(&optimum.classifier);

    Ok(Json(OptimizeResponse {
        k: optimum.k,
        fit: optimum.fit,
        target_met: optimum.target_met,
        method_ref: MethodRef::from_method(optimum.classifier.method()),
        classification: optimum.classifier.into_classification(),
        trace: optimum.trace,
        ranking: Vec::new(),
    }))
}

/// Color a region adjacency graph.
async fn color_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ColorRequest>,
) -> Result<Json<ColorResponse>, ApiError> {
    let mut graph = AdjacencyGraph::from_neighbors(request.neighbors);
    for (a, b) in request.edges {
        graph.add_edge(RegionId::new(a), RegionId::new(b));
    }
    check_size(&state, graph.num_vertices())?;

    let choice = match request.strategy.choice() {
        ColorChoice::Balanced { .. } => ColorChoice::Balanced {
            min_colors: request.min_colors.unwrap_or(DEFAULT_MIN_COLORS),
            balance: request.weights.map_or(Balance::Count, |weights| {
                Balance::Weight(
                    weights
                        .into_iter()
                        .map(|(id, w)| (RegionId::new(id), w))
                        .collect(),
                )
            }),
        },
        choice => choice,
    };
    let colorer = GreedyColorer::new(request.strategy.ordering(request.seed), choice);

    let (graph, assignment) = blocking(move || {
        let assignment = colorer.color(&graph).map_err(|e| {
            let ColoringError::SelfLoop(region) = &e;
            (
                StatusCode::BAD_REQUEST,
                Json(
                    ErrorResponse::new("SELF_LOOP", e.to_string())
                        .with_details(region.to_string()),
                ),
            )
        })?;
        Ok((graph, assignment))
    })
    .await?;
    record_coloring_metrics(
        colorer_name(request.strategy),
        graph.num_vertices(),
        assignment.num_colors(),
    );

    Ok(Json(ColorResponse {
        num_colors: assignment.num_colors(),
        counts_per_color: assignment.counts_per_color(),
        colors: assignment
            .iter()
            .map(|(region, color)| (region.as_u64(), color))
            .collect(),
        strategy: request.strategy,
    }))
}

fn colorer_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Balanced => "balanced",
        Strategy::LargestFirst => "largest_first",
        Strategy::SmallestLast => "smallest_last",
        Strategy::RandomSequential => "random_sequential",
        Strategy::ConnectedSequentialBfs => "connected_sequential_bfs",
        Strategy::ConnectedSequentialDfs => "connected_sequential_dfs",
        Strategy::Natural => "natural",
    }
}

/// List registered methods.
async fn list_methods_handler(State(state): State<Arc<AppState>>) -> Json<MethodListResponse> {
    let registry = state.registry();
    Json(MethodListResponse {
        methods: registry.list(),
        registry_fingerprint: registry.fingerprint().to_string(),
        catalogue: CLASSIFIERS.iter().map(|name| name.to_string()).collect(),
    })
}

/// Register a new method.
async fn register_method_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterMethodRequest>,
) -> Result<Json<MethodRefResponse>, ApiError> {
    request.method.validate().map_err(bad_request)?;
    check_limits(&state, &request.method)?;
    let method_ref = state.registry_mut().register(request.method);
    tracing::info!(method = %method_ref.method, params_hash = %method_ref.params_hash, "method registered");
    Ok(Json(MethodRefResponse { method_ref }))
}

/// Health check endpoint.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registry = state.registry();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        method_count: registry.len(),
        registry_fingerprint: registry.fingerprint().to_string(),
        max_observations: state.config.max_observations,
    })
}

/// Liveness probe endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the choropleth service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Classification
        .route("/api/classify", post(classify_handler))
        .route("/api/classify/pooled", post(pooled_handler))
        .route("/api/optimize", post(optimize_handler))
        // Coloring
        .route("/api/color", post(color_handler))
        // Method registry
        .route("/api/methods", get(list_methods_handler).post(register_method_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::state::ServiceConfig;

    fn state() -> Arc<AppState> {
        Arc::new(ServiceState::new(ServiceConfig::default()))
    }

    fn classify(values: Vec<f64>, method: Method) -> ClassifyRequest {
        ClassifyRequest {
            values,
            method: Some(method),
            method_ref: None,
        }
    }

    #[tokio::test]
    async fn test_classify_inline_method() {
        let request = classify(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0], Method::equal_interval(2));
        let Json(response) = classify_handler(State(state()), Json(request)).await.unwrap();
        assert_eq!(response.classification.breaks.as_slice(), &[50.5, 100.0]);
        assert_eq!(response.method_ref.method, "equal_interval");
    }

    #[tokio::test]
    async fn test_classify_by_registered_ref() {
        let state = state();
        let method_ref = state.registry_mut().register(Method::fisher_jenks(2));
        let request = ClassifyRequest {
            values: vec![1.0, 2.0, 2.0, 3.0, 10.0],
            method: None,
            method_ref: Some(method_ref.clone()),
        };
        let Json(response) = classify_handler(State(state), Json(request)).await.unwrap();
        assert_eq!(response.classification.breaks.as_slice(), &[3.0, 10.0]);
        assert_eq!(response.method_ref, method_ref);
    }

    #[tokio::test]
    async fn test_classify_errors() {
        let unknown = ClassifyRequest {
            values: vec![1.0],
            method: None,
            method_ref: Some(MethodRef::new("fisher_jenks", "ffffffffffffffff")),
        };
        let (status, Json(body)) = classify_handler(State(state()), Json(unknown))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "METHOD_NOT_FOUND");

        let empty = classify(vec![], Method::quantiles(3));
        let (status, Json(body)) = classify_handler(State(state()), Json(empty))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "EMPTY_INPUT");

        let missing = ClassifyRequest {
            values: vec![1.0, 2.0],
            method: None,
            method_ref: None,
        };
        let (_, Json(body)) = classify_handler(State(state()), Json(missing))
            .await
            .unwrap_err();
        assert_eq!(body.code, "MISSING_METHOD");
    }

    #[tokio::test]
    async fn test_observation_limit() {
        let config = ServiceConfig {
            max_observations: 3,
            ..ServiceConfig::default()
        };
        let state = Arc::new(ServiceState::new(config));
        let request = classify(vec![1.0, 2.0, 3.0, 4.0], Method::quantiles(2));
        let (status, Json(body)) = classify_handler(State(state), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.code, "TOO_MANY_OBSERVATIONS");
    }

    #[tokio::test]
    async fn test_search_limits() {
        let request: ClassifyRequest = serde_json::from_value(serde_json::json!({
            "values": (0..200).map(f64::from).collect::<Vec<_>>(),
            "method": {
                "method": "max_p",
                "k": 8,
                "exhaustive_limit": u64::MAX,
            },
        }))
        .unwrap();
        let (status, Json(body)) = classify_handler(State(state()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "SEARCH_LIMIT_EXCEEDED");
        assert_eq!(body.details.as_deref(), Some("exhaustive_limit"));

        let register = RegisterMethodRequest {
            method: Method::fisher_jenks(500),
        };
        let (_, Json(body)) = register_method_handler(State(state()), Json(register))
            .await
            .unwrap_err();
        assert_eq!(body.code, "SEARCH_LIMIT_EXCEEDED");

        let sweep = OptimizeRequest {
            values: vec![1.0, 2.0, 3.0],
            method: Some(Method::fisher_jenks(2)),
            method_ref: None,
            params: KOptimizerParams {
                max_k: 10_000,
                ..KOptimizerParams::default()
            },
            seed: None,
        };
        let (_, Json(body)) = optimize_handler(State(state()), Json(sweep))
            .await
            .unwrap_err();
        assert_eq!(body.details.as_deref(), Some("max_k"));
    }

    #[tokio::test]
    async fn test_pooled() {
        let request = PooledRequest {
            arrays: vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0], vec![5.0]],
            method: Some(Method::quantiles(2)),
            method_ref: None,
        };
        let Json(response) = pooled_handler(State(state()), Json(request)).await.unwrap();
        assert!(response.breaks_consistent);
        assert_eq!(response.per_array.len(), 3);
        for classification in &response.per_array {
            assert_eq!(classification.breaks.as_slice(), response.breaks.as_slice());
        }

        let bad = PooledRequest {
            arrays: vec![vec![1.0], vec![]],
            method: Some(Method::quantiles(2)),
            method_ref: None,
        };
        let (_, Json(body)) = pooled_handler(State(state()), Json(bad)).await.unwrap_err();
        assert_eq!(body.code, "INVALID_ARRAY");
        assert_eq!(body.details.as_deref(), Some("EMPTY_INPUT"));
    }

    #[tokio::test]
    async fn test_optimize_single_method() {
        let values: Vec<f64> = (0..40).map(|i| (i * i) as f64).collect();
        let request = OptimizeRequest {
            values,
            method: Some(Method::fisher_jenks(2)),
            method_ref: None,
            params: KOptimizerParams::default(),
            seed: None,
        };
        let Json(response) = optimize_handler(State(state()), Json(request)).await.unwrap();
        assert!(response.target_met);
        assert!(response.fit >= 0.8);
        assert_eq!(response.trace.last().map(|p| p.k), Some(response.k));
        assert!(response.ranking.is_empty());
    }

    #[tokio::test]
    async fn test_optimize_ranks_families() {
        let values: Vec<f64> = (0..30).map(|i| (i % 7) as f64 * 3.0 + i as f64).collect();
        let request = OptimizeRequest {
            values,
            method: None,
            method_ref: None,
            params: KOptimizerParams::default(),
            seed: Some(11),
        };
        let Json(response) = optimize_handler(State(state()), Json(request)).await.unwrap();
        assert!(!response.ranking.is_empty());
        assert_eq!(response.ranking[0].k, response.k);
        assert_eq!(response.ranking[0].method, response.method_ref.method);
    }

    #[tokio::test]
    async fn test_optimize_rejects_fixed_k_method() {
        let request = OptimizeRequest {
            values: vec![1.0, 2.0, 3.0],
            method: Some(Method::box_plot()),
            method_ref: None,
            params: KOptimizerParams::default(),
            seed: None,
        };
        let (_, Json(body)) = optimize_handler(State(state()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(body.code, "UNSUPPORTED_FOR_K_SWEEP");
    }

    #[tokio::test]
    async fn test_color_path() {
        let request = ColorRequest {
            edges: vec![(0, 1), (1, 2), (2, 3), (3, 4)],
            strategy: Strategy::Natural,
            ..ColorRequest::default()
        };
        let Json(response) = color_handler(State(state()), Json(request)).await.unwrap();
        assert_eq!(response.colors.values().copied().collect::<Vec<_>>(), vec![0, 1, 0, 1, 0]);
        assert_eq!(response.num_colors, 2);
    }

    #[tokio::test]
    async fn test_color_self_loop() {
        let request = ColorRequest {
            edges: vec![(0, 1), (2, 2)],
            ..ColorRequest::default()
        };
        let (_, Json(body)) = color_handler(State(state()), Json(request)).await.unwrap_err();
        assert_eq!(body.code, "SELF_LOOP");
        assert_eq!(body.details.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_register_and_list_methods() {
        let state = state();
        let before = list_methods_handler(State(Arc::clone(&state))).await.0;
        assert_eq!(before.catalogue.len(), CLASSIFIERS.len());

        let request = RegisterMethodRequest {
            method: Method::max_p(3, 2, Some(1)),
        };
        let Json(response) = register_method_handler(State(Arc::clone(&state)), Json(request))
            .await
            .unwrap();
        assert_eq!(response.method_ref.method, "max_p");

        let after = list_methods_handler(State(Arc::clone(&state))).await.0;
        assert_eq!(after.methods.len(), before.methods.len() + 1);
        assert_ne!(after.registry_fingerprint, before.registry_fingerprint);

        let invalid = RegisterMethodRequest {
            method: Method::quantiles(0),
        };
        let (_, Json(body)) = register_method_handler(State(state), Json(invalid))
            .await
            .unwrap_err();
        assert_eq!(body.code, "INVALID_K");
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = health_handler(State(state())).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.method_count, CLASSIFIERS.len() - 1);
    }

    #[test]
    fn test_classify_request_json() {
        let request: ClassifyRequest = serde_json::from_str(
            r#"{"values": [1, 2, 3], "method": {"method": "quantiles", "k": 2}}"#,
        )
        .unwrap();
        assert_eq!(request.method, Some(Method::quantiles(2)));
        assert!(request.method_ref.is_none());
    }
}
