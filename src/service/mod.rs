//! Choropleth REST Service
//!
//! Exposes classification and coloring as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/classify` - Classify one array
//! - `POST /api/classify/pooled` - Classify several arrays against shared breaks
//! - `POST /api/optimize` - Choose k for one method, or rank every k family
//! - `POST /api/color` - Greedy coloring of a region adjacency graph
//! - `GET /api/methods` - List registered methods
//! - `POST /api/methods` - Register a named parameter set
//! - `GET /health` - Service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_classification_metrics, record_coloring_metrics};
pub use routes::{create_router, AppState, ErrorResponse};
pub use state::{
    LimitExceeded, MethodRef, MethodRegistry, SearchLimits, ServiceConfig, ServiceState,
};
