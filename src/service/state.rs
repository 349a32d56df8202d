//! Service state management.
//!
//! Contains the MethodRegistry, the environment configuration and shared
//! service state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::canonical::canonical_hash_hex;
use crate::method::{CentroidInit, Method, CLASSIFIERS};
use crate::select::KOptimizerParams;

/// Default class count for the pre-registered methods.
pub const DEFAULT_REGISTRY_K: usize = 5;

/// Default cap on observations per request.
pub const DEFAULT_MAX_OBSERVATIONS: usize = 1_000_000;

/// Default cap on the class count of one request.
pub const DEFAULT_MAX_K: usize = 64;

/// Default cap on solver iteration counts.
pub const DEFAULT_MAX_ITERATIONS: usize = 1_000;

/// Default cap on random restarts.
pub const DEFAULT_MAX_RESTARTS: usize = 1_000;

/// Default cap on the Max-P exhaustive enumeration.
pub const DEFAULT_MAX_EXHAUSTIVE_LIMIT: usize = 1_000_000;

/// A client-supplied search parameter above its service limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} = {value} exceeds the service limit of {limit}")]
pub struct LimitExceeded {
    /// Parameter name.
    pub name: &'static str,
    /// Requested value.
    pub value: usize,
    /// Configured limit.
    pub limit: usize,
}

/// Caps on the search effort a request may ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Largest class count, and largest `max_k` of a k sweep.
    pub max_k: usize,
    /// Largest iteration cap of the iterative solvers.
    pub max_iterations: usize,
    /// Largest number of random restarts.
    pub max_restarts: usize,
    /// Largest Max-P `exhaustive_limit`.
    pub max_exhaustive_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_k: DEFAULT_MAX_K,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_restarts: DEFAULT_MAX_RESTARTS,
            max_exhaustive_limit: DEFAULT_MAX_EXHAUSTIVE_LIMIT,
        }
    }
}

impl SearchLimits {
    /// Check the search parameters of a method.
    pub fn check_method(&self, method: &Method) -> Result<(), LimitExceeded> {
        if let Some(k) = method.k() {
            within("k", k, self.max_k)?;
        }
        match method {
            Method::JenksCaspall { max_iterations, .. }
            | Method::JenksCaspallForced { max_iterations, .. }
            | Method::JenksCaspallSampled { max_iterations, .. } => {
                within("max_iterations", *max_iterations, self.max_iterations)
            }
            Method::MaxP {
                exhaustive_limit,
                restarts,
                ..
            } => {
                within("exhaustive_limit", *exhaustive_limit, self.max_exhaustive_limit)?;
                within("restarts", *restarts, self.max_restarts)
            }
            Method::NaturalBreaks {
                init,
                max_iterations,
                ..
            } => {
                within("max_iterations", *max_iterations, self.max_iterations)?;
                match init {
                    CentroidInit::Random { restarts } => {
                        within("restarts", *restarts, self.max_restarts)
                    }
                    CentroidInit::Quantiles => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Check the bounds of a k sweep.
    pub fn check_sweep(&self, params: &KOptimizerParams) -> Result<(), LimitExceeded> {
        within("max_k", params.max_k, self.max_k)
    }
}

fn within(name: &'static str, value: usize, limit: usize) -> Result<(), LimitExceeded> {
    if value > limit {
        return Err(LimitExceeded { name, value, limit });
    }
    Ok(())
}

/// Reference to a registered method by hash.
///
/// This enables hash-stable method references across requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Method name (e.g., "fisher_jenks")
    pub method: String,
    /// xxHash64 of the quantized method parameters
    pub params_hash: String,
}

impl MethodRef {
    /// Create a method reference from a Method.
    pub fn from_method(method: &Method) -> Self {
        Self {
            method: method.name().to_string(),
            params_hash: method.params_hash(),
        }
    }

    /// Create a reference with explicit values.
    pub fn new(method: impl Into<String>, params_hash: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params_hash: params_hash.into(),
        }
    }
}

/// Registry of named parameter sets with stable hashes.
///
/// Methods are registered once and referenced by MethodRef.
/// The registry itself has a fingerprint that changes when methods change.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: BTreeMap<MethodRef, Method>,
    registry_fingerprint: String,
}

impl MethodRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        let mut registry = Self {
            methods: BTreeMap::new(),
            registry_fingerprint: String::new(),
        };
        registry.update_fingerprint();
        registry
    }

    /// Create a registry holding every catalogue method with default
    /// parameters and `k = 5` where a class count applies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in CLASSIFIERS {
            if let Ok(method) = Method::from_name(name, Some(DEFAULT_REGISTRY_K)) {
                registry.register(method);
            }
        }
        registry
    }

    /// Register a method and return its reference.
    ///
    /// If the method already exists (same hash), returns the existing reference.
    pub fn register(&mut self, method: Method) -> MethodRef {
        let method_ref = MethodRef::from_method(&method);

        if !self.methods.contains_key(&method_ref) {
            self.methods.insert(method_ref.clone(), method);
            self.update_fingerprint();
        }

        method_ref
    }

    /// Resolve a method reference to the registered parameters.
    pub fn resolve(&self, method_ref: &MethodRef) -> Option<&Method> {
        self.methods.get(method_ref)
    }

    /// Get all registered method references.
    pub fn list(&self) -> Vec<MethodRef> {
        self.methods.keys().cloned().collect()
    }

    /// Get the registry fingerprint.
    ///
    /// This changes whenever methods are added.
    pub fn fingerprint(&self) -> &str {
        &self.registry_fingerprint
    }

    /// Get the number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn update_fingerprint(&mut self) {
        let refs: Vec<_> = self.methods.keys().collect();
        self.registry_fingerprint = canonical_hash_hex(&refs);
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Service configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Largest number of values accepted in one request.
    pub max_observations: usize,
    /// "json" or "pretty".
    pub log_format: String,
    /// Caps on client-supplied search parameters.
    pub limits: SearchLimits,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            max_observations: DEFAULT_MAX_OBSERVATIONS,
            log_format: "json".to_string(),
            limits: SearchLimits::default(),
        }
    }
}

impl ServiceConfig {
    /// Read `HOST`, `PORT`, `MAX_OBSERVATIONS`, `LOG_FORMAT`, `MAX_K`,
    /// `MAX_ITERATIONS`, `MAX_RESTARTS` and `MAX_EXHAUSTIVE_LIMIT`.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let positive = |key: &str, default: usize| {
            lookup(key)
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(default)
        };
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            max_observations: positive("MAX_OBSERVATIONS", defaults.max_observations),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
            limits: SearchLimits {
                max_k: positive("MAX_K", defaults.limits.max_k),
                max_iterations: positive("MAX_ITERATIONS", defaults.limits.max_iterations),
                max_restarts: positive("MAX_RESTARTS", defaults.limits.max_restarts),
                max_exhaustive_limit: positive(
                    "MAX_EXHAUSTIVE_LIMIT",
                    defaults.limits.max_exhaustive_limit,
                ),
            },
        }
    }
}

/// Shared service state.
///
/// Contains the method registry and the service configuration.
#[derive(Debug, Clone)]
pub struct ServiceState {
    /// Registry of named parameter sets.
    pub method_registry: Arc<RwLock<MethodRegistry>>,
    /// Service configuration.
    pub config: Arc<ServiceConfig>,
}

impl ServiceState {
    /// Create service state with the default registry.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_registry(MethodRegistry::with_defaults(), config)
    }

    /// Create service state with a custom method registry.
    pub fn with_registry(registry: MethodRegistry, config: ServiceConfig) -> Self {
        Self {
            method_registry: Arc::new(RwLock::new(registry)),
            config: Arc::new(config),
        }
    }

    /// Create service state from environment variables.
    pub fn from_env() -> Self {
        Self::new(ServiceConfig::from_env())
    }

    /// Read access to the registry. A poisoned lock is still readable since
    /// registration never leaves the map half-written.
    pub fn registry(&self) -> RwLockReadGuard<'_, MethodRegistry> {
        self.method_registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the registry.
    pub fn registry_mut(&self) -> RwLockWriteGuard<'_, MethodRegistry> {
        self.method_registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_registry_register() {
        let mut registry = MethodRegistry::new();
        let method = Method::fisher_jenks(4);

        let ref1 = registry.register(method.clone());
        let ref2 = registry.register(method);

        // Same method should return same reference
        assert_eq!(ref1, ref2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_method_registry_resolve() {
        let mut registry = MethodRegistry::new();
        let method = Method::jenks_caspall_forced(3, 2);

        let method_ref = registry.register(method.clone());
        assert_eq!(registry.resolve(&method_ref), Some(&method));
        assert!(registry
            .resolve(&MethodRef::new("fisher_jenks", "0000000000000000"))
            .is_none());
    }

    #[test]
    fn test_method_registry_fingerprint_changes() {
        let mut registry = MethodRegistry::new();
        let initial_fingerprint = registry.fingerprint().to_string();

        registry.register(Method::quantiles(4));

        assert_ne!(registry.fingerprint(), initial_fingerprint);
    }

    #[test]
    fn test_defaults_cover_catalogue() {
        let registry = MethodRegistry::with_defaults();
        // Every method except user_defined has default parameters.
        assert_eq!(registry.len(), CLASSIFIERS.len() - 1);
        assert!(registry
            .list()
            .iter()
            .all(|r| r.method != "user_defined"));
    }

    #[test]
    fn test_method_ref_from_method() {
        let ref1 = MethodRef::from_method(&Method::fisher_jenks(5));
        let ref2 = MethodRef::from_method(&Method::fisher_jenks(5));
        let ref3 = MethodRef::from_method(&Method::fisher_jenks(6));

        assert_eq!(ref1, ref2);
        assert_ne!(ref1, ref3);
        assert_eq!(ref1.method, "fisher_jenks");
    }

    #[test]
    fn test_search_limits() {
        let limits = SearchLimits::default();
        for method in MethodRegistry::with_defaults().methods.values() {
            assert!(limits.check_method(method).is_ok(), "{method}");
        }

        let mut greedy = Method::max_p(8, 1, Some(1));
        if let Method::MaxP {
            exhaustive_limit, ..
        } = &mut greedy
        {
            *exhaustive_limit = usize::MAX;
        }
        let err = limits.check_method(&greedy).unwrap_err();
        assert_eq!(err.name, "exhaustive_limit");
        assert_eq!(err.limit, DEFAULT_MAX_EXHAUSTIVE_LIMIT);

        assert_eq!(
            limits.check_method(&Method::fisher_jenks(1000)).unwrap_err().name,
            "k"
        );
        let sweep = KOptimizerParams {
            max_k: 500,
            ..KOptimizerParams::default()
        };
        assert!(limits.check_sweep(&sweep).is_err());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ServiceConfig::from_lookup(|key| match key {
            "PORT" => Some("9100".to_string()),
            "MAX_OBSERVATIONS" => Some("not-a-number".to_string()),
            "LOG_FORMAT" => Some("pretty".to_string()),
            "MAX_RESTARTS" => Some("50".to_string()),
            _ => None,
        });
        assert_eq!(config.limits.max_restarts, 50);
        assert_eq!(config.limits.max_k, DEFAULT_MAX_K);
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_observations, DEFAULT_MAX_OBSERVATIONS);
        assert_eq!(config.log_format, "pretty");
        assert_eq!(config.host, "0.0.0.0");
    }
}
