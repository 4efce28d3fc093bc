//! Analysis Engine Abstraction
//!
//! Defines the EngineAdapter trait every analysis backend implements, plus the
//! registry that owns the configured engines and their health.
//!
//! ## Modules
//!
//! - `adapters`: Built-in rule-based engines (lexicon, morphology, syntax, entity)
//! - `circuit_breaker`: Engine health across runs
//! - `factory`: Adapter constructors keyed by engine kind
//! - `metrics`: Lock-free per-engine call counters
//! - `registry`: Engine set, run snapshots and status reporting

pub mod adapters;
mod circuit_breaker;
mod descriptor;
mod factory;
mod metrics;
mod registry;

#[cfg(test)]
pub mod testing;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use descriptor::EngineDescriptor;
pub use factory::{AdapterConstructor, AdapterFactory};
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use registry::{EngineHandle, EngineStatus, ProcessorRegistry, RegistrySnapshot};

use std::sync::Arc;

use crate::types::{CandidateSpan, Result};

/// One independent analysis backend
///
/// Implementations are synchronous and may block; callers run them on
/// blocking worker threads. Offsets in returned spans are character offsets
/// into `text`.
pub trait EngineAdapter: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<CandidateSpan>>;

    /// Engine identity stamped on every candidate
    fn id(&self) -> &str;
}

/// Shared adapter type for concurrent use across runs
pub type SharedAdapter = Arc<dyn EngineAdapter>;
