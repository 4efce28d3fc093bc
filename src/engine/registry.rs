//! Processor Registry
//!
//! Owns the configured engines, their adapters and their health.
//!
//! ## Features
//!
//! - **Snapshots**: every run starts from `begin_run()` and keeps its own view
//!   of the engine set, so a reload never changes an in-flight run
//! - **Run-local exclusion**: `mark_unhealthy` removes an engine from the
//!   current run only
//! - **Circuit breakers**: repeated failures keep an engine out of later runs
//!   until its recovery timeout elapses
//! - **Quality history**: per-engine precision folded into a moving average

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::descriptor::EngineDescriptor;
use super::factory::AdapterFactory;
use super::metrics::EngineMetrics;
use super::SharedAdapter;
use crate::config::Config;
use crate::constants::engine as engine_constants;
use crate::types::{DescryError, EngineError, Result};

struct LoadedEngine {
    descriptor: EngineDescriptor,
    adapter: Option<SharedAdapter>,
    load_error: Option<String>,
}

/// Immutable engine set, sorted by weight descending then id
struct EngineSet {
    engines: Vec<LoadedEngine>,
}

impl EngineSet {
    fn get(&self, id: &str) -> Option<&LoadedEngine> {
        self.engines.iter().find(|e| e.descriptor.id == id)
    }

    fn enabled_count(&self) -> usize {
        self.engines.iter().filter(|e| e.descriptor.enabled).count()
    }
}

/// Health state shared by the registry and all live snapshots
struct EngineHealth {
    breakers: DashMap<String, CircuitBreaker>,
    metrics: DashMap<String, EngineMetrics>,
    quality: DashMap<String, f64>,
}

impl EngineHealth {
    fn new() -> Self {
        Self {
            breakers: DashMap::new(),
            metrics: DashMap::new(),
            quality: DashMap::new(),
        }
    }

    fn circuit_state(&self, id: &str) -> CircuitState {
        self.breakers
            .get(id)
            .map(|cb| cb.state())
            .unwrap_or(CircuitState::Closed)
    }

    /// Closed, or half-open with a free probe slot
    fn admits_runs(&self, id: &str) -> bool {
        self.breakers
            .get(id)
            .map(|cb| cb.admits_runs())
            .unwrap_or(true)
    }

    fn allow(&self, id: &str) -> bool {
        self.breakers
            .get(id)
            .map(|cb| cb.allow_request())
            .unwrap_or(true)
    }

    fn record_quality(&self, id: &str, precision: f64) {
        let precision = precision.clamp(0.0, 1.0);
        let alpha = engine_constants::QUALITY_EMA_ALPHA;
        let mut entry = self
            .quality
            .entry(id.to_string())
            .or_insert(engine_constants::INITIAL_QUALITY);
        let updated = alpha * precision + (1.0 - alpha) * *entry;
        *entry = updated;
    }
}

/// Admitted engine as seen by one run
#[derive(Clone)]
pub struct EngineHandle {
    pub id: String,
    pub weight: f64,
    pub timeout: Duration,
    pub adapter: SharedAdapter,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Health and usage report for one engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub id: String,
    pub kind: String,
    pub enabled: bool,
    pub loaded: bool,
    pub healthy: bool,
    pub weight: f64,
    pub circuit_state: CircuitState,
    pub rolling_quality: f64,
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub avg_latency_ms: f64,
    /// Runs the engine was kept out of by its open circuit
    pub blocked_runs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

pub struct ProcessorRegistry {
    factory: AdapterFactory,
    current: RwLock<Arc<EngineSet>>,
    health: Arc<EngineHealth>,
    breaker_config: RwLock<CircuitBreakerConfig>,
}

impl ProcessorRegistry {
    pub fn new(config: &Config, factory: AdapterFactory) -> Result<Self> {
        config.validate()?;
        let set = build_engine_set(&factory, config)?;
        let breaker_config = CircuitBreakerConfig::from(&config.runtime.circuit_breaker);

        let registry = Self {
            factory,
            current: RwLock::new(Arc::new(EngineSet { engines: Vec::new() })),
            health: Arc::new(EngineHealth::new()),
            breaker_config: RwLock::new(breaker_config),
        };
        registry.install(set, true);
        Ok(registry)
    }

    /// Validate, build every adapter, then swap the engine set
    ///
    /// On error the current set stays in place. Runs already started keep
    /// the set they began with.
    pub fn reload(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let set = build_engine_set(&self.factory, config)?;

        let new_breaker_config = CircuitBreakerConfig::from(&config.runtime.circuit_breaker);
        let breakers_changed = {
            let mut current = self
                .breaker_config
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let changed = current.failure_threshold != new_breaker_config.failure_threshold
                || current.recovery_timeout != new_breaker_config.recovery_timeout;
            *current = new_breaker_config;
            changed
        };

        self.install(set, breakers_changed);
        info!(engines = self.configured_count(), "Engine registry reloaded");
        Ok(())
    }

    fn install(&self, set: EngineSet, reset_breakers: bool) {
        let breaker_config = self
            .breaker_config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        let ids: BTreeSet<&str> = set.engines.iter().map(|e| e.descriptor.id.as_str()).collect();
        if reset_breakers {
            self.health.breakers.clear();
        }
        self.health.breakers.retain(|id, _| ids.contains(id.as_str()));
        self.health.metrics.retain(|id, _| ids.contains(id.as_str()));
        self.health.quality.retain(|id, _| ids.contains(id.as_str()));

        for engine in &set.engines {
            let id = &engine.descriptor.id;
            self.health
                .breakers
                .entry(id.clone())
                .or_insert_with(|| CircuitBreaker::new(id.clone(), breaker_config.clone()));
            self.health.metrics.entry(id.clone()).or_default();
            self.health
                .quality
                .entry(id.clone())
                .or_insert(engine.descriptor.quality_score);
        }

        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::new(set);
    }

    fn engine_set(&self) -> Arc<EngineSet> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Start a run: snapshot the engine set and admit healthy engines
    pub fn begin_run(&self) -> RegistrySnapshot {
        let engines = self.engine_set();
        let admitted: Vec<EngineHandle> = engines
            .engines
            .iter()
            .filter(|e| e.descriptor.enabled)
            .filter_map(|e| {
                let adapter = e.adapter.clone()?;
                self.health.allow(&e.descriptor.id).then(|| EngineHandle {
                    id: e.descriptor.id.clone(),
                    weight: e.descriptor.weight,
                    timeout: e.descriptor.timeout,
                    adapter,
                })
            })
            .collect();

        debug!(
            admitted = admitted.len(),
            configured = engines.enabled_count(),
            "Run snapshot created"
        );

        RegistrySnapshot {
            engines,
            health: Arc::clone(&self.health),
            admitted,
            excluded: Mutex::new(BTreeMap::new()),
            called: Mutex::new(BTreeSet::new()),
        }
    }

    /// Enabled, loaded and healthy engine ids (weight descending, then id)
    pub fn available_engines(&self) -> Vec<String> {
        self.engine_set()
            .engines
            .iter()
            .filter(|e| {
                e.descriptor.enabled
                    && e.adapter.is_some()
                    && self.health.admits_runs(&e.descriptor.id)
            })
            .map(|e| e.descriptor.id.clone())
            .collect()
    }

    pub fn weight(&self, id: &str) -> Option<f64> {
        self.engine_set().get(id).map(|e| e.descriptor.weight)
    }

    /// Enabled engines in the current set
    pub fn configured_count(&self) -> usize {
        self.engine_set().enabled_count()
    }

    pub fn rolling_quality(&self, id: &str) -> Option<f64> {
        self.health.quality.get(id).map(|q| *q)
    }

    pub fn engine_status(&self) -> Vec<EngineStatus> {
        self.engine_set()
            .engines
            .iter()
            .map(|e| {
                let id = &e.descriptor.id;
                let circuit_state = self.health.circuit_state(id);
                let metrics = self
                    .health
                    .metrics
                    .get(id)
                    .map(|m| m.snapshot())
                    .unwrap_or_default();
                let loaded = e.adapter.is_some();
                let blocked_runs = self
                    .health
                    .breakers
                    .get(id)
                    .map(|cb| cb.stats().blocked_count)
                    .unwrap_or(0);
                EngineStatus {
                    id: id.clone(),
                    kind: e.descriptor.kind.clone(),
                    enabled: e.descriptor.enabled,
                    loaded,
                    healthy: e.descriptor.enabled && loaded && self.health.admits_runs(id),
                    weight: e.descriptor.weight,
                    circuit_state,
                    rolling_quality: self
                        .rolling_quality(id)
                        .unwrap_or(e.descriptor.quality_score),
                    calls: metrics.calls,
                    failures: metrics.failures,
                    timeouts: metrics.timeouts,
                    avg_latency_ms: metrics.avg_latency_ms,
                    blocked_runs,
                    load_error: e.load_error.clone(),
                }
            })
            .collect()
    }
}

fn build_engine_set(factory: &AdapterFactory, config: &Config) -> Result<EngineSet> {
    let mut engines = Vec::with_capacity(config.engines.len());

    for engine in &config.engines {
        let descriptor = EngineDescriptor::from_config(engine, config);

        if !factory.supports(&engine.kind) {
            return Err(DescryError::Config(format!(
                "Unknown engine kind '{}' for engine '{}'. Supported: {}",
                engine.kind,
                engine.id,
                factory.kinds().join(", ")
            )));
        }

        // Disabled engines are reported but never constructed
        let (adapter, load_error) = if !engine.enabled {
            (None, None)
        } else {
            match factory.create(engine, &config.boundary) {
                Ok(adapter) => (Some(adapter), None),
                Err(e) => {
                    let err = EngineError::unavailable(&engine.id, e.to_string());
                    warn!(engine = %engine.id, error = %err, "Engine failed to load");
                    (None, Some(err.message))
                }
            }
        };

        engines.push(LoadedEngine {
            descriptor,
            adapter,
            load_error,
        });
    }

    engines.sort_by(|a, b| {
        b.descriptor
            .weight
            .total_cmp(&a.descriptor.weight)
            .then_with(|| a.descriptor.id.cmp(&b.descriptor.id))
    });

    Ok(EngineSet { engines })
}

/// One run's view of the registry
///
/// Dropping the snapshot returns unused half-open probe slots.
pub struct RegistrySnapshot {
    engines: Arc<EngineSet>,
    health: Arc<EngineHealth>,
    admitted: Vec<EngineHandle>,
    excluded: Mutex<BTreeMap<String, String>>,
    called: Mutex<BTreeSet<String>>,
}

impl RegistrySnapshot {
    fn excluded(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.excluded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mark_called(&self, id: &str) {
        self.called
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id.to_string());
    }

    /// Admitted engines not excluded during this run, weight descending then id
    pub fn available_engines(&self) -> Vec<EngineHandle> {
        let excluded = self.excluded();
        self.admitted
            .iter()
            .filter(|e| !excluded.contains_key(&e.id))
            .cloned()
            .collect()
    }

    /// Exclude an engine from the rest of this run and count a failure
    /// against its circuit breaker
    pub fn mark_unhealthy(&self, id: &str, reason: impl Into<String>) {
        if let Some(cb) = self.health.breakers.get(id) {
            cb.record_failure();
        }
        self.exclude(id, reason.into());
    }

    fn exclude(&self, id: &str, reason: String) {
        warn!(engine = %id, %reason, "Engine excluded from run");
        self.excluded().insert(id.to_string(), reason);
    }

    pub fn weight(&self, id: &str) -> Option<f64> {
        self.engines.get(id).map(|e| e.descriptor.weight)
    }

    /// Enabled engines in the snapshot's engine set
    pub fn configured_count(&self) -> usize {
        self.engines.enabled_count()
    }

    pub fn record_success(&self, id: &str, latency: Duration, candidates: usize) {
        self.mark_called(id);
        if let Some(cb) = self.health.breakers.get(id) {
            cb.record_success();
        }
        if let Some(metrics) = self.health.metrics.get(id) {
            metrics.record_success(latency, candidates);
        }
    }

    /// Record a failed call and exclude the engine from this run
    pub fn record_failure(&self, error: &EngineError, latency: Duration) {
        self.mark_called(&error.engine_id);
        if let Some(metrics) = self.health.metrics.get(&error.engine_id) {
            metrics.record_failure(error.kind, latency);
        }
        if error.kind.counts_against_health() {
            self.mark_unhealthy(&error.engine_id, error.to_string());
        } else {
            // Neither outcome reaches the breaker, so a half-open slot goes back
            if let Some(cb) = self.health.breakers.get(&error.engine_id) {
                cb.release_probe();
            }
            self.exclude(&error.engine_id, error.to_string());
        }
    }

    /// Fold one run's precision proxy into the engine's rolling quality
    pub fn record_quality(&self, id: &str, precision: f64) {
        self.health.record_quality(id, precision);
    }

    /// Engines excluded during this run, with reasons
    pub fn failed_engines(&self) -> BTreeMap<String, String> {
        self.excluded().clone()
    }
}

impl Drop for RegistrySnapshot {
    fn drop(&mut self) {
        let called = self
            .called
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for engine in &self.admitted {
            if !called.contains(&engine.id)
                && let Some(cb) = self.health.breakers.get(&engine.id)
            {
                cb.release_probe();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::testing::ScriptedAdapter;
    use crate::types::EngineErrorKind;

    fn scripted_factory() -> AdapterFactory {
        let mut factory = AdapterFactory::with_builtins();
        factory.register("scripted", |engine, _| {
            Ok(Arc::new(ScriptedAdapter::new(&engine.id)) as SharedAdapter)
        });
        factory.register("broken", |engine, _| {
            Err(EngineError::unavailable(&engine.id, "model missing").into())
        });
        factory
    }

    fn config_with(engines: Vec<EngineConfig>) -> Config {
        Config {
            engines,
            ..Config::default()
        }
    }

    #[test]
    fn test_available_engines_sorted_by_weight_then_id() {
        let config = config_with(vec![
            EngineConfig::new("b", "scripted", 1.0),
            EngineConfig::new("c", "scripted", 1.2),
            EngineConfig::new("a", "scripted", 1.0),
            EngineConfig::new("off", "scripted", 5.0).disabled(),
        ]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        assert_eq!(registry.available_engines(), vec!["c", "a", "b"]);
        assert_eq!(registry.configured_count(), 3);
        assert_eq!(registry.weight("c"), Some(1.2));

        let snapshot = registry.begin_run();
        let ids: Vec<_> = snapshot.available_engines().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_default_engines_load() {
        let registry =
            ProcessorRegistry::new(&Config::default(), AdapterFactory::with_builtins()).unwrap();
        assert_eq!(registry.available_engines(), vec!["morphology", "lexicon", "syntax"]);
        assert_eq!(registry.engine_status().len(), 4);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let config = config_with(vec![EngineConfig::new("x", "transformer", 1.0)]);
        let err = ProcessorRegistry::new(&config, scripted_factory()).err().unwrap();
        assert!(matches!(err, DescryError::Config(_)));
    }

    #[test]
    fn test_load_failure_keeps_engine_in_status() {
        let config = config_with(vec![
            EngineConfig::new("ok", "scripted", 1.0),
            EngineConfig::new("bad", "broken", 2.0),
        ]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        assert_eq!(registry.available_engines(), vec!["ok"]);
        let status = registry.engine_status();
        let bad = status.iter().find(|s| s.id == "bad").unwrap();
        assert!(!bad.loaded);
        assert!(!bad.healthy);
        assert!(bad.load_error.as_deref().unwrap().contains("model missing"));
    }

    #[test]
    fn test_mark_unhealthy_is_run_local() {
        let config = config_with(vec![
            EngineConfig::new("a", "scripted", 1.0),
            EngineConfig::new("b", "scripted", 1.0),
        ]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        let run = registry.begin_run();
        run.mark_unhealthy("a", "flaky");
        assert_eq!(run.available_engines().len(), 1);
        assert_eq!(run.failed_engines().get("a").map(String::as_str), Some("flaky"));

        let next = registry.begin_run();
        assert_eq!(next.available_engines().len(), 2);
    }

    #[test]
    fn test_mark_unhealthy_counts_against_breaker() {
        let mut config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        config.runtime.circuit_breaker.failure_threshold = 1;
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        registry.begin_run().mark_unhealthy("a", "garbled output");
        assert!(registry.available_engines().is_empty());
    }

    #[test]
    fn test_repeated_failures_open_circuit_for_later_runs() {
        let mut config = config_with(vec![
            EngineConfig::new("a", "scripted", 1.0),
            EngineConfig::new("b", "scripted", 1.0),
        ]);
        config.runtime.circuit_breaker.failure_threshold = 2;
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        for _ in 0..2 {
            let run = registry.begin_run();
            run.record_failure(
                &EngineError::timeout("a", Duration::from_millis(5)),
                Duration::from_millis(5),
            );
        }

        assert_eq!(registry.available_engines(), vec!["b"]);
        let ids: Vec<_> = registry
            .begin_run()
            .available_engines()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["b"]);

        let status = registry.engine_status();
        let a = status.iter().find(|s| s.id == "a").unwrap();
        assert_eq!(a.circuit_state, CircuitState::Open);
        assert_eq!(a.timeouts, 2);
        assert_eq!(a.blocked_runs, 1);
        assert!(!a.healthy);
    }

    #[test]
    fn test_unavailable_errors_do_not_trip_breaker() {
        let mut config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        config.runtime.circuit_breaker.failure_threshold = 1;
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        let run = registry.begin_run();
        run.record_failure(
            &EngineError::new(EngineErrorKind::Unavailable, "a", "not ready"),
            Duration::ZERO,
        );
        drop(run);
        assert_eq!(registry.available_engines(), vec!["a"]);
    }

    #[test]
    fn test_unavailable_during_probe_run_readmits_engine() {
        let mut config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        config.runtime.circuit_breaker.failure_threshold = 1;
        config.runtime.circuit_breaker.recovery_timeout_secs = 0;
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        let run = registry.begin_run();
        run.record_failure(
            &EngineError::timeout("a", Duration::from_millis(5)),
            Duration::from_millis(5),
        );
        drop(run);

        let probe_run = registry.begin_run();
        assert_eq!(probe_run.available_engines().len(), 1);
        let a = registry.engine_status().into_iter().find(|s| s.id == "a").unwrap();
        assert_eq!(a.circuit_state, CircuitState::HalfOpen);
        assert!(!a.healthy);

        probe_run.record_failure(
            &EngineError::new(EngineErrorKind::Unavailable, "a", "warming up"),
            Duration::ZERO,
        );
        drop(probe_run);

        for _ in 0..3 {
            let run = registry.begin_run();
            assert_eq!(run.available_engines().len(), 1);
        }
        assert_eq!(registry.available_engines(), vec!["a"]);
    }

    #[test]
    fn test_reload_keeps_snapshot_of_running_run() {
        let config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();
        let in_flight = registry.begin_run();

        let reloaded = config_with(vec![
            EngineConfig::new("x", "scripted", 1.0),
            EngineConfig::new("y", "scripted", 2.0),
        ]);
        registry.reload(&reloaded).unwrap();

        assert_eq!(in_flight.available_engines().len(), 1);
        assert_eq!(in_flight.weight("a"), Some(1.0));
        assert_eq!(registry.available_engines(), vec!["y", "x"]);
        assert_eq!(registry.weight("a"), None);
    }

    #[test]
    fn test_failed_reload_keeps_current_set() {
        let config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();

        let bad = config_with(vec![EngineConfig::new("a", "scripted", -1.0)]);
        assert!(registry.reload(&bad).is_err());
        assert_eq!(registry.available_engines(), vec!["a"]);
    }

    #[test]
    fn test_rolling_quality_moving_average() {
        let config = config_with(vec![EngineConfig::new("a", "scripted", 1.0)]);
        let registry = ProcessorRegistry::new(&config, scripted_factory()).unwrap();
        assert_eq!(registry.rolling_quality("a"), Some(0.5));

        registry.begin_run().record_quality("a", 1.0);
        let q = registry.rolling_quality("a").unwrap();
        assert!((q - 0.6).abs() < 1e-9);
    }
}
