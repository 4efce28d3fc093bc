//! Processing Strategies
//!
//! One strategy per [`ProcessingMode`]. Every strategy receives the run's
//! [`RegistrySnapshot`], calls engines through the dispatch helpers and
//! turns the surviving candidates into a [`ProcessingResult`].
//!
//! | Mode       | Engines                 | Merge                         |
//! |------------|-------------------------|-------------------------------|
//! | Single     | highest weight          | direct                        |
//! | Parallel   | all, concurrently       | vote unless one responded     |
//! | Sequential | all, one at a time      | masked text, direct           |
//! | Ensemble   | all, concurrently       | always vote                   |
//! | Adaptive   | picks one of the above  | as chosen                     |

mod adaptive;
mod dispatch;
mod ensemble;
mod parallel;
mod sequential;
mod single;

pub use adaptive::{AdaptiveStrategy, select_mode};
pub use ensemble::EnsembleStrategy;
pub use parallel::ParallelStrategy;
pub use sequential::SequentialStrategy;
pub use single::SingleStrategy;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::config::{AdaptiveConfig, Config, ProcessingMode};
use crate::engine::RegistrySnapshot;
use crate::ensemble::{EnsembleVoter, VoteOutcome};
use crate::text::CandidateGate;
use crate::types::{DescryError, ProcessingResult, Result};

#[async_trait]
pub trait ProcessingStrategy: Send + Sync {
    fn mode(&self) -> ProcessingMode;

    async fn run(&self, text: &str, snapshot: &RegistrySnapshot) -> Result<ProcessingResult>;
}

/// Shared pieces every strategy needs, built once per configuration
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub voter: EnsembleVoter,
    pub gate: CandidateGate,
    pub adaptive: AdaptiveConfig,
}

impl StrategyContext {
    pub fn new(config: &Config) -> Self {
        Self {
            voter: EnsembleVoter::new(config),
            gate: CandidateGate::new(&config.boundary),
            adaptive: config.adaptive.clone(),
        }
    }

    /// Fold precision into rolling quality and assemble the run's result
    pub(crate) fn finish(
        &self,
        mode: ProcessingMode,
        text: &str,
        outcome: VoteOutcome,
        used: BTreeSet<String>,
        snapshot: &RegistrySnapshot,
        started: Instant,
    ) -> ProcessingResult {
        for (engine_id, precision) in &outcome.engine_precision {
            snapshot.record_quality(engine_id, *precision);
        }

        let mut result = ProcessingResult::new(mode, text, outcome.descriptions, outcome.metrics)
            .with_engines(used, snapshot.failed_engines());
        result.elapsed_ms = started.elapsed().as_millis() as u64;
        result
    }
}

/// Weights of the engines that answered
pub(crate) fn weights_of<'a>(
    engines: impl IntoIterator<Item = &'a crate::engine::EngineHandle>,
) -> BTreeMap<String, f64> {
    engines
        .into_iter()
        .map(|e| (e.id.clone(), e.weight))
        .collect()
}

pub(crate) fn no_engines(snapshot: &RegistrySnapshot) -> DescryError {
    DescryError::NoEnginesAvailable {
        configured: snapshot.configured_count(),
    }
}

/// Builds strategies sharing one [`StrategyContext`]
#[derive(Debug, Clone)]
pub struct StrategyFactory {
    context: Arc<StrategyContext>,
}

impl StrategyFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            context: Arc::new(StrategyContext::new(config)),
        }
    }

    pub fn context(&self) -> &StrategyContext {
        &self.context
    }

    pub fn create(&self, mode: ProcessingMode) -> Box<dyn ProcessingStrategy> {
        let context = Arc::clone(&self.context);
        match mode {
            ProcessingMode::Single => Box::new(SingleStrategy::new(context)),
            ProcessingMode::Parallel => Box::new(ParallelStrategy::new(context)),
            ProcessingMode::Sequential => Box::new(SequentialStrategy::new(context)),
            ProcessingMode::Ensemble => Box::new(EnsembleStrategy::new(context)),
            ProcessingMode::Adaptive => Box::new(AdaptiveStrategy::new(context)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::{Config, EngineConfig};
    use crate::engine::testing::ScriptedAdapter;
    use crate::engine::{AdapterFactory, ProcessorRegistry, SharedAdapter};

    /// Registry whose engines are the given scripted adapters, keyed by id
    pub fn scripted_registry(
        adapters: Vec<(ScriptedAdapter, f64)>,
        configure: impl FnOnce(&mut Config),
    ) -> (ProcessorRegistry, Config) {
        let mut factory = AdapterFactory::empty();
        let mut engines = Vec::new();
        for (adapter, weight) in adapters {
            let id = crate::engine::EngineAdapter::id(&adapter).to_string();
            let shared: SharedAdapter = Arc::new(adapter);
            factory.register(id.clone(), move |_, _| Ok(Arc::clone(&shared)));
            engines.push(EngineConfig::new(id.clone(), id, weight));
        }

        let mut config = Config {
            engines,
            ..Config::default()
        };
        configure(&mut config);
        let registry = ProcessorRegistry::new(&config, factory).unwrap();
        (registry, config)
    }
}
