//! Multi-Engine Manager
//!
//! Entry point for extraction. Each call takes a registry snapshot, builds the
//! requested strategy and runs it. Configuration reloads swap the registry
//! engine set and the strategy factory together; calls already running keep
//! what they started with.

use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::{info, instrument, warn};

use crate::config::{Config, ProcessingMode};
use crate::engine::{AdapterFactory, EngineStatus, ProcessorRegistry};
use crate::strategy::StrategyFactory;
use crate::types::{DescryError, ProcessingResult, Result};

struct RunSettings {
    config: Arc<Config>,
    strategies: StrategyFactory,
}

impl RunSettings {
    fn new(config: Config) -> Self {
        Self {
            strategies: StrategyFactory::new(&config),
            config: Arc::new(config),
        }
    }
}

pub struct MultiEngineManager {
    registry: ProcessorRegistry,
    settings: RwLock<Arc<RunSettings>>,
}

impl MultiEngineManager {
    /// Manager over the built-in adapters
    pub fn new(config: Config) -> Result<Self> {
        Self::with_factory(config, AdapterFactory::with_builtins())
    }

    /// Manager over a caller-supplied adapter factory
    pub fn with_factory(config: Config, factory: AdapterFactory) -> Result<Self> {
        let registry = ProcessorRegistry::new(&config, factory)?;
        info!(
            engines = registry.configured_count(),
            available = registry.available_engines().len(),
            mode = %config.runtime.default_mode,
            "Extraction manager ready"
        );
        Ok(Self {
            registry,
            settings: RwLock::new(Arc::new(RunSettings::new(config))),
        })
    }

    fn settings(&self) -> Arc<RunSettings> {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.settings().config)
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Extract with the configured default mode
    pub async fn extract_default(&self, text: &str) -> Result<ProcessingResult> {
        let mode = self.settings().config.runtime.default_mode;
        self.extract(text, mode).await
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn extract(&self, text: &str, mode: ProcessingMode) -> Result<ProcessingResult> {
        let settings = self.settings();

        let chars = text.chars().count();
        if chars < settings.config.boundary.min_length {
            info!(
                chars,
                min_length = settings.config.boundary.min_length,
                "Input too short for a description"
            );
            return Ok(ProcessingResult::empty(mode, text));
        }

        let snapshot = self.registry.begin_run();
        let strategy = settings.strategies.create(mode);
        let result = strategy.run(text, &snapshot).await?;

        info!(
            run_id = %result.run_id,
            mode = %result.mode,
            descriptions = result.descriptions.len(),
            consensus_rate = result.metrics.consensus_rate,
            elapsed_ms = result.elapsed_ms,
            "Extraction complete"
        );
        Ok(result)
    }

    /// Extract unless `cancelled` resolves first
    ///
    /// On cancellation in-flight engine calls are abandoned and nothing is
    /// emitted.
    pub async fn extract_until<C>(
        &self,
        text: &str,
        mode: ProcessingMode,
        cancelled: C,
    ) -> Result<ProcessingResult>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.extract(text, mode) => result,
            () = cancelled => {
                warn!(%mode, "Extraction cancelled");
                Err(DescryError::Cancelled)
            }
        }
    }

    /// Apply a new configuration
    ///
    /// The registry validates and builds every adapter first; on error the
    /// running configuration stays in place.
    pub fn reload(&self, config: Config) -> Result<()> {
        self.registry.reload(&config)?;
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *settings = Arc::new(RunSettings::new(config));
        Ok(())
    }

    pub fn engine_status(&self) -> Vec<EngineStatus> {
        self.registry.engine_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::testing::{ScriptedAdapter, TWO_PARAGRAPHS, long_text};
    use crate::engine::SharedAdapter;
    use crate::types::DescriptionType;
    use std::time::Duration;

    fn manager_over(adapters: Vec<(ScriptedAdapter, f64)>) -> MultiEngineManager {
        let mut factory = AdapterFactory::with_builtins();
        let mut engines = Vec::new();
        for (adapter, weight) in adapters {
            let id = crate::engine::EngineAdapter::id(&adapter).to_string();
            let shared: SharedAdapter = Arc::new(adapter);
            factory.register(format!("scripted-{}", id), move |_, _| Ok(Arc::clone(&shared)));
            engines.push(EngineConfig::new(id.clone(), format!("scripted-{}", id), weight));
        }
        let config = Config {
            engines,
            ..Config::default()
        };
        MultiEngineManager::with_factory(config, factory).unwrap()
    }

    #[tokio::test]
    async fn test_short_input_returns_empty_result() {
        let manager = MultiEngineManager::new(Config::default()).unwrap();
        let result = manager
            .extract("A small room.", ProcessingMode::Ensemble)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(result.engines_used.is_empty());
    }

    #[tokio::test]
    async fn test_builtin_engines_find_descriptions() {
        let manager = MultiEngineManager::new(Config::default()).unwrap();
        let text = long_text(2);

        let result = manager.extract(&text, ProcessingMode::Parallel).await.unwrap();
        assert!(!result.is_empty());
        assert!(result.descriptions.iter().all(|d| d.end <= result.input_chars));
        assert!(result.engines_used.len() >= 2);
        for pair in result.descriptions.windows(2) {
            assert!(pair[0].priority_score >= pair[1].priority_score);
        }
    }

    #[tokio::test]
    async fn test_extraction_is_deterministic() {
        let manager = MultiEngineManager::new(Config::default()).unwrap();
        let text = long_text(3);

        let first = manager.extract(&text, ProcessingMode::Ensemble).await.unwrap();
        let expected = serde_json::to_string(&first.descriptions).unwrap();
        for _ in 0..3 {
            let again = manager.extract(&text, ProcessingMode::Ensemble).await.unwrap();
            assert_eq!(serde_json::to_string(&again.descriptions).unwrap(), expected);
            assert_eq!(again.input_digest, first.input_digest);
        }
    }

    #[tokio::test]
    async fn test_adaptive_picks_ensemble_for_long_text() {
        let manager = MultiEngineManager::new(Config::default()).unwrap();
        let text = long_text(6);

        let result = manager.extract(&text, ProcessingMode::Adaptive).await.unwrap();
        assert_eq!(result.mode, ProcessingMode::Ensemble);
    }

    #[tokio::test]
    async fn test_default_mode_comes_from_config() {
        let mut config = Config::default();
        config.runtime.default_mode = ProcessingMode::Single;
        let manager = MultiEngineManager::new(config).unwrap();

        let result = manager.extract_default(TWO_PARAGRAPHS).await.unwrap();
        assert_eq!(result.mode, ProcessingMode::Single);
        assert_eq!(result.engines_used.len(), 1);
    }

    #[tokio::test]
    async fn test_every_engine_failing_is_reported() {
        let manager = manager_over(vec![
            (ScriptedAdapter::new("a").failing("boom"), 1.0),
            (ScriptedAdapter::new("b").failing("boom"), 1.0),
        ]);
        let err = manager
            .extract(TWO_PARAGRAPHS, ProcessingMode::Ensemble)
            .await
            .unwrap_err();
        assert!(matches!(err, DescryError::NoEnginesAvailable { configured: 2 }));

        let status = manager.engine_status();
        assert!(status.iter().all(|s| s.failures == 1));
    }

    #[tokio::test]
    async fn test_cancellation_emits_nothing() {
        let manager = manager_over(vec![(
            ScriptedAdapter::new("slow").with_delay(Duration::from_millis(300)),
            1.0,
        )]);
        let err = manager
            .extract_until(
                TWO_PARAGRAPHS,
                ProcessingMode::Single,
                tokio::time::sleep(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DescryError::Cancelled));
    }

    #[tokio::test]
    async fn test_uncancelled_run_completes() {
        let len = TWO_PARAGRAPHS.find("\n\n").unwrap();
        let manager = manager_over(vec![(
            ScriptedAdapter::new("a").with_span(TWO_PARAGRAPHS, 0, len, DescriptionType::Location, 0.8),
            1.0,
        )]);
        let result = manager
            .extract_until(TWO_PARAGRAPHS, ProcessingMode::Single, std::future::pending())
            .await
            .unwrap();
        assert_eq!(result.descriptions.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_changes_threshold_for_next_run() {
        let manager = MultiEngineManager::new(Config::default()).unwrap();
        let mut strict = Config::default();
        strict.ensemble.consensus_threshold = 1.0;
        manager.reload(strict).unwrap();
        assert_eq!(manager.config().ensemble.consensus_threshold, 1.0);

        let mut invalid = Config::default();
        invalid.ensemble.consensus_threshold = 2.0;
        assert!(manager.reload(invalid).is_err());
        assert_eq!(manager.config().ensemble.consensus_threshold, 1.0);
    }
}
