use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{
    EnsembleStrategy, ParallelStrategy, ProcessingStrategy, SingleStrategy, StrategyContext,
};
use crate::config::{AdaptiveConfig, ProcessingMode};
use crate::engine::RegistrySnapshot;
use crate::text::TextFeatures;
use crate::types::{ProcessingResult, Result};

/// Route by text features
///
/// Short or single-sentence input runs on one engine; long or complex input
/// runs the full ensemble; everything in between uses Parallel.
pub fn select_mode(features: &TextFeatures, config: &AdaptiveConfig) -> ProcessingMode {
    if features.chars < config.single_max_chars || features.sentences <= 1 {
        ProcessingMode::Single
    } else if features.chars >= config.ensemble_min_chars
        || features.complexity >= config.complexity_threshold
    {
        ProcessingMode::Ensemble
    } else {
        ProcessingMode::Parallel
    }
}

pub struct AdaptiveStrategy {
    context: Arc<StrategyContext>,
}

impl AdaptiveStrategy {
    pub fn new(context: Arc<StrategyContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ProcessingStrategy for AdaptiveStrategy {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Adaptive
    }

    #[instrument(skip(self, text, snapshot), fields(chars = text.len()))]
    async fn run(&self, text: &str, snapshot: &RegistrySnapshot) -> Result<ProcessingResult> {
        let features = TextFeatures::analyze(text);
        let chosen = select_mode(&features, &self.context.adaptive);
        info!(
            mode = %chosen,
            sentences = features.sentences,
            complexity = features.complexity,
            "Adaptive routing"
        );

        let context = Arc::clone(&self.context);
        match chosen {
            ProcessingMode::Single => SingleStrategy::new(context).run(text, snapshot).await,
            ProcessingMode::Ensemble => EnsembleStrategy::new(context).run(text, snapshot).await,
            _ => ParallelStrategy::new(context).run(text, snapshot).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{CASTLE_PASSAGE, ScriptedAdapter, long_text};
    use crate::strategy::test_support::scripted_registry;
    use crate::types::DescriptionType;

    fn features(chars: usize, sentences: usize, complexity: f64) -> TextFeatures {
        TextFeatures {
            chars,
            sentences,
            complexity,
            ..TextFeatures::default()
        }
    }

    #[test]
    fn test_routing_thresholds() {
        let config = AdaptiveConfig::default();
        assert_eq!(select_mode(&features(50, 1, 0.1), &config), ProcessingMode::Single);
        assert_eq!(select_mode(&features(900, 1, 0.9), &config), ProcessingMode::Single);
        assert_eq!(select_mode(&features(399, 4, 0.9), &config), ProcessingMode::Single);
        assert_eq!(select_mode(&features(900, 6, 0.3), &config), ProcessingMode::Parallel);
        assert_eq!(select_mode(&features(900, 6, 0.65), &config), ProcessingMode::Ensemble);
        assert_eq!(select_mode(&features(1500, 12, 0.1), &config), ProcessingMode::Ensemble);
    }

    #[test]
    fn test_routing_from_real_text() {
        let config = AdaptiveConfig::default();
        let short = "A quiet harbour lay under the moon.";
        assert_eq!(
            select_mode(&TextFeatures::analyze(short), &config),
            ProcessingMode::Single
        );

        let long = long_text(6);
        assert!(long.chars().count() >= 2000);
        assert_eq!(
            select_mode(&TextFeatures::analyze(&long), &config),
            ProcessingMode::Ensemble
        );
    }

    #[tokio::test]
    async fn test_result_reports_chosen_strategy() {
        let len = CASTLE_PASSAGE.chars().count();
        let adapter = |id: &str| {
            ScriptedAdapter::new(id).with_span(CASTLE_PASSAGE, 0, len, DescriptionType::Location, 0.8)
        };
        let (registry, config) =
            scripted_registry(vec![(adapter("a"), 1.0), (adapter("b"), 1.0)], |_| {});
        let strategy = AdaptiveStrategy::new(Arc::new(StrategyContext::new(&config)));

        let result = strategy.run(CASTLE_PASSAGE, &registry.begin_run()).await.unwrap();
        // Castle passage is under 400 characters
        assert_eq!(result.mode, ProcessingMode::Single);
        assert_eq!(result.engines_used.len(), 1);
    }
}
