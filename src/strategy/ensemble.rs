use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::dispatch::{EngineInput, fan_out};
use super::parallel::gather;
use super::{ProcessingStrategy, StrategyContext, no_engines, weights_of};
use crate::config::ProcessingMode;
use crate::engine::RegistrySnapshot;
use crate::types::{ProcessingResult, Result};

/// All engines concurrently; every group goes through the weighted vote
pub struct EnsembleStrategy {
    context: Arc<StrategyContext>,
}

impl EnsembleStrategy {
    pub fn new(context: Arc<StrategyContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ProcessingStrategy for EnsembleStrategy {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Ensemble
    }

    #[instrument(skip(self, text, snapshot), fields(chars = text.len()))]
    async fn run(&self, text: &str, snapshot: &RegistrySnapshot) -> Result<ProcessingResult> {
        let started = Instant::now();
        let input = EngineInput::new(text);
        let engines = snapshot.available_engines();

        let responses = fan_out(&engines, &input, snapshot).await;
        if responses.is_empty() {
            return Err(no_engines(snapshot));
        }

        let weights = weights_of(responses.iter().map(|r| &r.engine));
        let outcome = self
            .context
            .voter
            .vote(gather(&self.context, &responses), &weights);

        info!(
            responded = responses.len(),
            requested = engines.len(),
            groups = outcome.metrics.group_count,
            descriptions = outcome.descriptions.len(),
            "Ensemble run complete"
        );

        let used: BTreeSet<String> = responses.iter().map(|r| r.engine.id.clone()).collect();
        Ok(self
            .context
            .finish(self.mode(), text, outcome, used, snapshot, started))
    }
}
