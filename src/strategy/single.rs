use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::dispatch::{EngineInput, call_engine};
use super::{ProcessingStrategy, StrategyContext, no_engines};
use crate::config::ProcessingMode;
use crate::engine::RegistrySnapshot;
use crate::types::{ProcessingResult, Result};

/// Highest-weight engine only, falling back down the weight order on failure
pub struct SingleStrategy {
    context: Arc<StrategyContext>,
}

impl SingleStrategy {
    pub fn new(context: Arc<StrategyContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ProcessingStrategy for SingleStrategy {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Single
    }

    #[instrument(skip(self, text, snapshot), fields(chars = text.len()))]
    async fn run(&self, text: &str, snapshot: &RegistrySnapshot) -> Result<ProcessingResult> {
        let started = Instant::now();
        let input = EngineInput::new(text);

        for engine in snapshot.available_engines() {
            let Some(candidates) = call_engine(&engine, &input, snapshot).await else {
                continue;
            };

            let candidates = self.context.gate.retain(candidates);
            let outcome = self
                .context
                .voter
                .from_single_engine(candidates, engine.weight);
            info!(
                engine = %engine.id,
                descriptions = outcome.descriptions.len(),
                "Single-engine run complete"
            );

            let used = BTreeSet::from([engine.id.clone()]);
            return Ok(self
                .context
                .finish(self.mode(), text, outcome, used, snapshot, started));
        }

        Err(no_engines(snapshot))
    }
}
