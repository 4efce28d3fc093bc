use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::dispatch::{EngineInput, EngineResponse, fan_out};
use super::{ProcessingStrategy, StrategyContext, no_engines, weights_of};
use crate::config::ProcessingMode;
use crate::engine::RegistrySnapshot;
use crate::ensemble::VoteOutcome;
use crate::types::{CandidateSpan, ProcessingResult, Result};

/// All engines concurrently; votes unless exactly one engine responded
pub struct ParallelStrategy {
    context: Arc<StrategyContext>,
}

impl ParallelStrategy {
    pub fn new(context: Arc<StrategyContext>) -> Self {
        Self { context }
    }
}

/// Gate every response and gather the candidates in engine order
pub(super) fn gather(context: &StrategyContext, responses: &[EngineResponse]) -> Vec<CandidateSpan> {
    responses
        .iter()
        .flat_map(|r| context.gate.retain(r.candidates.clone()))
        .collect()
}

#[async_trait]
impl ProcessingStrategy for ParallelStrategy {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Parallel
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

        let candidates = gather(&self.context, &responses);
        let outcome: VoteOutcome = match responses.as_slice() {
            [only] => self.context.voter.from_single_engine(candidates, only.engine.weight),
            _ => {
                let weights = weights_of(responses.iter().map(|r| &r.engine));
                self.context.voter.vote(candidates, &weights)
            }
        };

        info!(
            responded = responses.len(),
            requested = engines.len(),
            descriptions = outcome.descriptions.len(),
            "Parallel run complete"
        );

        let used: BTreeSet<String> = responses.iter().map(|r| r.engine.id.clone()).collect();
        Ok(self
            .context
            .finish(self.mode(), text, outcome, used, snapshot, started))
    }
}
