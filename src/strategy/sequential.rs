use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::dispatch::{EngineInput, call_engine};
use super::{ProcessingStrategy, StrategyContext, no_engines};
use crate::config::ProcessingMode;
use crate::engine::RegistrySnapshot;
use crate::types::{CandidateSpan, ProcessingResult, Result};

/// Engines one after another in weight order, each over the text its
/// predecessors left unclaimed
pub struct SequentialStrategy {
    context: Arc<StrategyContext>,
}

impl SequentialStrategy {
    pub fn new(context: Arc<StrategyContext>) -> Self {
        Self { context }
    }
}

/// Replace claimed character ranges with spaces; character offsets are kept
fn mask(text: &str, claimed: &[(usize, usize)]) -> String {
    text.chars()
        .enumerate()
        .map(|(i, ch)| {
            let covered = claimed.iter().any(|&(start, end)| i >= start && i < end);
            if covered { ' ' } else { ch }
        })
        .collect()
}

fn intersects(candidate: &CandidateSpan, claimed: &[(usize, usize)]) -> bool {
    claimed
        .iter()
        .any(|&(start, end)| candidate.start < end && start < candidate.end)
}

#[async_trait]
impl ProcessingStrategy for SequentialStrategy {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Sequential
    }

    #[instrument(skip(self, text, snapshot), fields(chars = text.len()))]
    async fn run(&self, text: &str, snapshot: &RegistrySnapshot) -> Result<ProcessingResult> {
        let started = Instant::now();
        let engines = snapshot.available_engines();

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        let mut accepted: Vec<CandidateSpan> = Vec::new();
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        let mut used: BTreeSet<String> = BTreeSet::new();

        for engine in &engines {
            let input = if claimed.is_empty() {
                EngineInput::new(text)
            } else {
                EngineInput::new(&mask(text, &claimed))
            };
            let Some(candidates) = call_engine(engine, &input, snapshot).await else {
                continue;
            };
            used.insert(engine.id.clone());
            weights.insert(engine.id.clone(), engine.weight);

            let fresh: Vec<CandidateSpan> = self
                .context
                .gate
                .retain(candidates)
                .into_iter()
                .filter(|c| !intersects(c, &claimed))
                .collect();
            debug!(engine = %engine.id, accepted = fresh.len(), "Sequential pass complete");

            claimed.extend(fresh.iter().map(|c| (c.start, c.end)));
            accepted.extend(fresh);
        }

        if used.is_empty() {
            return Err(no_engines(snapshot));
        }

        let outcome = self.context.voter.pass_through(accepted, &weights);
        info!(
            engines = used.len(),
            descriptions = outcome.descriptions.len(),
            "Sequential run complete"
        );
        Ok(self
            .context
            .finish(self.mode(), text, outcome, used, snapshot, started))
    }
}
