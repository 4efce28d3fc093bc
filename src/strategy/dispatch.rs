//! Engine calls on blocking workers
//!
//! Every adapter call runs on `spawn_blocking` under the engine's timeout.
//! Outcomes are recorded on the run snapshot; failures exclude the engine
//! from the rest of the run and never propagate.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::engine::{EngineHandle, RegistrySnapshot};
use crate::types::{CandidateSpan, DescryError, EngineError};

/// Input shared by every engine of a run
#[derive(Debug, Clone)]
pub(crate) struct EngineInput {
    pub text: Arc<str>,
    pub chars: usize,
}

impl EngineInput {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            text: Arc::from(text),
        }
    }
}

/// Candidates from one engine that answered in time
#[derive(Debug, Clone)]
pub(crate) struct EngineResponse {
    pub engine: EngineHandle,
    pub candidates: Vec<CandidateSpan>,
}

/// Call one engine; `None` when it failed or timed out
pub(crate) async fn call_engine(
    engine: &EngineHandle,
    input: &EngineInput,
    snapshot: &RegistrySnapshot,
) -> Option<Vec<CandidateSpan>> {
    let started = Instant::now();
    let outcome = invoke(engine, input).await;
    let latency = started.elapsed();

    match outcome {
        Ok(candidates) => {
            debug!(
                engine = %engine.id,
                candidates = candidates.len(),
                latency_ms = latency.as_millis() as u64,
                "Engine responded"
            );
            snapshot.record_success(&engine.id, latency, candidates.len());
            Some(candidates)
        }
        Err(err) => {
            warn!(engine = %engine.id, kind = %err.kind, error = %err.message, "Engine call failed");
            snapshot.record_failure(&err, latency);
            None
        }
    }
}

async fn invoke(
    engine: &EngineHandle,
    input: &EngineInput,
) -> Result<Vec<CandidateSpan>, EngineError> {
    let adapter = Arc::clone(&engine.adapter);
    let text = Arc::clone(&input.text);
    let task = tokio::task::spawn_blocking(move || adapter.extract(&text));

    // A timed-out worker keeps running; its late result is dropped with the handle
    let joined = tokio::time::timeout(engine.timeout, task)
        .await
        .map_err(|_| EngineError::timeout(&engine.id, engine.timeout))?;

    let extracted = joined
        .map_err(|e| EngineError::failed(&engine.id, format!("adapter panicked: {}", e)))?;

    let candidates = extracted.map_err(|e| match e {
        DescryError::Engine(mut err) => {
            err.engine_id = engine.id.clone();
            err
        }
        other => EngineError::failed(&engine.id, other.to_string()),
    })?;

    Ok(within_bounds(&engine.id, candidates, input.chars))
}

/// Drop spans outside the input and stamp the registry id on the rest
fn within_bounds(engine_id: &str, candidates: Vec<CandidateSpan>, chars: usize) -> Vec<CandidateSpan> {
    let before = candidates.len();
    let kept: Vec<CandidateSpan> = candidates
        .into_iter()
        .filter(|c| c.start < c.end && c.end <= chars && c.confidence.is_finite())
        .map(|mut c| {
            if c.engine_id != engine_id {
                c.engine_id = engine_id.to_string();
            }
            c
        })
        .collect();

    if kept.len() < before {
        warn!(
            engine = %engine_id,
            dropped = before - kept.len(),
            "Dropped out-of-bounds or non-finite candidate spans"
        );
    }
    kept
}

/// Call all engines concurrently; responses come back in engine order
pub(crate) async fn fan_out(
    engines: &[EngineHandle],
    input: &EngineInput,
    snapshot: &RegistrySnapshot,
) -> Vec<EngineResponse> {
    let calls = engines
        .iter()
        .map(|engine| call_engine(engine, input, snapshot));
    let results = join_all(calls).await;

    engines
        .iter()
        .zip(results)
        .filter_map(|(engine, result)| {
            result.map(|candidates| EngineResponse {
                engine: engine.clone(),
                candidates,
            })
        })
        .collect()
}
