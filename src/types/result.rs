use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ConsensusDescription;
use crate::config::ProcessingMode;

/// Aggregate quality metrics for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Mean confidence of emitted descriptions (0.0 when none)
    pub mean_confidence: f64,
    /// Accepted groups divided by candidate groups (0.0 when no groups)
    pub consensus_rate: f64,
    /// Candidates that passed the gate and entered merging
    pub candidate_count: usize,
    /// Candidate groups formed by clustering
    pub group_count: usize,
    /// Groups accepted before deduplication
    pub accepted_count: usize,
}

impl ProcessingMetrics {
    pub fn new(candidate_count: usize, group_count: usize, accepted_count: usize) -> Self {
        let consensus_rate = if group_count == 0 {
            0.0
        } else {
            accepted_count as f64 / group_count as f64
        };
        Self {
            mean_confidence: 0.0,
            consensus_rate,
            candidate_count,
            group_count,
            accepted_count,
        }
    }

    pub fn with_mean_confidence(mut self, descriptions: &[ConsensusDescription]) -> Self {
        self.mean_confidence = if descriptions.is_empty() {
            0.0
        } else {
            descriptions.iter().map(|d| d.confidence).sum::<f64>() / descriptions.len() as f64
        };
        self
    }
}

/// Outcome of one extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub run_id: String,
    /// Strategy that actually executed (Adaptive reports its choice)
    pub mode: ProcessingMode,
    pub descriptions: Vec<ConsensusDescription>,
    pub metrics: ProcessingMetrics,
    pub elapsed_ms: u64,
    pub engines_used: BTreeSet<String>,
    /// Engines excluded during the run, with the reason
    pub failed_engines: BTreeMap<String, String>,
    pub input_chars: usize,
    /// SHA-256 of the input text
    pub input_digest: String,
    pub completed_at: String,
}

impl ProcessingResult {
    pub fn new(
        mode: ProcessingMode,
        text: &str,
        descriptions: Vec<ConsensusDescription>,
        metrics: ProcessingMetrics,
    ) -> Self {
        let metrics = metrics.with_mean_confidence(&descriptions);
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            mode,
            descriptions,
            metrics,
            elapsed_ms: 0,
            engines_used: BTreeSet::new(),
            failed_engines: BTreeMap::new(),
            input_chars: text.chars().count(),
            input_digest: input_digest(text),
            completed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Empty result for inputs that cannot hold a description
    pub fn empty(mode: ProcessingMode, text: &str) -> Self {
        Self::new(mode, text, Vec::new(), ProcessingMetrics::default())
    }

    pub fn with_engines(
        mut self,
        used: BTreeSet<String>,
        failed: BTreeMap<String, String>,
    ) -> Self {
        self.engines_used = used;
        self.failed_engines = failed;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

/// Hex-encoded SHA-256 of the input text
pub fn input_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
