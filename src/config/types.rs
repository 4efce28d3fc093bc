//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/descry/) and project (.descry/) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{
    adaptive as adaptive_constants, boundary as boundary_constants,
    circuit_breaker as cb_constants, engine as engine_constants, quality as quality_constants,
    voting as voting_constants,
};
use crate::types::{DescryError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Run-level settings (default mode, timeouts, health)
    pub runtime: RuntimeConfig,

    /// Configured analysis engines
    pub engines: Vec<EngineConfig>,

    /// Voting settings
    pub ensemble: EnsembleConfig,

    /// Sentence boundary settings
    pub boundary: BoundaryConfig,

    /// Quality and priority scoring settings
    pub quality: QualityConfig,

    /// Adaptive routing thresholds
    pub adaptive: AdaptiveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            runtime: RuntimeConfig::default(),
            engines: default_engines(),
            ensemble: EnsembleConfig::default(),
            boundary: BoundaryConfig::default(),
            quality: QualityConfig::default(),
            adaptive: AdaptiveConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DescryError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.engines.is_empty() {
            return Err(DescryError::config("At least one engine must be configured"));
        }

        let mut seen = HashSet::new();
        for engine in &self.engines {
            if engine.id.trim().is_empty() {
                return Err(DescryError::config("Engine id must not be empty"));
            }
            if !seen.insert(engine.id.as_str()) {
                return Err(DescryError::config(format!(
                    "Duplicate engine id: {}",
                    engine.id
                )));
            }
            if !(engine.weight.is_finite() && engine.weight > 0.0) {
                return Err(DescryError::config(format!(
                    "Engine '{}' weight must be a positive number, got {}",
                    engine.id, engine.weight
                )));
            }
            if engine.timeout_secs == Some(0) {
                return Err(DescryError::config(format!(
                    "Engine '{}' timeout_secs must be greater than 0",
                    engine.id
                )));
            }
        }

        check_unit_interval("ensemble.consensus_threshold", self.ensemble.consensus_threshold)?;
        check_unit_interval("ensemble.cluster_overlap", self.ensemble.cluster_overlap)?;
        check_unit_interval("ensemble.dedup_overlap", self.ensemble.dedup_overlap)?;
        if !(0.0..=1.0).contains(&self.ensemble.confidence_blend) {
            return Err(DescryError::config(format!(
                "ensemble.confidence_blend must be between 0.0 and 1.0, got {}",
                self.ensemble.confidence_blend
            )));
        }

        if self.boundary.min_sentences == 0 {
            return Err(DescryError::config(
                "boundary.min_sentences must be greater than 0",
            ));
        }
        if self.boundary.min_sentences > self.boundary.max_sentences_per_description {
            return Err(DescryError::config(format!(
                "boundary.min_sentences ({}) exceeds max_sentences_per_description ({})",
                self.boundary.min_sentences, self.boundary.max_sentences_per_description
            )));
        }

        let window = &self.quality.target_length_window;
        if window.min > window.max {
            return Err(DescryError::config(format!(
                "quality.target_length_window is inverted: {} > {}",
                window.min, window.max
            )));
        }
        if self.boundary.min_length > window.min {
            return Err(DescryError::config(format!(
                "boundary.min_length ({}) must not exceed the target window minimum ({})",
                self.boundary.min_length, window.min
            )));
        }
        if self.quality.weights.total() <= 0.0 || !self.quality.weights.all_non_negative() {
            return Err(DescryError::config(
                "quality.weights must be non-negative and not all zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.quality.confidence_weight) {
            return Err(DescryError::config(format!(
                "quality.confidence_weight must be between 0.0 and 1.0, got {}",
                self.quality.confidence_weight
            )));
        }

        if self.adaptive.single_max_chars > self.adaptive.ensemble_min_chars {
            return Err(DescryError::config(format!(
                "adaptive.single_max_chars ({}) exceeds ensemble_min_chars ({})",
                self.adaptive.single_max_chars, self.adaptive.ensemble_min_chars
            )));
        }

        if self.runtime.engine_timeout_secs == 0 {
            return Err(DescryError::config(
                "runtime.engine_timeout_secs must be greater than 0",
            ));
        }
        if self.runtime.circuit_breaker.failure_threshold == 0 {
            return Err(DescryError::config(
                "runtime.circuit_breaker.failure_threshold must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Timeout for one engine call, honoring the per-engine override
    pub fn engine_timeout(&self, engine: &EngineConfig) -> Duration {
        Duration::from_secs(engine.timeout_secs.unwrap_or(self.runtime.engine_timeout_secs))
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(DescryError::config(format!(
            "{} must be in (0.0, 1.0], got {}",
            name, value
        )))
    }
}

// =============================================================================
// Processing Mode
// =============================================================================

/// Execution strategy for one extraction call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Highest-weight engine only
    Single,
    /// All engines concurrently, voting when more than one responded
    Parallel,
    /// Engines one at a time over the still-unclaimed text
    Sequential,
    /// All engines concurrently, always voting
    Ensemble,
    /// Chooses Single, Parallel or Ensemble from text features
    #[default]
    Adaptive,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 5] = [
        ProcessingMode::Single,
        ProcessingMode::Parallel,
        ProcessingMode::Sequential,
        ProcessingMode::Ensemble,
        ProcessingMode::Adaptive,
    ];
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Single => write!(f, "single"),
            ProcessingMode::Parallel => write!(f, "parallel"),
            ProcessingMode::Sequential => write!(f, "sequential"),
            ProcessingMode::Ensemble => write!(f, "ensemble"),
            ProcessingMode::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ProcessingMode::Single),
            "parallel" => Ok(ProcessingMode::Parallel),
            "sequential" => Ok(ProcessingMode::Sequential),
            "ensemble" => Ok(ProcessingMode::Ensemble),
            "adaptive" => Ok(ProcessingMode::Adaptive),
            _ => Err(format!(
                "Unknown processing mode: {}. Valid values: single, parallel, sequential, ensemble, adaptive",
                s
            )),
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Mode used when the caller does not pick one
    pub default_mode: ProcessingMode,
    /// Per-engine call timeout in seconds
    pub engine_timeout_secs: u64,
    /// Engine health tracking across runs
    pub circuit_breaker: CircuitBreakerSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_mode: ProcessingMode::Adaptive,
            engine_timeout_secs: engine_constants::DEFAULT_TIMEOUT_SECS,
            circuit_breaker: CircuitBreakerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before an engine is considered unhealthy
    pub failure_threshold: u32,
    /// Seconds before an unhealthy engine is probed again
    pub recovery_timeout_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: cb_constants::FAILURE_THRESHOLD,
            recovery_timeout_secs: cb_constants::RECOVERY_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// One configured analysis engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Unique engine identity
    pub id: String,
    /// Adapter constructor key ("lexicon", "morphology", "syntax", "entity", ...)
    pub kind: String,
    /// Relative trust in this engine's votes
    pub weight: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Prior quality score (0.0 - 1.0)
    #[serde(default = "default_quality_score")]
    pub quality_score: f64,
    /// Overrides `runtime.engine_timeout_secs`
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl EngineConfig {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            weight,
            enabled: true,
            capabilities: Vec::new(),
            quality_score: default_quality_score(),
            timeout_secs: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_quality_score() -> f64 {
    engine_constants::INITIAL_QUALITY
}

/// Built-in engine set
pub fn default_engines() -> Vec<EngineConfig> {
    vec![
        EngineConfig::new("lexicon", "lexicon", 1.0).with_capabilities(&["general"]),
        EngineConfig::new("morphology", "morphology", 1.2).with_capabilities(&["morphology"]),
        EngineConfig::new("syntax", "syntax", 0.8).with_capabilities(&["robust-syntax"]),
        EngineConfig::new("entity", "entity", 1.5)
            .with_capabilities(&["entity-focused"])
            .disabled(),
    ]
}

// =============================================================================
// Ensemble Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Minimum consensus ratio for acceptance
    pub consensus_threshold: f64,
    /// Overlap at which candidates cluster together
    pub cluster_overlap: f64,
    /// Overlap above which accepted descriptions are duplicates
    pub dedup_overlap: f64,
    /// Share of consensus ratio in the confidence blend
    pub confidence_blend: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: voting_constants::CONSENSUS_THRESHOLD,
            cluster_overlap: voting_constants::CLUSTER_OVERLAP,
            dedup_overlap: voting_constants::DEDUP_OVERLAP,
            confidence_blend: voting_constants::CONFIDENCE_BLEND,
        }
    }
}

// =============================================================================
// Boundary Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Candidates shorter than this (characters) are discarded before voting
    pub min_length: usize,
    /// Hard cap on sentences per description
    pub max_sentences_per_description: usize,
    /// Minimum sentences a candidate must span
    pub min_sentences: usize,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            min_length: boundary_constants::MIN_LENGTH,
            max_sentences_per_description: boundary_constants::MAX_SENTENCES,
            min_sentences: boundary_constants::MIN_SENTENCES,
        }
    }
}

// =============================================================================
// Quality Configuration
// =============================================================================

/// Inclusive character window that scores full length fitness
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthWindow {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthWindow {
    fn default() -> Self {
        Self {
            min: quality_constants::TARGET_MIN_LENGTH,
            max: quality_constants::TARGET_MAX_LENGTH,
        }
    }
}

/// Relative weights of the five quality factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub linguistic: f64,
    pub visual_richness: f64,
    pub structural: f64,
    pub type_specificity: f64,
    pub length_fitness: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        use quality_constants::weights;
        Self {
            linguistic: weights::LINGUISTIC,
            visual_richness: weights::VISUAL,
            structural: weights::STRUCTURAL,
            type_specificity: weights::TYPE_SPECIFICITY,
            length_fitness: weights::LENGTH,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.linguistic
            + self.visual_richness
            + self.structural
            + self.type_specificity
            + self.length_fitness
    }

    fn all_non_negative(&self) -> bool {
        [
            self.linguistic,
            self.visual_richness,
            self.structural,
            self.type_specificity,
            self.length_fitness,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub weights: ScoringWeights,
    pub target_length_window: LengthWindow,
    /// Share of confidence in the priority score
    pub confidence_weight: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            target_length_window: LengthWindow::default(),
            confidence_weight: quality_constants::CONFIDENCE_WEIGHT,
        }
    }
}

// =============================================================================
// Adaptive Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Inputs shorter than this use the Single strategy
    pub single_max_chars: usize,
    /// Inputs at least this long use the Ensemble strategy
    pub ensemble_min_chars: usize,
    /// Complexity estimate at or above which Ensemble is used
    pub complexity_threshold: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            single_max_chars: adaptive_constants::SINGLE_MAX_CHARS,
            ensemble_min_chars: adaptive_constants::ENSEMBLE_MIN_CHARS,
            complexity_threshold: adaptive_constants::COMPLEXITY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_default_engines() {
        let engines = default_engines();
        assert_eq!(engines.len(), 4);
        assert!(engines.iter().any(|e| e.id == "entity" && !e.enabled));
    }

    #[test]
    fn test_rejects_duplicate_engine_ids() {
        let mut config = Config::default();
        config.engines.push(EngineConfig::new("lexicon", "lexicon", 1.0));
        assert!(matches!(config.validate(), Err(DescryError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let mut config = Config::default();
        config.ensemble.consensus_threshold = 1.5;
        assert!(config.validate().is_err());
        config.ensemble.consensus_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let mut config = Config::default();
        config.engines[0].weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut config = Config::default();
        config.quality.target_length_window = LengthWindow { min: 600, max: 300 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_sentence_bounds() {
        let mut config = Config::default();
        config.boundary.min_sentences = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_timeout_override() {
        let config = Config::default();
        let engine = EngineConfig::new("slow", "lexicon", 1.0).with_timeout_secs(5);
        assert_eq!(config.engine_timeout(&engine), Duration::from_secs(5));
        assert_eq!(
            config.engine_timeout(&config.engines[0]),
            Duration::from_secs(engine_constants::DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_processing_mode_roundtrip_names() {
        for mode in ProcessingMode::ALL {
            assert_eq!(mode.to_string().parse::<ProcessingMode>().unwrap(), mode);
        }
        assert!("turbo".parse::<ProcessingMode>().is_err());
    }
}
