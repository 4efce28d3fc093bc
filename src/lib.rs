//! descry - Multi-Engine Description Extraction
//!
//! Finds descriptive passages in prose (settings, characters, atmosphere,
//! objects, actions) by running several independent rule-based engines over
//! the same text and reconciling their proposals with a weighted vote.
//!
//! ## Core Features
//!
//! - **Processing Modes**: single, parallel, sequential, ensemble and
//!   adaptive routing by text features
//! - **Weighted Voting**: overlap clustering, consensus threshold, blended
//!   confidence, deduplication and priority ordering
//! - **Fault Tolerance**: per-engine timeouts, run-local exclusion and
//!   circuit breakers across runs
//! - **Hot Reload**: explicit configuration reload without disturbing runs
//!   already in flight
//!
//! ## Quick Start
//!
//! ```ignore
//! use descry::{Config, MultiEngineManager, ProcessingMode};
//!
//! let manager = MultiEngineManager::new(Config::default())?;
//! let result = manager.extract(&chapter, ProcessingMode::Adaptive).await?;
//! for d in &result.descriptions {
//!     println!("{} {:.1} {}", d.description_type, d.priority_score, d.text);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: adapters, registry, circuit breakers
//! - [`ensemble`]: clustering and weighted voting
//! - [`strategy`]: one strategy per processing mode
//! - [`text`]: sentences, boundaries, filters, classification, scoring
//! - [`orchestrator`]: the extraction entry point

pub mod cli;
pub mod config;
pub mod constants;
pub mod engine;
pub mod ensemble;
pub mod orchestrator;
pub mod strategy;
pub mod text;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader, EngineConfig, ProcessingMode};
pub use types::{
    CandidateSpan, ConsensusDescription, DescriptionType, DescryError, EngineError,
    EngineErrorKind, ProcessingMetrics, ProcessingResult, Result,
};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use engine::{
    AdapterFactory, EngineAdapter, EngineDescriptor, EngineStatus, ProcessorRegistry,
    RegistrySnapshot, SharedAdapter,
};
pub use ensemble::EnsembleVoter;
pub use orchestrator::MultiEngineManager;
pub use strategy::{ProcessingStrategy, StrategyFactory};
