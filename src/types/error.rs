//! Unified Error Type System
//!
//! Centralized error types for the extraction core.
//!
//! ## Engine Error Kinds
//!
//! - **Unavailable**: Engine failed to load (excluded from the run, run continues)
//! - **Timeout**: Engine exceeded its budget (excluded from the run, run continues)
//! - **Failed**: Engine returned an error (excluded from the run, run continues)
//!
//! Engine-level failures never reach the caller on their own. Only total
//! unavailability, malformed configuration and cancellation do.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Engine Error Kinds
// =============================================================================

/// Categories of engine failure, all recovered locally by the strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// Model or backend failed to load
    Unavailable,
    /// Adapter exceeded its time budget
    Timeout,
    /// Adapter raised an error while extracting
    Failed,
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl EngineErrorKind {
    /// Whether this failure should count against the engine's circuit breaker
    pub fn counts_against_health(&self) -> bool {
        matches!(self, Self::Timeout | Self::Failed)
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Engine error with kind and originating engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub engine_id: String,
    pub message: String,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.engine_id, self.kind, self.message)
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn new(
        kind: EngineErrorKind,
        engine_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            engine_id: engine_id.into(),
            message: message.into(),
        }
    }

    /// Engine could not be constructed or loaded
    pub fn unavailable(engine_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Unavailable, engine_id, message)
    }

    /// Engine exceeded its timeout
    pub fn timeout(engine_id: impl Into<String>, duration: Duration) -> Self {
        Self::new(
            EngineErrorKind::Timeout,
            engine_id,
            format!("no response within {:?}", duration),
        )
    }

    /// Engine returned an error
    pub fn failed(engine_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Failed, engine_id, message)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DescryError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// Single engine failure (recovered inside strategies)
    #[error("Engine error: {0}")]
    Engine(EngineError),

    /// Zero usable engines for a run
    #[error("No engines available ({configured} configured)")]
    NoEnginesAvailable { configured: usize },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Run Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl From<EngineError> for DescryError {
    fn from(err: EngineError) -> Self {
        DescryError::Engine(err)
    }
}

pub type Result<T> = std::result::Result<T, DescryError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl DescryError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error is fatal for the run that produced it
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Engine(_) | Self::Timeout { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================
