//! Global Constants
//!
//! Centralized defaults for configuration and tuning.
//! Everything here is a default only; the live values come from [`crate::config::Config`].

/// Ensemble voting constants
pub mod voting {
    /// Minimum consensus ratio for a candidate group to be accepted
    pub const CONSENSUS_THRESHOLD: f64 = 0.6;

    /// Character overlap at which a candidate joins an existing group
    pub const CLUSTER_OVERLAP: f64 = 0.5;

    /// Character overlap above which two accepted descriptions are duplicates
    pub const DEDUP_OVERLAP: f64 = 0.8;

    /// Share of the consensus ratio in the final confidence blend
    pub const CONFIDENCE_BLEND: f64 = 0.6;

    /// Tolerance used when comparing weighted sums for ties
    pub const TIE_EPSILON: f64 = 1e-9;
}

/// Boundary detection constants
pub mod boundary {
    /// Minimum description length in characters (candidates below are discarded)
    pub const MIN_LENGTH: usize = 100;

    /// Hard cap on sentences per description
    pub const MAX_SENTENCES: usize = 5;

    /// Minimum sentences for a candidate to survive boundary extension
    pub const MIN_SENTENCES: usize = 2;
}

/// Quality scoring constants
pub mod quality {
    /// Lower bound of the target length window (characters)
    pub const TARGET_MIN_LENGTH: usize = 150;

    /// Upper bound of the target length window (characters)
    pub const TARGET_MAX_LENGTH: usize = 500;

    /// Share of confidence in the priority score
    pub const CONFIDENCE_WEIGHT: f64 = 0.2;

    /// Default factor weights
    pub mod weights {
        pub const LINGUISTIC: f64 = 0.20;
        pub const VISUAL: f64 = 0.25;
        pub const STRUCTURAL: f64 = 0.15;
        pub const TYPE_SPECIFICITY: f64 = 0.20;
        pub const LENGTH: f64 = 0.20;
    }
}

/// Adaptive routing constants
pub mod adaptive {
    /// Inputs shorter than this run on a single engine
    pub const SINGLE_MAX_CHARS: usize = 400;

    /// Inputs at least this long always run the full ensemble
    pub const ENSEMBLE_MIN_CHARS: usize = 1500;

    /// Complexity estimate above which the ensemble is used
    pub const COMPLEXITY_THRESHOLD: f64 = 0.65;
}

/// Engine runtime constants
pub mod engine {
    /// Default per-engine timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Smoothing factor for the rolling quality average
    pub const QUALITY_EMA_ALPHA: f64 = 0.2;

    /// Rolling quality assumed before any run has been observed
    pub const INITIAL_QUALITY: f64 = 0.5;
}

/// Circuit breaker constants
pub mod circuit_breaker {
    /// Number of failures before opening circuit
    pub const FAILURE_THRESHOLD: u32 = 3;

    /// Duration to wait before attempting recovery (seconds)
    pub const RECOVERY_TIMEOUT_SECS: u64 = 60;

    /// Maximum requests allowed in half-open state
    pub const HALF_OPEN_MAX_REQUESTS: u32 = 1;

    /// Success threshold to close circuit from half-open
    pub const SUCCESS_THRESHOLD: u32 = 1;
}
