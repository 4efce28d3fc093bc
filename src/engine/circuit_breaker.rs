//! Circuit Breaker for Engine Health
//!
//! Tracks engine health across runs. An engine whose circuit is open is left
//! out of newly started runs until the recovery timeout elapses.
//!
//! ```text
//! Closed --[failure_threshold reached]--> Open
//! Open --[recovery timeout elapsed]--> HalfOpen
//! HalfOpen --[success]--> Closed
//! HalfOpen --[failure]--> Open
//! ```

use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::CircuitBreakerSettings;
use crate::constants::circuit_breaker as cb_constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Consecutive half-open successes needed to close it again
    pub success_threshold: u32,
    pub recovery_timeout: Duration,
    /// Runs admitted while half-open
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: cb_constants::FAILURE_THRESHOLD,
            success_threshold: cb_constants::SUCCESS_THRESHOLD,
            recovery_timeout: Duration::from_secs(cb_constants::RECOVERY_TIMEOUT_SECS),
            half_open_max_requests: cb_constants::HALF_OPEN_MAX_REQUESTS,
        }
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold,
            recovery_timeout: Duration::from_secs(settings.recovery_timeout_secs),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct CircuitBreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_requests: u32,
    opened_at: Option<Instant>,
    blocked_count: u64,
}

impl CircuitBreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            half_open_requests: 0,
            opened_at: None,
            blocked_count: 0,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_requests = 0;
    }
}

/// Thread-safe per-engine circuit breaker; all state sits behind one lock
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    engine_id: String,
    inner: RwLock<CircuitBreakerInner>,
}

impl CircuitBreaker {
    pub fn new(engine_id: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            engine_id: engine_id.into(),
            inner: RwLock::new(CircuitBreakerInner::new()),
        }
    }

    pub fn with_defaults(engine_id: impl Into<String>) -> Self {
        Self::new(engine_id, CircuitBreakerConfig::default())
    }

    pub fn state(&self) -> CircuitState {
        self.check_state_transition();

        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .state
    }

    /// Whether the engine may join a newly started run
    pub fn allow_request(&self) -> bool {
        self.check_state_transition();

        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                inner.blocked_count += 1;
                tracing::debug!(engine = %self.engine_id, "Engine skipped (circuit OPEN)");
                false
            }
            CircuitState::HalfOpen => {
                if inner.half_open_requests < self.config.half_open_max_requests {
                    inner.half_open_requests += 1;
                    tracing::debug!(
                        engine = %self.engine_id,
                        "Admitting probe run ({}/{})",
                        inner.half_open_requests,
                        self.config.half_open_max_requests
                    );
                    true
                } else {
                    inner.blocked_count += 1;
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        inner.failure_count = 0;

        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.success_count = 0;
                inner.half_open_requests = 0;
                inner.opened_at = None;
                tracing::info!(engine = %self.engine_id, "Circuit closed (engine recovered)");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        inner.success_count = 0;

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.open();
                    tracing::warn!(
                        engine = %self.engine_id,
                        failures = self.config.failure_threshold,
                        "Circuit opened (recovery in {:?})",
                        self.config.recovery_timeout
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.open();
                inner.failure_count = 0;
                tracing::warn!(engine = %self.engine_id, "Circuit re-opened after failed probe");
            }
            CircuitState::Open => {}
        }
    }

    /// Give back an unused half-open slot (engine admitted but never called)
    pub fn release_probe(&self) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.state == CircuitState::HalfOpen {
            inner.half_open_requests = inner.half_open_requests.saturating_sub(1);
        }
    }

    /// Whether a newly started run would be admitted, without taking a slot
    pub fn admits_runs(&self) -> bool {
        self.check_state_transition();

        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => inner.half_open_requests < self.config.half_open_max_requests,
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        CircuitBreakerStats {
            engine_id: self.engine_id.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            blocked_count: inner.blocked_count,
            time_in_state: inner.opened_at.map(|t| t.elapsed()),
        }
    }

    fn check_state_transition(&self) {
        let should_transition = {
            let inner = self
                .inner
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            inner.state == CircuitState::Open
                && inner
                    .opened_at
                    .is_some_and(|t| t.elapsed() >= self.config.recovery_timeout)
        };

        if should_transition {
            let mut inner = self
                .inner
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            // State may have changed between read and write
            if inner.state == CircuitState::Open {
                inner.state = CircuitState::HalfOpen;
                inner.half_open_requests = 0;
                inner.success_count = 0;
                tracing::info!(engine = %self.engine_id, "Circuit HALF_OPEN (probing recovery)");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub engine_id: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub blocked_count: u64,
    pub time_in_state: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(failure_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            success_threshold: 1,
            recovery_timeout: Duration::from_millis(1),
            half_open_max_requests: 1,
        }
    }

    #[test]
    fn test_initial_state_is_closed() {
        let cb = CircuitBreaker::with_defaults("lexicon");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(
            "lexicon",
            CircuitBreakerConfig {
                failure_threshold: 3,
                ..Default::default()
            },
        );

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
        assert_eq!(cb.stats().blocked_count, 1);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = CircuitBreaker::new(
            "lexicon",
            CircuitBreakerConfig {
                failure_threshold: 3,
                ..Default::default()
            },
        );

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_probe_cycle() {
        let cb = CircuitBreaker::new("syntax", fast_config(1));

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert!(cb.allow_request());
        assert!(!cb.allow_request());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_released_probe_frees_slot() {
        let cb = CircuitBreaker::new("entity", fast_config(1));

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        assert!(cb.admits_runs());
        assert!(cb.allow_request());
        assert!(!cb.admits_runs());

        cb.release_probe();
        assert!(cb.admits_runs());
        assert!(cb.allow_request());
    }

    #[test]
    fn test_failed_probe_reopens() {
        let cb = CircuitBreaker::new("syntax", fast_config(1));

        cb.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        assert!(cb.allow_request());

        cb.record_failure();
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Open);
    }

    #[test]
    fn test_settings_conversion() {
        let settings = CircuitBreakerSettings {
            failure_threshold: 7,
            recovery_timeout_secs: 5,
        };
        let config = CircuitBreakerConfig::from(&settings);
        assert_eq!(config.failure_threshold, 7);
        assert_eq!(config.recovery_timeout, Duration::from_secs(5));
    }
}
