//! Per-engine call metrics
//!
//! Atomic counters only, so concurrent runs never contend on a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::types::EngineErrorKind;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    calls: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    candidates: AtomicU64,
    total_latency_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngineMetricsSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub candidates: u64,
    pub avg_latency_ms: f64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, latency: Duration, candidates: usize) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.candidates
            .fetch_add(candidates as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: EngineErrorKind, latency: Duration) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match kind {
            EngineErrorKind::Timeout => self.timeouts.fetch_add(1, Ordering::Relaxed),
            _ => self.failures.fetch_add(1, Ordering::Relaxed),
        };
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        let calls = self.calls.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        EngineMetricsSnapshot {
            calls,
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            avg_latency_ms: if calls > 0 {
                total_latency as f64 / calls as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = EngineMetrics::new();
        metrics.record_success(Duration::from_millis(10), 4);
        metrics.record_success(Duration::from_millis(30), 2);
        metrics.record_failure(EngineErrorKind::Timeout, Duration::from_millis(50));
        metrics.record_failure(EngineErrorKind::Failed, Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls, 4);
        assert_eq!(snapshot.candidates, 6);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.avg_latency_ms, 25.0);
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(EngineMetrics::new().snapshot(), EngineMetricsSnapshot::default());
    }
}
