use std::time::Duration;

use serde::Serialize;

use crate::config::{Config, EngineConfig};

/// Immutable record of one configured engine
///
/// Built when the registry loads; replaced only by a reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineDescriptor {
    pub id: String,
    pub kind: String,
    pub weight: f64,
    pub enabled: bool,
    pub capabilities: Vec<String>,
    /// Configured prior for the rolling quality average
    pub quality_score: f64,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl EngineDescriptor {
    pub fn from_config(engine: &EngineConfig, config: &Config) -> Self {
        Self {
            id: engine.id.clone(),
            kind: engine.kind.clone(),
            weight: engine.weight,
            enabled: engine.enabled,
            capabilities: engine.capabilities.clone(),
            quality_score: engine.quality_score,
            timeout: config.engine_timeout(engine),
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
