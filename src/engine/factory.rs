//! Adapter constructors keyed by engine kind
//!
//! New backends are added by registering a constructor for a new `kind`;
//! nothing else branches on engine identity.

use std::collections::HashMap;
use std::sync::Arc;

use super::SharedAdapter;
use super::adapters::{EntityAdapter, LexiconAdapter, MorphologyAdapter, SyntaxAdapter};
use crate::config::{BoundaryConfig, EngineConfig};
use crate::types::{DescryError, Result};

pub type AdapterConstructor =
    Arc<dyn Fn(&EngineConfig, &BoundaryConfig) -> Result<SharedAdapter> + Send + Sync>;

#[derive(Clone, Default)]
pub struct AdapterFactory {
    constructors: HashMap<String, AdapterConstructor>,
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl AdapterFactory {
    /// Factory without any constructors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Factory with the four built-in rule-based engines
    pub fn with_builtins() -> Self {
        let mut factory = Self::empty();
        factory.register("lexicon", |engine, boundary| {
            Ok(Arc::new(LexiconAdapter::new(&engine.id, boundary.clone())) as SharedAdapter)
        });
        factory.register("morphology", |engine, boundary| {
            Ok(Arc::new(MorphologyAdapter::new(&engine.id, boundary.clone())) as SharedAdapter)
        });
        factory.register("syntax", |engine, boundary| {
            Ok(Arc::new(SyntaxAdapter::new(&engine.id, boundary.clone())) as SharedAdapter)
        });
        factory.register("entity", |engine, boundary| {
            Ok(Arc::new(EntityAdapter::new(&engine.id, boundary.clone())) as SharedAdapter)
        });
        factory
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&EngineConfig, &BoundaryConfig) -> Result<SharedAdapter> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
        self
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the adapter for one engine
    ///
    /// An unknown kind is a configuration error.
    pub fn create(&self, engine: &EngineConfig, boundary: &BoundaryConfig) -> Result<SharedAdapter> {
        let constructor = self.constructors.get(&engine.kind).ok_or_else(|| {
            DescryError::Config(format!(
                "Unknown engine kind '{}' for engine '{}'. Supported: {}",
                engine.kind,
                engine.id,
                self.kinds().join(", ")
            ))
        })?;
        constructor(engine, boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineError;

    #[test]
    fn test_builtin_kinds() {
        let factory = AdapterFactory::with_builtins();
        assert_eq!(factory.kinds(), vec!["entity", "lexicon", "morphology", "syntax"]);

        let engine = EngineConfig::new("my-lexicon", "lexicon", 1.0);
        let adapter = factory.create(&engine, &BoundaryConfig::default()).unwrap();
        assert_eq!(adapter.id(), "my-lexicon");
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let factory = AdapterFactory::with_builtins();
        let engine = EngineConfig::new("x", "neural", 1.0);
        let err = factory.create(&engine, &BoundaryConfig::default()).err().unwrap();
        assert!(matches!(err, DescryError::Config(_)));
        assert!(err.to_string().contains("neural"));
    }

    #[test]
    fn test_constructor_failure_propagates() {
        let mut factory = AdapterFactory::empty();
        factory.register("broken", |engine, _| {
            Err(EngineError::unavailable(&engine.id, "model file missing").into())
        });
        let engine = EngineConfig::new("b", "broken", 1.0);
        let err = factory.create(&engine, &BoundaryConfig::default()).err().unwrap();
        assert!(matches!(err, DescryError::Engine(_)));
    }
}
