//! High-precision entity-focused recognizer
//!
//! Only proposes spans that open on a sentence naming someone or somewhere,
//! so it says little but is usually right.

use super::{propose, saturate};
use crate::config::BoundaryConfig;
use crate::engine::EngineAdapter;
use crate::text::{BoundaryDetector, Sentence, TypeScores, entity_mentions, vocabulary};
use crate::types::{CandidateSpan, DescriptionType, Result};

#[derive(Debug, Clone)]
pub struct EntityAdapter {
    id: String,
    detector: BoundaryDetector,
}

impl EntityAdapter {
    pub fn new(id: impl Into<String>, boundary: BoundaryConfig) -> Self {
        Self {
            id: id.into(),
            detector: BoundaryDetector::new(boundary),
        }
    }

    fn is_opening(&self, sentence: &Sentence<'_>) -> bool {
        !self.detector.is_filtered(sentence)
            && !self.detector.is_narrative_shift(sentence)
            && !entity_mentions(sentence.text).is_empty()
            && self.detector.has_continuation_signal(sentence)
    }

    fn assess(text: &str) -> Option<(DescriptionType, f64)> {
        let entities = entity_mentions(text);
        if entities.is_empty() {
            return None;
        }
        let scores = TypeScores::from_tokens(&vocabulary::tokenize(text));

        let character = scores.get(DescriptionType::Character);
        let description_type = if character > 0 && character >= scores.get(DescriptionType::Location)
        {
            DescriptionType::Character
        } else {
            scores.classify()
        };

        let confidence = 0.6
            + 0.3 * saturate(entities.len() as f64, 2.0)
            + 0.1 * scores.share(description_type);

        Some((description_type, confidence))
    }
}

impl EngineAdapter for EntityAdapter {
    fn extract(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        Ok(propose(
            &self.id,
            text,
            &self.detector,
            |s| self.is_opening(s),
            Self::assess,
        ))
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{CASTLE_PASSAGE, TWO_PARAGRAPHS};

    #[test]
    fn test_skips_passages_without_names() {
        let adapter = EntityAdapter::new("entity", BoundaryConfig::default());
        assert!(adapter.extract(CASTLE_PASSAGE).unwrap().is_empty());
    }

    #[test]
    fn test_named_character() {
        let adapter = EntityAdapter::new("entity", BoundaryConfig::default());
        let candidates = adapter.extract(TWO_PARAGRAPHS).unwrap();
        assert_eq!(candidates.len(), 1);

        let c = &candidates[0];
        assert_eq!(c.description_type, DescriptionType::Character);
        assert!(c.text.starts_with("Captain Elias Marrow"));
        assert!(c.entities.contains("Elias Marrow"));
        assert!(c.confidence >= 0.75);
    }
}
