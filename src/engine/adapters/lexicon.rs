//! General-purpose vocabulary tagger

use super::{propose, saturate};
use crate::config::BoundaryConfig;
use crate::engine::EngineAdapter;
use crate::text::{BoundaryDetector, TypeScores, vocabulary};
use crate::types::{CandidateSpan, DescriptionType, Result};

#[derive(Debug, Clone)]
pub struct LexiconAdapter {
    id: String,
    detector: BoundaryDetector,
}

impl LexiconAdapter {
    pub fn new(id: impl Into<String>, boundary: BoundaryConfig) -> Self {
        Self {
            id: id.into(),
            detector: BoundaryDetector::new(boundary),
        }
    }

    fn assess(text: &str) -> Option<(DescriptionType, f64)> {
        let tokens = vocabulary::tokenize(text);
        if tokens.is_empty() {
            return None;
        }
        let scores = TypeScores::from_tokens(&tokens);
        let description_type = scores.classify();

        let visual = tokens.iter().filter(|t| vocabulary::is_visual(t)).count();
        let density = visual as f64 / tokens.len() as f64;
        let confidence =
            0.4 + 0.3 * saturate(density, 0.15) + 0.3 * scores.share(description_type);

        Some((description_type, confidence))
    }
}

impl EngineAdapter for LexiconAdapter {
    fn extract(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        Ok(propose(
            &self.id,
            text,
            &self.detector,
            |s| self.detector.is_descriptive_opening(s),
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
    fn test_finds_location_passage() {
        let adapter = LexiconAdapter::new("lexicon", BoundaryConfig::default());
        let candidates = adapter.extract(CASTLE_PASSAGE).unwrap();

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.engine_id, "lexicon");
        assert_eq!(c.description_type, DescriptionType::Location);
        assert_eq!(c.start, 0);
        assert_eq!(c.end, CASTLE_PASSAGE.chars().count());
        assert!(c.confidence > 0.5 && c.confidence <= 1.0);
    }

    #[test]
    fn test_offsets_are_character_offsets() {
        let adapter = LexiconAdapter::new("lexicon", BoundaryConfig::default());
        let candidates = adapter.extract(TWO_PARAGRAPHS).unwrap();
        assert_eq!(candidates.len(), 2);

        for c in &candidates {
            let slice: String = TWO_PARAGRAPHS
                .chars()
                .skip(c.start)
                .take(c.end - c.start)
                .collect();
            assert_eq!(slice, c.text);
        }
        assert_eq!(candidates[1].description_type, DescriptionType::Character);
    }
}
