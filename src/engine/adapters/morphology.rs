//! Morphology specialist
//!
//! Relies on English derivational morphology: adjective and adverb suffixes
//! mark modifying words, nominal suffixes mark abstract nouns. Openings need
//! at least two modifiers, which makes this engine stricter than the lexicon.

use super::{propose, saturate};
use crate::config::BoundaryConfig;
use crate::engine::EngineAdapter;
use crate::text::{BoundaryDetector, Sentence, TypeScores, vocabulary};
use crate::types::{CandidateSpan, DescriptionType, Result};

#[derive(Debug, Clone)]
pub struct MorphologyAdapter {
    id: String,
    detector: BoundaryDetector,
}

fn modifier_count(tokens: &[String]) -> usize {
    tokens
        .iter()
        .filter(|t| vocabulary::is_adjective_like(t) || vocabulary::is_adverb(t))
        .count()
}

impl MorphologyAdapter {
    pub fn new(id: impl Into<String>, boundary: BoundaryConfig) -> Self {
        Self {
            id: id.into(),
            detector: BoundaryDetector::new(boundary),
        }
    }

    fn is_opening(&self, sentence: &Sentence<'_>) -> bool {
        if self.detector.is_filtered(sentence) || self.detector.is_narrative_shift(sentence) {
            return false;
        }
        modifier_count(&vocabulary::tokenize(sentence.text)) >= 2
    }

    fn assess(text: &str) -> Option<(DescriptionType, f64)> {
        let tokens = vocabulary::tokenize(text);
        if tokens.is_empty() {
            return None;
        }
        let words = tokens.len() as f64;
        let modifiers = modifier_count(&tokens) as f64;
        let nouns = tokens.iter().filter(|t| vocabulary::is_noun_like(t)).count() as f64;

        let description_type = TypeScores::from_tokens(&tokens).classify();
        let confidence =
            0.35 + 0.45 * saturate(modifiers / words, 0.25) + 0.2 * saturate(nouns / words, 0.2);

        Some((description_type, confidence))
    }
}

impl EngineAdapter for MorphologyAdapter {
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
