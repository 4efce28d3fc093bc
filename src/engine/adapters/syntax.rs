//! Syntax-robust clause-pattern parser
//!
//! Looks for the clause shapes descriptions are built from: prepositional
//! phrases (`beneath the ...`), existential clauses (`there stood ...`) and
//! stative predicates (`the hall lay ...`). Tolerant of fragments and odd
//! punctuation, at the cost of weaker typing.

use std::sync::LazyLock;

use regex::Regex;

use super::{propose, saturate};
use crate::config::BoundaryConfig;
use crate::engine::EngineAdapter;
use crate::text::{BoundaryDetector, Sentence, TypeScores, split_sentences, vocabulary};
use crate::types::{CandidateSpan, DescriptionType, Result};

static PREPOSITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(above|below|beneath|beyond|behind|across|along|around|between|over|under|inside|within|against|among|through|upon|beside|amid|atop|toward|towards)\s+(the|a|an|his|her|its|their|this|that|those|these)\b",
    )
    .expect("valid prepositional regex")
});

static EXISTENTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bthere\s+(was|were|stood|lay|rose|hung|stretched)\b")
        .expect("valid existential regex")
});

static STATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(stood|lay|rose|hung|stretched|loomed|spread|sprawled|towered|nestled|rested|seemed|appeared)\b",
    )
    .expect("valid stative regex")
});

fn clause_patterns(text: &str) -> usize {
    PREPOSITIONAL.find_iter(text).count()
        + EXISTENTIAL.find_iter(text).count()
        + STATIVE.find_iter(text).count()
}

#[derive(Debug, Clone)]
pub struct SyntaxAdapter {
    id: String,
    detector: BoundaryDetector,
}

impl SyntaxAdapter {
    pub fn new(id: impl Into<String>, boundary: BoundaryConfig) -> Self {
        Self {
            id: id.into(),
            detector: BoundaryDetector::new(boundary),
        }
    }

    fn is_opening(&self, sentence: &Sentence<'_>) -> bool {
        !self.detector.is_filtered(sentence)
            && !self.detector.is_narrative_shift(sentence)
            && (PREPOSITIONAL.is_match(sentence.text) || EXISTENTIAL.is_match(sentence.text))
    }

    fn assess(text: &str) -> Option<(DescriptionType, f64)> {
        let tokens = vocabulary::tokenize(text);
        if tokens.is_empty() {
            return None;
        }
        let scores = TypeScores::from_tokens(&tokens);
        let spatial = PREPOSITIONAL.find_iter(text).count();

        // Dense spatial phrasing reads as setting unless another type clearly wins
        let description_type = match scores.best() {
            Some(best)
                if spatial >= 2
                    && scores.get(DescriptionType::Location) > 0
                    && scores.get(best) <= scores.get(DescriptionType::Location) + 1 =>
            {
                DescriptionType::Location
            }
            Some(best) => best,
            None => DescriptionType::Location,
        };

        let sentences = split_sentences(text).len().max(1) as f64;
        let confidence = 0.4 + 0.5 * saturate(clause_patterns(text) as f64 / sentences, 2.0)
            + 0.1 * scores.share(description_type);

        Some((description_type, confidence))
    }
}

impl EngineAdapter for SyntaxAdapter {
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
