//! Input text features used for adaptive routing

use std::collections::HashSet;

use serde::Serialize;

use super::sentences::{paragraph_count, split_sentences};
use super::vocabulary::{self, SUBORDINATORS};

/// Average sentence length (words) that saturates the complexity score
const LONG_SENTENCE_WORDS: f64 = 25.0;
/// Clause markers per sentence that saturate the complexity score
const CLAUSE_DENSITY_SATURATION: f64 = 1.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextFeatures {
    pub chars: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    /// Type/token ratio
    pub lexical_variety: f64,
    pub avg_sentence_words: f64,
    /// Subordinators and semicolons per sentence
    pub clause_density: f64,
    /// Syntactic/lexical complexity estimate in [0, 1]
    pub complexity: f64,
}

impl TextFeatures {
    pub fn analyze(text: &str) -> Self {
        let sentences = split_sentences(text);
        let tokens = vocabulary::tokenize(text);

        let chars = text.chars().count();
        let words = tokens.len();
        let sentence_count = sentences.len();

        if words == 0 {
            return Self {
                chars,
                sentences: sentence_count,
                paragraphs: paragraph_count(&sentences),
                ..Self::default()
            };
        }

        let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let lexical_variety = distinct.len() as f64 / words as f64;

        let per_sentence = sentence_count.max(1) as f64;
        let avg_sentence_words = words as f64 / per_sentence;
        let markers = vocabulary::count_hits(&tokens, SUBORDINATORS) + text.matches(';').count();
        let clause_density = markers as f64 / per_sentence;

        let complexity = 0.4 * (avg_sentence_words / LONG_SENTENCE_WORDS).min(1.0)
            + 0.3 * (clause_density / CLAUSE_DENSITY_SATURATION).min(1.0)
            + 0.3 * lexical_variety;

        Self {
            chars,
            words,
            sentences: sentence_count,
            paragraphs: paragraph_count(&sentences),
            lexical_variety,
            avg_sentence_words,
            clause_density,
            complexity: complexity.clamp(0.0, 1.0),
        }
    }
}
