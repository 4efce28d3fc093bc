//! Description Quality Scoring
//!
//! Five factor scores in [0, 1], combined with the configured weights:
//! - Linguistic quality (adjective/noun balance, clause depth)
//! - Visual richness (color, lighting, texture and scale vocabulary)
//! - Structural completeness (capitalized start, terminal punctuation, sentences)
//! - Type specificity (indicator share of the resolved type)
//! - Length fitness (distance from the target length window)
//!
//! The priority score blends overall quality with voted confidence on a 0-100 scale.

use super::classifier::TypeScores;
use super::sentences::split_sentences;
use super::vocabulary::{self, COLOR, LIGHTING, SCALE, SUBORDINATORS, TEXTURE};
use crate::config::QualityConfig;
use crate::types::{DescriptionType, QualityBreakdown};

/// Adjective share of adjective+noun tokens that scores highest
const IDEAL_ADJECTIVE_RATIO: f64 = 0.4;
/// Clause markers per sentence that saturate the depth score
const CLAUSE_MARKERS_SATURATION: f64 = 3.0;
/// Visual token density that saturates the density score
const VISUAL_DENSITY_SCALE: f64 = 8.0;
/// Indicator hits that saturate the absolute specificity score
const TYPE_HITS_SATURATION: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct QualityScorer {
    config: QualityConfig,
    min_length: usize,
}

impl QualityScorer {
    pub fn new(config: QualityConfig, min_length: usize) -> Self {
        Self { config, min_length }
    }

    pub fn score(&self, text: &str, description_type: DescriptionType) -> QualityBreakdown {
        let tokens = vocabulary::tokenize(text);
        let sentence_count = split_sentences(text).len();

        let linguistic = linguistic_quality(text, &tokens, sentence_count);
        let visual_richness = visual_richness(&tokens);
        let structural = structural_completeness(text, sentence_count);
        let type_specificity = type_specificity(&tokens, description_type);
        let length_fitness = self.length_fitness(text.chars().count());

        let w = &self.config.weights;
        let total = w.total();
        let overall = if total > 0.0 {
            (w.linguistic * linguistic
                + w.visual_richness * visual_richness
                + w.structural * structural
                + w.type_specificity * type_specificity
                + w.length_fitness * length_fitness)
                / total
        } else {
            0.0
        };

        QualityBreakdown {
            linguistic,
            visual_richness,
            structural,
            type_specificity,
            length_fitness,
            overall: overall.clamp(0.0, 1.0),
        }
    }

    /// Priority on a 0-100 scale
    pub fn priority(&self, quality: &QualityBreakdown, confidence: f64) -> f64 {
        let c = self.config.confidence_weight;
        (100.0 * ((1.0 - c) * quality.overall + c * confidence)).clamp(0.0, 100.0)
    }

    /// Zero below the minimum length, ramps from 0.5 up to the window, flat
    /// inside it, then decays linearly to zero at twice the window maximum
    pub fn length_fitness(&self, chars: usize) -> f64 {
        let window = &self.config.target_length_window;
        if chars < self.min_length {
            return 0.0;
        }
        if chars < window.min {
            let span = (window.min - self.min_length) as f64;
            return 0.5 + 0.5 * (chars - self.min_length) as f64 / span;
        }
        if chars <= window.max {
            return 1.0;
        }
        let excess = (chars - window.max) as f64;
        (1.0 - excess / window.max.max(1) as f64).max(0.0)
    }
}

fn linguistic_quality(text: &str, tokens: &[String], sentence_count: usize) -> f64 {
    let adjectives = tokens
        .iter()
        .filter(|t| vocabulary::is_adjective_like(t))
        .count();
    let nouns = tokens.iter().filter(|t| vocabulary::is_noun_like(t)).count();

    let balance = if adjectives + nouns == 0 {
        0.0
    } else {
        let ratio = adjectives as f64 / (adjectives + nouns) as f64;
        (1.0 - (ratio - IDEAL_ADJECTIVE_RATIO).abs() / (1.0 - IDEAL_ADJECTIVE_RATIO)).max(0.0)
    };

    let markers = vocabulary::count_hits(tokens, SUBORDINATORS) + text.matches(',').count();
    let per_sentence = markers as f64 / sentence_count.max(1) as f64;
    let depth = (per_sentence / CLAUSE_MARKERS_SATURATION).min(1.0);

    0.6 * balance + 0.4 * depth
}

fn visual_richness(tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let categories = [COLOR, LIGHTING, TEXTURE, SCALE];
    let covered = categories
        .iter()
        .filter(|list| vocabulary::any_hit(tokens, list))
        .count();
    let hits = tokens.iter().filter(|t| vocabulary::is_visual(t)).count();
    let density = (hits as f64 / tokens.len() as f64 * VISUAL_DENSITY_SCALE).min(1.0);

    0.6 * covered as f64 / categories.len() as f64 + 0.4 * density
}

fn structural_completeness(text: &str, sentence_count: usize) -> f64 {
    let trimmed = text.trim();
    let mut score = 0.0;

    if trimmed
        .chars()
        .find(|c| c.is_alphanumeric())
        .is_some_and(char::is_uppercase)
    {
        score += 0.3;
    }
    if trimmed
        .trim_end_matches(['"', '\'', '”', '’', ')'])
        .ends_with(['.', '!', '?', '…'])
    {
        score += 0.3;
    }
    score += match sentence_count {
        0 => 0.0,
        1 => 0.15,
        _ => 0.4,
    };

    score
}

fn type_specificity(tokens: &[String], description_type: DescriptionType) -> f64 {
    let scores = TypeScores::from_tokens(tokens);
    let absolute = (scores.get(description_type) as f64 / TYPE_HITS_SATURATION).min(1.0);
    0.6 * scores.share(description_type) + 0.4 * absolute
}
