//! Built-in rule-based engines
//!
//! Each engine picks descriptive openings its own way, grows them with the
//! shared boundary detector, then assigns a type and a local confidence.
//! They disagree on purpose; the voter reconciles them.

mod entity;
mod lexicon;
mod morphology;
mod syntax;

pub use entity::EntityAdapter;
pub use lexicon::LexiconAdapter;
pub use morphology::MorphologyAdapter;
pub use syntax::SyntaxAdapter;

use crate::text::{BoundaryDetector, Sentence, entity_mentions, split_sentences};
use crate::types::{CandidateSpan, DescriptionType};

/// Shared proposal pipeline: segment, detect spans, assess each one
///
/// `assess` returns `None` to drop a span.
pub(crate) fn propose<O, A>(
    engine_id: &str,
    text: &str,
    detector: &BoundaryDetector,
    is_opening: O,
    assess: A,
) -> Vec<CandidateSpan>
where
    O: Fn(&Sentence<'_>) -> bool,
    A: Fn(&str) -> Option<(DescriptionType, f64)>,
{
    let sentences = split_sentences(text);
    detector
        .detect(&sentences, is_opening)
        .into_iter()
        .filter_map(|span| {
            let (slice, start, end) = span.slice(text, &sentences);
            let (description_type, confidence) = assess(slice)?;
            Some(
                CandidateSpan::new(engine_id, slice, start, end, description_type, confidence)
                    .with_entities(entity_mentions(slice)),
            )
        })
        .collect()
}

/// `value / scale`, saturating at 1.0
pub(crate) fn saturate(value: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        0.0
    } else {
        (value / scale).min(1.0)
    }
}
