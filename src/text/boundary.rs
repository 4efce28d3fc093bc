//! Description Boundary Detection
//!
//! Grows a description from a descriptive opening sentence by appending the
//! following sentences while they keep describing. Extension never crosses a
//! paragraph break.

use super::filters::AntiPatternFilter;
use super::sentences::Sentence;
use super::vocabulary::{self, COLOR, DESCRIPTIVE_VERBS, LIGHTING, SPATIAL_PREPOSITIONS};
use crate::config::BoundaryConfig;

/// Inclusive range of sentence indices forming one description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub first: usize,
    pub last: usize,
}

impl SentenceSpan {
    pub fn sentence_count(&self) -> usize {
        self.last - self.first + 1
    }

    /// Source slice with its character offsets
    pub fn slice<'a>(&self, text: &'a str, sentences: &[Sentence<'_>]) -> (&'a str, usize, usize) {
        let first = &sentences[self.first];
        let last = &sentences[self.last];
        (
            &text[first.byte_start..last.byte_end],
            first.char_start,
            last.char_end,
        )
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    config: BoundaryConfig,
    filter: AntiPatternFilter,
}

impl BoundaryDetector {
    pub fn new(config: BoundaryConfig) -> Self {
        Self {
            config,
            filter: AntiPatternFilter,
        }
    }

    /// Sentence carries descriptive verbs, spatial relations or color/light words
    pub fn has_continuation_signal(&self, sentence: &Sentence<'_>) -> bool {
        let tokens = vocabulary::tokenize(sentence.text);
        vocabulary::any_hit(&tokens, DESCRIPTIVE_VERBS)
            || vocabulary::any_hit(&tokens, SPATIAL_PREPOSITIONS)
            || vocabulary::any_hit(&tokens, COLOR)
            || vocabulary::any_hit(&tokens, LIGHTING)
    }

    pub fn is_narrative_shift(&self, sentence: &Sentence<'_>) -> bool {
        vocabulary::starts_with_shift(&sentence.text.to_lowercase())
    }

    pub fn is_filtered(&self, sentence: &Sentence<'_>) -> bool {
        self.filter.check(sentence.text).is_some()
    }

    /// Generic opening: at least two descriptive signals and no filter match
    pub fn is_descriptive_opening(&self, sentence: &Sentence<'_>) -> bool {
        if self.is_filtered(sentence) || self.is_narrative_shift(sentence) {
            return false;
        }
        let tokens = vocabulary::tokenize(sentence.text);
        let visual = tokens.iter().filter(|t| vocabulary::is_visual(t)).count();
        let spatial = vocabulary::count_hits(&tokens, SPATIAL_PREPOSITIONS);
        let verbs = vocabulary::count_hits(&tokens, DESCRIPTIVE_VERBS);
        visual + spatial + verbs >= 2
    }

    /// Extend greedily from the opening sentence at `start`
    ///
    /// Returns `None` when fewer than `min_sentences` sentences qualify.
    pub fn extend(&self, sentences: &[Sentence<'_>], start: usize) -> Option<SentenceSpan> {
        let opening = sentences.get(start)?;
        if self.is_filtered(opening) {
            return None;
        }

        let cap = self.config.max_sentences_per_description.max(1);
        let mut last = start;
        while last + 1 < sentences.len() && last + 1 - start < cap {
            let next = &sentences[last + 1];
            if next.paragraph != opening.paragraph
                || self.is_narrative_shift(next)
                || self.is_filtered(next)
                || !self.has_continuation_signal(next)
            {
                break;
            }
            last += 1;
        }

        let span = SentenceSpan { first: start, last };
        (span.sentence_count() >= self.config.min_sentences).then_some(span)
    }

    /// Non-overlapping spans, scanning left to right from each accepted opening
    pub fn detect<F>(&self, sentences: &[Sentence<'_>], is_opening: F) -> Vec<SentenceSpan>
    where
        F: Fn(&Sentence<'_>) -> bool,
    {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < sentences.len() {
            if is_opening(&sentences[i])
                && let Some(span) = self.extend(sentences, i)
            {
                spans.push(span);
                i = span.last + 1;
            } else {
                i += 1;
            }
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::sentences::split_sentences;

    fn detector() -> BoundaryDetector {
        BoundaryDetector::new(BoundaryConfig::default())
    }

    #[test]
    fn test_extends_through_descriptive_sentences() {
        let text = "The old hall stood silent beneath a vaulted ceiling. \
                    Pale light fell through the narrow windows. \
                    Dust hung in the golden air above the floor. \
                    He turned away.";
        let sentences = split_sentences(text);
        let span = detector().extend(&sentences, 0).unwrap();
        assert_eq!(span, SentenceSpan { first: 0, last: 2 });

        let (slice, start, end) = span.slice(text, &sentences);
        assert!(slice.starts_with("The old hall"));
        assert!(slice.ends_with("above the floor."));
        assert_eq!(start, 0);
        assert_eq!(end, slice.chars().count());
    }

    #[test]
    fn test_stops_at_narrative_shift() {
        let text = "The forest lay dark around the clearing. \
                    Suddenly the light stretched across the grass.";
        let sentences = split_sentences(text);
        assert!(detector().extend(&sentences, 0).is_none());
    }

    #[test]
    fn test_stops_at_dialogue_and_paragraph() {
        let text = "Grey towers rose above the town. Red roofs lay below the walls. \
                    \"Look at the light on the river,\" she said.\n\n\
                    Blue water stretched beyond the bridge.";
        let sentences = split_sentences(text);
        let span = detector().extend(&sentences, 0).unwrap();
        assert_eq!(span.last, 1);
    }

    #[test]
    fn test_respects_sentence_cap() {
        let config = BoundaryConfig {
            max_sentences_per_description: 3,
            ..BoundaryConfig::default()
        };
        let text = "Dark hills rose. Grey mist lay over them. Light fell on the stone. \
                    Shadows stretched along the road. Red leaves hung above.";
        let sentences = split_sentences(text);
        let span = BoundaryDetector::new(config).extend(&sentences, 0).unwrap();
        assert_eq!(span.sentence_count(), 3);
    }

    #[test]
    fn test_detect_emits_non_overlapping_spans() {
        let text = "Dark hills rose above the plain. Grey mist lay over them.\n\n\
                    The man left. It was late.\n\n\
                    Golden light filled the narrow street. Shadows stretched along the walls.";
        let sentences = split_sentences(text);
        let d = detector();
        let spans = d.detect(&sentences, |s| d.is_descriptive_opening(s));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], SentenceSpan { first: 0, last: 1 });
        assert_eq!(spans[1].first, 4);
        assert!(spans[0].last < spans[1].first);
    }
}
