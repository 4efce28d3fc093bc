//! Description type classification and entity mentions

use std::collections::BTreeSet;

use super::vocabulary::{self, ENTITY_STOPWORDS};
use crate::types::DescriptionType;

/// Indicator hits per description type, indexed in [`DescriptionType::ALL`] order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeScores {
    pub hits: [usize; 5],
}

impl TypeScores {
    pub fn from_tokens(tokens: &[String]) -> Self {
        let mut hits = [0; 5];
        for (slot, description_type) in hits.iter_mut().zip(DescriptionType::ALL) {
            *slot = vocabulary::count_hits(tokens, vocabulary::indicators(description_type));
        }
        Self { hits }
    }

    pub fn get(&self, description_type: DescriptionType) -> usize {
        DescriptionType::ALL
            .iter()
            .position(|t| *t == description_type)
            .map(|i| self.hits[i])
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.hits.iter().sum()
    }

    /// Type with most hits; ties resolve to the higher domain priority
    ///
    /// `None` when no indicator matched.
    pub fn best(&self) -> Option<DescriptionType> {
        DescriptionType::ALL
            .iter()
            .zip(self.hits)
            .filter(|(_, h)| *h > 0)
            .max_by(|(a, ha), (b, hb)| {
                ha.cmp(hb)
                    .then(a.domain_priority().cmp(&b.domain_priority()))
            })
            .map(|(t, _)| *t)
    }

    /// [`best`](Self::best), defaulting to LOCATION when nothing matched
    pub fn classify(&self) -> DescriptionType {
        self.best().unwrap_or(DescriptionType::Location)
    }

    /// Share of all indicator hits that belong to `description_type`
    pub fn share(&self, description_type: DescriptionType) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.get(description_type) as f64 / total as f64
        }
    }
}

/// Capitalized tokens that do not open a sentence, joined into multiword names
pub fn entity_mentions(text: &str) -> BTreeSet<String> {
    let mut mentions = BTreeSet::new();
    let mut current: Vec<&str> = Vec::new();
    let mut sentence_initial = true;

    let flush = |current: &mut Vec<&str>, mentions: &mut BTreeSet<String>| {
        if !current.is_empty() {
            mentions.insert(current.join(" "));
            current.clear();
        }
    };

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
        let word = word.strip_suffix("'s").unwrap_or(word);
        let ends_sentence = raw
            .trim_end_matches(['"', '\'', '”', '’', ')'])
            .ends_with(['.', '!', '?', '…']);
        let breaks_name = ends_sentence || raw.ends_with([',', ';', ':']);

        let capitalized = word.chars().next().is_some_and(char::is_uppercase)
            && word.chars().count() > 1
            && !vocabulary::contains(ENTITY_STOPWORDS, &word.to_lowercase());

        if capitalized && !sentence_initial {
            current.push(word);
        } else {
            flush(&mut current, &mut mentions);
        }
        if breaks_name {
            flush(&mut current, &mut mentions);
        }
        sentence_initial = ends_sentence;
    }
    flush(&mut current, &mut mentions);

    mentions
}
