//! Anti-pattern Filters
//!
//! Rejects text that should never become a description: structural headers,
//! direct dialogue and editorial or meta text. [`CandidateGate`] applies the
//! filters plus the minimum length to every engine candidate before voting.

use std::sync::LazyLock;

use regex::Regex;

use super::vocabulary::{self, SPEECH_VERBS};
use crate::config::BoundaryConfig;
use crate::types::CandidateSpan;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(chapter|part|book|volume|prologue|epilogue|section|act)\b")
        .expect("valid heading regex")
});

static NUMERAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([ivxlcdm]+|\d+)\s*[.):]?\s*$").expect("valid numeral regex")
});

static META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^\s*(note|notes|translator's note|editor's note|footnote)\s*[:.\d])|\b(copyright|all rights reserved|isbn|table of contents|published by)\b|https?://|www\.|\[\d+\]|©",
    )
    .expect("valid meta regex")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“”«»]"#).expect("valid quote regex"));

const DIALOGUE_PUNCTUATION: &[char] = &['!', '?', '…', ';', ':', '"', '“', '”', '«', '»', '—'];
const MAX_PUNCTUATION_DENSITY: f64 = 0.12;

/// Why a piece of text was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Header,
    Dialogue,
    Meta,
    TooShort,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Dialogue => "dialogue",
            Self::Meta => "meta",
            Self::TooShort => "too_short",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless header, dialogue and meta detection
#[derive(Debug, Clone, Copy, Default)]
pub struct AntiPatternFilter;

impl AntiPatternFilter {
    pub fn check(&self, text: &str) -> Option<Rejection> {
        if self.is_header(text) {
            Some(Rejection::Header)
        } else if self.is_meta(text) {
            Some(Rejection::Meta)
        } else if self.is_dialogue(text) {
            Some(Rejection::Dialogue)
        } else {
            None
        }
    }

    /// First line looks like a heading, a bare numeral or a short all-caps line
    pub fn is_header(&self, text: &str) -> bool {
        let line = text.lines().map(str::trim).find(|l| !l.is_empty());
        let Some(line) = line else {
            return false;
        };
        let words = line.split_whitespace().count();

        if HEADING.is_match(line) && words <= 12 && !ends_like_prose(line) {
            return true;
        }
        if NUMERAL_LINE.is_match(line) {
            return true;
        }

        let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 2 && words <= 10 && letters.iter().all(|c| c.is_uppercase())
    }

    pub fn is_dialogue(&self, text: &str) -> bool {
        let trimmed = text.trim_start();
        if trimmed.starts_with(['-', '—', '–', '"', '“', '«', '\'']) {
            return true;
        }

        if QUOTED.is_match(text) {
            let tokens = vocabulary::tokenize(text);
            if vocabulary::any_hit(&tokens, SPEECH_VERBS) {
                return true;
            }
        }

        punctuation_density(text) > MAX_PUNCTUATION_DENSITY
    }

    pub fn is_meta(&self, text: &str) -> bool {
        META.is_match(text)
    }
}

fn ends_like_prose(line: &str) -> bool {
    line.ends_with('.') && line.split_whitespace().count() > 6
}

/// Dialogue punctuation per non-whitespace character
pub fn punctuation_density(text: &str) -> f64 {
    let mut total = 0usize;
    let mut marks = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if DIALOGUE_PUNCTUATION.contains(&c) {
            marks += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        marks as f64 / total as f64
    }
}

/// Length and anti-pattern gate applied to every candidate before voting
#[derive(Debug, Clone)]
pub struct CandidateGate {
    min_length: usize,
    filter: AntiPatternFilter,
}

impl CandidateGate {
    pub fn new(boundary: &BoundaryConfig) -> Self {
        Self {
            min_length: boundary.min_length,
            filter: AntiPatternFilter,
        }
    }

    pub fn admit(&self, candidate: &CandidateSpan) -> Result<(), Rejection> {
        if candidate.text_chars() < self.min_length {
            return Err(Rejection::TooShort);
        }
        match self.filter.check(&candidate.text) {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    /// Keep admitted candidates, preserving order
    pub fn retain(&self, candidates: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
        candidates
            .into_iter()
            .filter(|c| match self.admit(c) {
                Ok(()) => true,
                Err(reason) => {
                    tracing::trace!(engine = %c.engine_id, start = c.start, %reason, "Candidate rejected");
                    false
                }
            })
            .collect()
    }
}
