//! Test doubles and fixture passages

use std::time::Duration;

use super::EngineAdapter;
use crate::types::{CandidateSpan, DescriptionType, EngineError, Result};

pub const CASTLE_PASSAGE: &str = "The old castle stood on a high cliff above the grey sea. \
     Pale light fell across its crumbling walls and narrow towers. \
     Beneath the ramparts, dark waves broke against the jagged rocks. \
     The great hall lay silent behind the ancient gate.";

pub const TWO_PARAGRAPHS: &str = "The old castle stood on a high cliff above the grey sea. \
     Pale light fell across its crumbling walls and narrow towers. \
     Beneath the ramparts, dark waves broke against the jagged rocks. \
     The great hall lay silent behind the ancient gate.\n\n\
     Captain Elias Marrow stood beside the fire. \
     His grey beard hung over a faded blue coat, and his pale eyes glimmered beneath a heavy brow. \
     Deep lines covered his weathered face.";

/// Adapter returning preset candidates, optionally after a delay or with an error
#[derive(Debug, Clone)]
pub struct ScriptedAdapter {
    id: String,
    spans: Vec<CandidateSpan>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl ScriptedAdapter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            spans: Vec::new(),
            delay: None,
            failure: None,
        }
    }

    /// Add a span over `text[start..end]` measured in characters
    pub fn with_span(
        mut self,
        text: &str,
        start: usize,
        end: usize,
        description_type: DescriptionType,
        confidence: f64,
    ) -> Self {
        let slice: String = text.chars().skip(start).take(end - start).collect();
        self.spans.push(CandidateSpan::new(
            self.id.clone(),
            slice,
            start,
            end,
            description_type,
            confidence,
        ));
        self
    }

    pub fn with_candidate(mut self, candidate: CandidateSpan) -> Self {
        self.spans.push(candidate);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

impl EngineAdapter for ScriptedAdapter {
    fn extract(&self, _text: &str) -> Result<Vec<CandidateSpan>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(message) = &self.failure {
            return Err(EngineError::failed(&self.id, message.clone()).into());
        }
        Ok(self.spans.clone())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// A long descriptive text made of `paragraphs` copies of the fixture paragraphs
pub fn long_text(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|_| TWO_PARAGRAPHS)
        .collect::<Vec<_>>()
        .join("\n\n")
}
