use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Kind of visually-groundable passage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionType {
    Location,
    Character,
    Atmosphere,
    Object,
    Action,
}

impl DescriptionType {
    pub const ALL: [DescriptionType; 5] = [
        DescriptionType::Location,
        DescriptionType::Character,
        DescriptionType::Atmosphere,
        DescriptionType::Object,
        DescriptionType::Action,
    ];

    /// Domain priority used to break voting ties (higher wins)
    ///
    /// LOCATION > CHARACTER > ATMOSPHERE > OBJECT > ACTION. Locations anchor an
    /// illustration, so they outrank everything that can be drawn inside one.
    pub fn domain_priority(&self) -> u8 {
        match self {
            DescriptionType::Location => 5,
            DescriptionType::Character => 4,
            DescriptionType::Atmosphere => 3,
            DescriptionType::Object => 2,
            DescriptionType::Action => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionType::Location => "location",
            DescriptionType::Character => "character",
            DescriptionType::Atmosphere => "atmosphere",
            DescriptionType::Object => "object",
            DescriptionType::Action => "action",
        }
    }
}

impl std::fmt::Display for DescriptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DescriptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location" => Ok(DescriptionType::Location),
            "character" => Ok(DescriptionType::Character),
            "atmosphere" => Ok(DescriptionType::Atmosphere),
            "object" => Ok(DescriptionType::Object),
            "action" => Ok(DescriptionType::Action),
            _ => Err(format!(
                "Unknown description type: {}. Valid values: location, character, atmosphere, object, action",
                s
            )),
        }
    }
}

/// Character offset range `[start, end)` into the source text
pub trait CharSpan {
    fn start(&self) -> usize;
    fn end(&self) -> usize;

    fn char_len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }
}

/// Tentative description proposed by a single engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub description_type: DescriptionType,
    /// Engine-local confidence (0.0 - 1.0)
    pub confidence: f64,
    pub engine_id: String,
    #[serde(default)]
    pub entities: BTreeSet<String>,
}

impl CandidateSpan {
    pub fn new(
        engine_id: impl Into<String>,
        text: impl Into<String>,
        start: usize,
        end: usize,
        description_type: DescriptionType,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            description_type,
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
            engine_id: engine_id.into(),
            entities: BTreeSet::new(),
        }
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    /// Length of the span text in characters
    pub fn text_chars(&self) -> usize {
        self.text.chars().count()
    }
}

impl CharSpan for CandidateSpan {
    fn start(&self) -> usize {
        self.start
    }
    fn end(&self) -> usize {
        self.end
    }
}

/// One engine's vote for an accepted description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineVote {
    pub engine_id: String,
    pub weight: f64,
}

/// Per-factor quality scores, each normalized to 0.0 - 1.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub linguistic: f64,
    pub visual_richness: f64,
    pub structural: f64,
    pub type_specificity: f64,
    pub length_fitness: f64,
    /// Weighted combination of the five factors
    pub overall: f64,
}

/// Voted, deduplicated output unit of one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusDescription {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub description_type: DescriptionType,
    /// Aggregate confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Winning weighted share of the group (0.0 - 1.0)
    pub consensus_ratio: f64,
    /// Downstream ranking value (0 - 100)
    pub priority_score: f64,
    pub votes: Vec<EngineVote>,
    pub entity_mentions: BTreeSet<String>,
    pub quality: QualityBreakdown,
}

impl ConsensusDescription {
    pub fn engine_ids(&self) -> impl Iterator<Item = &str> {
        self.votes.iter().map(|v| v.engine_id.as_str())
    }
}

impl CharSpan for ConsensusDescription {
    fn start(&self) -> usize {
        self.start
    }
    fn end(&self) -> usize {
        self.end
    }
}

/// Fraction of the shorter span covered by the intersection of both
///
/// Returns 0.0 when either span is empty or they do not intersect.
pub fn overlap_ratio(a: &impl CharSpan, b: &impl CharSpan) -> f64 {
    range_overlap(a.start(), a.end(), b.start(), b.end())
}

/// [`overlap_ratio`] over raw `[start, end)` ranges
pub fn range_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> f64 {
    let shorter = (a_end.saturating_sub(a_start)).min(b_end.saturating_sub(b_start));
    if shorter == 0 {
        return 0.0;
    }
    let lo = a_start.max(b_start);
    let hi = a_end.min(b_end);
    if hi <= lo {
        return 0.0;
    }
    (hi - lo) as f64 / shorter as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_priority_order() {
        let mut types = DescriptionType::ALL.to_vec();
        types.sort_by_key(|t| std::cmp::Reverse(t.domain_priority()));
        assert_eq!(types, DescriptionType::ALL.to_vec());
    }

    #[test]
    fn test_description_type_parse() {
        assert_eq!(
            "LOCATION".parse::<DescriptionType>().unwrap(),
            DescriptionType::Location
        );
        assert!("scenery".parse::<DescriptionType>().is_err());
    }

    #[test]
    fn test_overlap_ratio() {
        assert_eq!(range_overlap(0, 100, 50, 150), 0.5);
        assert_eq!(range_overlap(0, 100, 10, 30), 1.0);
        assert_eq!(range_overlap(0, 10, 10, 20), 0.0);
        assert_eq!(range_overlap(5, 5, 0, 10), 0.0);
    }

    #[test]
    fn test_candidate_confidence_clamped() {
        let span = CandidateSpan::new("a", "text", 0, 4, DescriptionType::Object, 1.7);
        assert_eq!(span.confidence, 1.0);
        let nan = CandidateSpan::new("a", "text", 0, 4, DescriptionType::Object, f64::NAN);
        assert_eq!(nan.confidence, 0.0);
    }
}
