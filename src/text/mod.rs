//! Text utilities shared by engines, the voter and adaptive routing

pub mod boundary;
pub mod classifier;
pub mod features;
pub mod filters;
pub mod quality;
pub mod sentences;
pub mod vocabulary;

pub use boundary::{BoundaryDetector, SentenceSpan};
pub use classifier::{TypeScores, entity_mentions};
pub use features::TextFeatures;
pub use filters::{AntiPatternFilter, CandidateGate, Rejection};
pub use quality::QualityScorer;
pub use sentences::{Sentence, split_sentences};
