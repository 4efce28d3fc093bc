pub mod description;
pub mod error;
pub mod result;

pub use description::{
    CandidateSpan, CharSpan, ConsensusDescription, DescriptionType, EngineVote, QualityBreakdown,
    overlap_ratio, range_overlap,
};
pub use error::{DescryError, EngineError, EngineErrorKind, Result};
pub use result::{ProcessingMetrics, ProcessingResult, input_digest};
