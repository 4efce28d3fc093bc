//! Ensemble voting over engine candidates

mod cluster;
mod voter;

pub use cluster::{CandidateGroup, cluster};
pub use voter::{EnsembleVoter, VoteOutcome, sort_by_priority};
