//! Overlap clustering of engine candidates

use crate::types::{CandidateSpan, range_overlap};

/// Candidates covering roughly the same passage
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    pub start: usize,
    pub end: usize,
    pub candidates: Vec<CandidateSpan>,
}

impl CandidateGroup {
    fn new(candidate: CandidateSpan) -> Self {
        Self {
            start: candidate.start,
            end: candidate.end,
            candidates: vec![candidate],
        }
    }

    fn push(&mut self, candidate: CandidateSpan) {
        self.start = self.start.min(candidate.start);
        self.end = self.end.max(candidate.end);
        self.candidates.push(candidate);
    }
}

/// Group candidates in `(start, end, engine_id)` order
///
/// Each candidate joins the first group whose bounding range overlaps it by
/// at least `min_overlap`, otherwise it starts a new group.
pub fn cluster(mut candidates: Vec<CandidateSpan>, min_overlap: f64) -> Vec<CandidateGroup> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then_with(|| a.engine_id.cmp(&b.engine_id))
    });

    let mut groups: Vec<CandidateGroup> = Vec::new();
    for candidate in candidates {
        let target = groups.iter_mut().find(|g| {
            range_overlap(g.start, g.end, candidate.start, candidate.end) >= min_overlap
        });
        match target {
            Some(group) => group.push(candidate),
            None => groups.push(CandidateGroup::new(candidate)),
        }
    }
    groups
}
