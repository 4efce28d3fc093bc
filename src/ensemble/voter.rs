//! Weighted Ensemble Voting
//!
//! Turns raw engine candidates into consensus descriptions:
//! 1. Cluster overlapping candidates
//! 2. Sum `weight × confidence` per type; each engine counts once per type
//! 3. Accept the winning type when its share of the group's total engine
//!    weight reaches the consensus threshold
//! 4. Deduplicate accepted descriptions, then order by priority

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::cluster::{CandidateGroup, cluster};
use crate::config::{Config, EnsembleConfig};
use crate::constants::voting::TIE_EPSILON;
use crate::text::QualityScorer;
use crate::types::{
    CandidateSpan, CharSpan, ConsensusDescription, DescriptionType, EngineVote, ProcessingMetrics,
    overlap_ratio,
};

/// Voting result with per-engine precision for the quality history
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub descriptions: Vec<ConsensusDescription>,
    pub metrics: ProcessingMetrics,
    /// Share of each engine's candidates that ended in an emitted description
    pub engine_precision: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct EnsembleVoter {
    config: EnsembleConfig,
    scorer: QualityScorer,
}

impl EnsembleVoter {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.ensemble.clone(),
            scorer: QualityScorer::new(config.quality.clone(), config.boundary.min_length),
        }
    }

    /// Vote over candidates from several engines
    ///
    /// Candidates from engines missing in `weights` are ignored.
    pub fn vote(
        &self,
        candidates: Vec<CandidateSpan>,
        weights: &BTreeMap<String, f64>,
    ) -> VoteOutcome {
        let candidates: Vec<CandidateSpan> = candidates
            .into_iter()
            .filter(|c| weights.contains_key(&c.engine_id))
            .collect();
        let per_engine = count_by_engine(&candidates);
        let candidate_count = candidates.len();

        let groups = cluster(candidates, self.config.cluster_overlap);
        let group_count = groups.len();

        let accepted: Vec<ConsensusDescription> = groups
            .iter()
            .filter_map(|group| self.decide(group, weights))
            .collect();
        let accepted_count = accepted.len();

        debug!(
            candidates = candidate_count,
            groups = group_count,
            accepted = accepted_count,
            "Ensemble vote complete"
        );

        self.finish(
            accepted,
            per_engine,
            ProcessingMetrics::new(candidate_count, group_count, accepted_count),
        )
    }

    /// Candidates of a single engine become descriptions directly
    pub fn from_single_engine(&self, candidates: Vec<CandidateSpan>, weight: f64) -> VoteOutcome {
        self.direct(candidates, |_| weight)
    }

    /// Accept already non-overlapping candidates from several engines without
    /// a vote, used when each engine only sees text its predecessors left
    pub fn pass_through(
        &self,
        candidates: Vec<CandidateSpan>,
        weights: &BTreeMap<String, f64>,
    ) -> VoteOutcome {
        let candidates: Vec<CandidateSpan> = candidates
            .into_iter()
            .filter(|c| weights.contains_key(&c.engine_id))
            .collect();
        self.direct(candidates, |id| weights.get(id).copied().unwrap_or(0.0))
    }

    fn direct(
        &self,
        candidates: Vec<CandidateSpan>,
        weight_of: impl Fn(&str) -> f64,
    ) -> VoteOutcome {
        let per_engine = count_by_engine(&candidates);
        let count = candidates.len();

        let descriptions: Vec<ConsensusDescription> = candidates
            .into_iter()
            .map(|c| {
                let votes = vec![EngineVote {
                    engine_id: c.engine_id.clone(),
                    weight: weight_of(&c.engine_id),
                }];
                self.describe(&c, c.description_type, c.confidence, 1.0, votes, c.entities.clone())
            })
            .collect();

        self.finish(
            descriptions,
            per_engine,
            ProcessingMetrics::new(count, count, count),
        )
    }

    /// Weighted consensus for one group; `None` when rejected
    fn decide(
        &self,
        group: &CandidateGroup,
        weights: &BTreeMap<String, f64>,
    ) -> Option<ConsensusDescription> {
        // Best candidate per (type, engine): each engine votes once per type
        let mut best: BTreeMap<(DescriptionType, &str), &CandidateSpan> = BTreeMap::new();
        for c in &group.candidates {
            best.entry((c.description_type, c.engine_id.as_str()))
                .and_modify(|current| {
                    if prefer(c, *current) == Ordering::Greater {
                        *current = c;
                    }
                })
                .or_insert(c);
        }

        let engines: BTreeSet<&str> = group.candidates.iter().map(|c| c.engine_id.as_str()).collect();
        let total_weight: f64 = engines.iter().filter_map(|id| weights.get(*id)).sum();
        if total_weight <= 0.0 {
            return None;
        }

        let mut sums: BTreeMap<DescriptionType, f64> = BTreeMap::new();
        for ((description_type, engine_id), c) in &best {
            let weight = weights.get(*engine_id).copied().unwrap_or(0.0);
            *sums.entry(*description_type).or_insert(0.0) += weight * c.confidence;
        }

        let mut leader: Option<(DescriptionType, f64)> = None;
        for (&t, &sum) in &sums {
            let better = match leader {
                None => true,
                Some((lt, ls)) => {
                    sum > ls + TIE_EPSILON
                        || ((sum - ls).abs() <= TIE_EPSILON
                            && t.domain_priority() > lt.domain_priority())
                }
            };
            if better {
                leader = Some((t, sum));
            }
        }
        let (winner, winning_sum) = leader?;

        let ratio = (winning_sum / total_weight).clamp(0.0, 1.0);
        if ratio + TIE_EPSILON < self.config.consensus_threshold {
            trace!(
                start = group.start,
                end = group.end,
                ratio,
                "Group rejected below consensus threshold"
            );
            return None;
        }

        let agreeing: Vec<&CandidateSpan> = best
            .iter()
            .filter(|((t, _), _)| *t == winner)
            .map(|(_, c)| *c)
            .collect();

        let representative = agreeing.iter().copied().reduce(|a, b| {
            let longer = b.char_len().cmp(&a.char_len());
            let earlier = a.start.cmp(&b.start);
            let by_id = a.engine_id.cmp(&b.engine_id);
            match longer.then(earlier).then(by_id) {
                Ordering::Greater => b,
                _ => a,
            }
        })?;

        let mean_confidence =
            agreeing.iter().map(|c| c.confidence).sum::<f64>() / agreeing.len() as f64;
        let blend = self.config.confidence_blend;
        let confidence = (blend * ratio + (1.0 - blend) * mean_confidence).clamp(0.0, 1.0);

        let votes: Vec<EngineVote> = agreeing
            .iter()
            .map(|c| EngineVote {
                engine_id: c.engine_id.clone(),
                weight: weights.get(&c.engine_id).copied().unwrap_or(0.0),
            })
            .collect();
        let entities: BTreeSet<String> = agreeing
            .iter()
            .flat_map(|c| c.entities.iter().cloned())
            .collect();

        Some(self.describe(representative, winner, confidence, ratio, votes, entities))
    }

    fn describe(
        &self,
        representative: &CandidateSpan,
        description_type: DescriptionType,
        confidence: f64,
        consensus_ratio: f64,
        votes: Vec<EngineVote>,
        entity_mentions: BTreeSet<String>,
    ) -> ConsensusDescription {
        let quality = self.scorer.score(&representative.text, description_type);
        let priority_score = self.scorer.priority(&quality, confidence);
        ConsensusDescription {
            text: representative.text.clone(),
            start: representative.start,
            end: representative.end,
            description_type,
            confidence,
            consensus_ratio,
            priority_score,
            votes,
            entity_mentions,
            quality,
        }
    }

    /// Drop descriptions overlapping a more confident one by more than
    /// `dedup_overlap`; survivors keep their input order
    pub fn deduplicate(&self, descriptions: Vec<ConsensusDescription>) -> Vec<ConsensusDescription> {
        let mut order: Vec<usize> = (0..descriptions.len()).collect();
        order.sort_by(|&a, &b| {
            let (x, y) = (&descriptions[a], &descriptions[b]);
            y.confidence
                .total_cmp(&x.confidence)
                .then(y.priority_score.total_cmp(&x.priority_score))
                .then(x.start.cmp(&y.start))
                .then(x.end.cmp(&y.end))
        });

        let mut kept: Vec<usize> = Vec::new();
        for i in order {
            let duplicate = kept.iter().any(|&k| {
                overlap_ratio(&descriptions[i], &descriptions[k]) > self.config.dedup_overlap
            });
            if !duplicate {
                kept.push(i);
            }
        }

        let kept: BTreeSet<usize> = kept.into_iter().collect();
        descriptions
            .into_iter()
            .enumerate()
            .filter(|(i, _)| kept.contains(i))
            .map(|(_, d)| d)
            .collect()
    }

    fn finish(
        &self,
        accepted: Vec<ConsensusDescription>,
        per_engine: BTreeMap<String, usize>,
        metrics: ProcessingMetrics,
    ) -> VoteOutcome {
        let mut descriptions = self.deduplicate(accepted);
        sort_by_priority(&mut descriptions);

        let mut emitted: BTreeMap<&str, usize> = BTreeMap::new();
        for d in &descriptions {
            for id in d.engine_ids() {
                *emitted.entry(id).or_insert(0) += 1;
            }
        }
        let engine_precision = per_engine
            .iter()
            .map(|(id, &count)| {
                let hits = emitted.get(id.as_str()).copied().unwrap_or(0);
                (id.clone(), (hits as f64 / count as f64).min(1.0))
            })
            .collect();

        VoteOutcome {
            descriptions,
            metrics,
            engine_precision,
        }
    }
}

/// Higher confidence, then longer, then earlier wins
fn prefer(a: &CandidateSpan, b: &CandidateSpan) -> Ordering {
    a.confidence
        .total_cmp(&b.confidence)
        .then(a.char_len().cmp(&b.char_len()))
        .then(b.start.cmp(&a.start))
}

fn count_by_engine(candidates: &[CandidateSpan]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for c in candidates {
        *counts.entry(c.engine_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Priority descending, ties by start, end and type
pub fn sort_by_priority(descriptions: &mut [ConsensusDescription]) {
    descriptions.sort_by(|a, b| {
        b.priority_score
            .total_cmp(&a.priority_score)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
            .then(a.description_type.cmp(&b.description_type))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::CASTLE_PASSAGE;
    use proptest::prelude::*;

    fn voter() -> EnsembleVoter {
        EnsembleVoter::new(&Config::default())
    }

    fn weights() -> BTreeMap<String, f64> {
        [("a", 1.0), ("b", 1.2), ("c", 0.8)]
            .into_iter()
            .map(|(id, w)| (id.to_string(), w))
            .collect()
    }

    fn candidate(engine: &str, t: DescriptionType, confidence: f64) -> CandidateSpan {
        let len = CASTLE_PASSAGE.chars().count();
        CandidateSpan::new(engine, CASTLE_PASSAGE, 0, len, t, confidence)
    }

    #[test]
    fn test_weighted_majority_accepts_location() {
        let outcome = voter().vote(
            vec![
                candidate("a", DescriptionType::Location, 0.9),
                candidate("b", DescriptionType::Location, 0.8),
                candidate("c", DescriptionType::Character, 0.95),
            ],
            &weights(),
        );

        assert_eq!(outcome.descriptions.len(), 1);
        let d = &outcome.descriptions[0];
        assert_eq!(d.description_type, DescriptionType::Location);
        assert!((d.consensus_ratio - 0.62).abs() < 1e-9);
        let ids: Vec<_> = d.engine_ids().collect();
        assert_eq!(ids, vec!["a", "b"]);

        // 0.6 * 0.62 + 0.4 * mean(0.9, 0.8)
        assert!((d.confidence - (0.6 * 0.62 + 0.4 * 0.85)).abs() < 1e-9);
        assert_eq!(outcome.metrics.consensus_rate, 1.0);
        assert_eq!(outcome.engine_precision["c"], 0.0);
        assert_eq!(outcome.engine_precision["a"], 1.0);
    }

    #[test]
    fn test_split_vote_is_rejected() {
        let outcome = voter().vote(
            vec![
                candidate("a", DescriptionType::Location, 0.9),
                candidate("b", DescriptionType::Character, 0.8),
                candidate("c", DescriptionType::Atmosphere, 0.95),
            ],
            &weights(),
        );

        assert!(outcome.descriptions.is_empty());
        assert_eq!(outcome.metrics.group_count, 1);
        assert_eq!(outcome.metrics.accepted_count, 0);
        assert_eq!(outcome.metrics.consensus_rate, 0.0);
    }

    #[test]
    fn test_engine_counts_once_per_type() {
        let len = CASTLE_PASSAGE.chars().count();
        let mut candidates = vec![candidate("c", DescriptionType::Location, 0.9)];
        // Engine c proposing the same passage twice must not double its vote
        candidates.push(CandidateSpan::new(
            "c",
            CASTLE_PASSAGE.chars().take(len - 10).collect::<String>(),
            0,
            len - 10,
            DescriptionType::Location,
            0.9,
        ));
        candidates.push(candidate("b", DescriptionType::Character, 1.0));

        let outcome = voter().vote(candidates, &weights());
        // c: 0.8 * 0.9 = 0.72 of total 2.0 -> 0.36, b: 1.2 / 2.0 = 0.6
        assert_eq!(outcome.descriptions.len(), 1);
        assert_eq!(outcome.descriptions[0].description_type, DescriptionType::Character);
    }

    #[test]
    fn test_type_tie_resolves_by_domain_priority() {
        let mut w = BTreeMap::new();
        w.insert("a".to_string(), 1.0);
        w.insert("b".to_string(), 1.0);
        let config = Config {
            ensemble: EnsembleConfig {
                consensus_threshold: 0.5,
                ..EnsembleConfig::default()
            },
            ..Config::default()
        };
        let outcome = EnsembleVoter::new(&config).vote(
            vec![
                candidate("a", DescriptionType::Object, 1.0),
                candidate("b", DescriptionType::Character, 1.0),
            ],
            &w,
        );
        assert_eq!(outcome.descriptions[0].description_type, DescriptionType::Character);
    }

    #[test]
    fn test_longest_agreeing_span_wins() {
        let len = CASTLE_PASSAGE.chars().count();
        let shorter: String = CASTLE_PASSAGE.chars().take(len - 20).collect();
        let outcome = voter().vote(
            vec![
                CandidateSpan::new("a", shorter, 0, len - 20, DescriptionType::Location, 0.9),
                candidate("b", DescriptionType::Location, 0.9),
            ],
            &weights(),
        );
        assert_eq!(outcome.descriptions[0].end, len);
        assert_eq!(outcome.descriptions[0].text, CASTLE_PASSAGE);
    }

    #[test]
    fn test_entities_union_over_agreeing_engines() {
        let outcome = voter().vote(
            vec![
                candidate("a", DescriptionType::Location, 0.9).with_entities(["Dunmore"]),
                candidate("b", DescriptionType::Location, 0.9).with_entities(["Anna"]),
            ],
            &weights(),
        );
        let entities: Vec<_> = outcome.descriptions[0].entity_mentions.iter().cloned().collect();
        assert_eq!(entities, vec!["Anna", "Dunmore"]);
    }

    #[test]
    fn test_single_engine_path() {
        let outcome = voter().from_single_engine(
            vec![candidate("a", DescriptionType::Location, 0.7)],
            1.0,
        );
        let d = &outcome.descriptions[0];
        assert_eq!(d.consensus_ratio, 1.0);
        assert_eq!(d.confidence, 0.7);
        assert_eq!(d.votes.len(), 1);
        assert!(d.priority_score > 0.0 && d.priority_score <= 100.0);
    }

    #[test]
    fn test_pass_through_keeps_each_engine_weight() {
        let len = CASTLE_PASSAGE.chars().count();
        let outcome = voter().pass_through(
            vec![
                CandidateSpan::new("b", CASTLE_PASSAGE, 0, len, DescriptionType::Location, 0.8),
                candidate("unknown", DescriptionType::Object, 0.9),
            ],
            &weights(),
        );
        assert_eq!(outcome.descriptions.len(), 1);
        assert_eq!(outcome.descriptions[0].votes[0].weight, 1.2);
        assert!(!outcome.engine_precision.contains_key("unknown"));
    }

    #[test]
    fn test_repeated_votes_are_identical() {
        let input = || {
            vec![
                candidate("c", DescriptionType::Character, 0.95),
                candidate("a", DescriptionType::Location, 0.9),
                candidate("b", DescriptionType::Location, 0.8),
            ]
        };
        let first = serde_json::to_string(&voter().vote(input(), &weights()).descriptions).unwrap();
        for _ in 0..5 {
            let mut reversed = input();
            reversed.reverse();
            let again =
                serde_json::to_string(&voter().vote(reversed, &weights()).descriptions).unwrap();
            assert_eq!(first, again);
        }
    }

    fn description(start: usize, len: usize, confidence: f64) -> ConsensusDescription {
        ConsensusDescription {
            text: "x".repeat(len),
            start,
            end: start + len,
            description_type: DescriptionType::Location,
            confidence,
            consensus_ratio: 1.0,
            priority_score: confidence * 100.0,
            votes: Vec::new(),
            entity_mentions: BTreeSet::new(),
            quality: Default::default(),
        }
    }

    #[test]
    fn test_dedup_keeps_more_confident_duplicate() {
        let kept = voter().deduplicate(vec![
            description(0, 200, 0.6),
            description(10, 200, 0.9),
            description(500, 100, 0.5),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].start, 10);
        assert_eq!(kept[1].start, 500);
    }

    proptest! {
        #[test]
        fn prop_dedup_is_idempotent(
            spans in prop::collection::vec((0usize..2000, 1usize..400, 0.0f64..=1.0), 0..24)
        ) {
            let voter = voter();
            let input: Vec<_> = spans
                .into_iter()
                .map(|(start, len, conf)| description(start, len, conf))
                .collect();
            let once = voter.deduplicate(input);
            let twice = voter.deduplicate(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
