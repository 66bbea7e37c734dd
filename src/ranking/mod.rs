//! Candidate generation and ranking.
//!
//! [`Ranker`] turns recognized mentions into per-mention [`CandidateSet`]s
//! using one matching strategy chosen at construction. Lookups are memoized
//! per session: a surface form is scored against the gazetteer at most once,
//! however often it recurs in a batch.

/// Ranking errors.
pub mod error;
/// The ranker engine.
pub mod ranker;
/// Candidate set types.
pub mod types;


pub use error::RankingError;
pub use ranker::{FilterSettings, Matcher, Ranker, RankerSettings};
pub use types::{Candidate, CandidateMap, CandidateSet, VariantMatch};

use std::collections::BTreeMap;

use crate::gazetteer::GazetteerIndex;

/// Flattens a candidate set into the ranked `[identifier, score]` list the
/// delegated disambiguation scorer consumes.
///
/// Per `(variant, identifier)` pair: average the identifier's relevance with
/// the variant's match confidence, average that with the identifier's count
/// share of the set-wide maximum, scale into `[0, 0.9]`, and round to three
/// decimals. An identifier reachable through several variants keeps its best
/// score. Sorted descending by score, then by identifier.
pub fn flatten_candidates(set: &CandidateSet, index: &GazetteerIndex) -> Vec<(String, f64)> {
    let mut pool: Vec<(Candidate, f64)> = Vec::new();
    let mut max_count: u64 = 0;

    for (variant, vm) in &set.variants {
        for (id, relevance) in &vm.candidates {
            let candidate = Candidate {
                id: id.clone(),
                count: index.raw_count(variant, id).unwrap_or(0),
                relevance: *relevance,
            };
            max_count = max_count.max(candidate.count);
            let weighted = if vm.score > 0.0 {
                (candidate.relevance + vm.score) / 2.0
            } else {
                candidate.relevance
            };
            pool.push((candidate, weighted));
        }
    }

    if pool.is_empty() || max_count == 0 {
        return Vec::new();
    }

    let mut best: BTreeMap<String, f64> = BTreeMap::new();
    for (candidate, weighted) in pool {
        let share = candidate.count as f64 / max_count as f64;
        let score = round3(((share + weighted) / 2.0) * 0.9);
        best.entry(candidate.id)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    let mut ranked: Vec<(String, f64)> = best.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.cmp(&a.0))
    });
    ranked
}

#[inline]
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
