//! Frequency baseline: the most popular candidate wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ranking::CandidateSet;

use super::types::Prediction;

/// Default re-normalization exponent, calibrated against the reference
/// vector `{0.9, 0.1}` so the winner lands at roughly 0.9896.
pub const DEFAULT_SMOOTHING_EXPONENT: f64 = 2.072;

/// Picks the candidate with the highest gazetteer relevance.
///
/// Candidates are flattened across matched variants (an identifier keeps its
/// best relevance). The winner's confidence is its share of the
/// power-smoothed relevance mass `rel^exponent / sum(rel^exponent)`: for any
/// exponent above 1 this is strictly above the raw share and strictly below
/// 1 whenever a weaker rival exists, and it preserves the relative ordering
/// of the inputs. An empty set yields the NIL prediction.
pub fn most_popular(set: &CandidateSet, smoothing_exponent: f64) -> Prediction {
    let flat = set.max_relevance_by_id();
    if flat.is_empty() {
        return Prediction::nil();
    }

    let denominator: f64 = flat
        .values()
        .map(|relevance| relevance.powf(smoothing_exponent))
        .sum();
    if denominator <= 0.0 {
        return Prediction::nil();
    }

    let distribution: BTreeMap<String, f64> = flat
        .iter()
        .map(|(id, relevance)| {
            (
                (*id).to_string(),
                relevance.powf(smoothing_exponent) / denominator,
            )
        })
        .collect();

    // Highest relevance wins; ties resolve to the smallest identifier.
    let Some(winner) = flat
        .iter()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })
        .map(|(id, _)| (*id).to_string())
    else {
        return Prediction::nil();
    };

    let confidence = distribution[&winner];
    debug!(winner = %winner, confidence, candidates = flat.len(), "frequency baseline decided");

    Prediction {
        id: winner,
        confidence,
        distribution,
    }
}
