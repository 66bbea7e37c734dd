//! Distance baseline: the geographically nearest candidate wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::gazetteer::{CoordinateIndex, haversine_km};
use crate::ranking::CandidateSet;

use super::types::Prediction;

/// Re-scores every candidate by inverse great-circle distance to the
/// reference identifier (typically the place of publication) and picks the
/// nearest.
///
/// Each resolvable candidate gets weight `1 / (1 + d_km)`; the distribution
/// is that weight mass normalized to sum 1. Candidates without coordinates
/// are left out of the distribution. NIL when the set is empty, the
/// reference identifier has no coordinates, or no candidate resolves.
pub fn by_distance(set: &CandidateSet, origin_id: &str, coords: &CoordinateIndex) -> Prediction {
    if set.is_empty() {
        return Prediction::nil();
    }
    let Some(origin) = coords.lookup(origin_id) else {
        debug!(origin_id, "reference identifier has no coordinates");
        return Prediction::nil();
    };

    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    let mut nearest: Option<(String, f64)> = None;

    for id in set.candidate_ids() {
        let Some(point) = coords.lookup(id) else {
            continue;
        };
        let distance = haversine_km(origin, point);
        weights.insert(id.to_string(), 1.0 / (1.0 + distance));

        let closer = match &nearest {
            None => true,
            // Strict comparison: on an exact distance tie the earlier
            // (smaller) identifier stays.
            Some((_, best)) => distance < *best,
        };
        if closer {
            nearest = Some((id.to_string(), distance));
        }
    }

    let Some((winner, distance_km)) = nearest else {
        debug!(origin_id, "no candidate coordinates resolvable");
        return Prediction::nil();
    };

    let total: f64 = weights.values().sum();
    let distribution: BTreeMap<String, f64> = weights
        .into_iter()
        .map(|(id, weight)| (id, weight / total))
        .collect();

    let confidence = distribution[&winner];
    debug!(winner = %winner, distance_km, confidence, "distance baseline decided");

    Prediction {
        id: winner,
        confidence,
        distribution,
    }
}
