use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One knowledge-base candidate under a matched variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Knowledge-base identifier.
    pub id: String,
    /// Raw occurrence count from the gazetteer.
    pub count: u64,
    /// The identifier's share of the variant's count mass, in `[0, 1]`.
    pub relevance: f64,
}

/// Candidates found under one matched gazetteer variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantMatch {
    /// Match confidence between the lookup form and the variant, in `[0, 1]`.
    ///
    /// This is string (or embedding) similarity, never identifier relevance.
    #[serde(rename = "Score")]
    pub score: f64,
    /// Identifier to normalized relevance, ordered by identifier.
    #[serde(rename = "Candidates")]
    pub candidates: BTreeMap<String, f64>,
}

/// All matched variants for one lookup surface form.
///
/// An empty set is a lookup miss, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub variants: BTreeMap<String, VariantMatch>,
}

impl CandidateSet {
    /// Returns `true` if no variant matched.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Number of matched variants.
    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Every distinct identifier proposed across all matched variants.
    pub fn candidate_ids(&self) -> BTreeSet<&str> {
        self.variants
            .values()
            .flat_map(|vm| vm.candidates.keys().map(String::as_str))
            .collect()
    }

    /// Flattens to identifier → highest relevance seen under any variant.
    pub fn max_relevance_by_id(&self) -> BTreeMap<&str, f64> {
        let mut flat: BTreeMap<&str, f64> = BTreeMap::new();
        for vm in self.variants.values() {
            for (id, relevance) in &vm.candidates {
                flat.entry(id.as_str())
                    .and_modify(|r| *r = r.max(*relevance))
                    .or_insert(*relevance);
            }
        }
        flat
    }
}

/// Candidate sets keyed by lookup surface form, as returned by the ranker.
pub type CandidateMap = BTreeMap<String, Arc<CandidateSet>>;
