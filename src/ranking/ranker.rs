use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::{debug, info};

use crate::document::Mention;
use crate::gazetteer::{GazetteerIndex, ResourceError};
use crate::matching::{
    EmbeddingMatcher, EmbeddingSearchRequest, VariantRecord, containment_score,
    edit_distance_score,
};

use super::error::RankingError;
use super::types::{CandidateMap, CandidateSet, VariantMatch};

/// Closed set of candidate-generation strategies. Chosen once at
/// construction; exhaustively matched everywhere it is dispatched.
pub enum Matcher {
    /// Case-sensitive equality against gazetteer variants.
    Exact,
    /// Case-insensitive substring containment.
    Containment,
    /// Normalized Damerau-Levenshtein similarity.
    EditDistance,
    /// External embedding-based nearest-neighbor retrieval.
    Embedding(Box<dyn EmbeddingMatcher>),
}

impl Matcher {
    /// Strategy name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Matcher::Exact => "exact",
            Matcher::Containment => "containment",
            Matcher::EditDistance => "edit-distance",
            Matcher::Embedding(_) => "embedding",
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ranker tuning knobs.
#[derive(Debug, Clone)]
pub struct RankerSettings {
    /// Minimum similarity for a fuzzy match to be kept.
    pub similarity_threshold: f64,
    /// Maximum matched variants per mention.
    pub top_k: usize,
    /// Breadth of the embedding index sweep (embedding strategy only).
    pub search_size: usize,
    /// Capacity of the per-session memoization cache.
    pub cache_capacity: u64,
}

impl Default for RankerSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            top_k: 3,
            search_size: 32,
            cache_capacity: 10_000,
        }
    }
}

/// Gazetteer pruning thresholds applied at load time.
#[derive(Debug, Clone, Copy)]
pub struct FilterSettings {
    /// Keep only the N most frequent variants per identifier.
    pub top_mentions: usize,
    /// Drop variants below this count share for their identifier.
    pub minimum_relevance: f64,
}

/// Candidate-generation engine.
///
/// Owns one [`Matcher`] strategy and a session-local memoization cache:
/// within a session, the underlying match computation runs at most once per
/// distinct surface form, whatever the batch composition.
pub struct Ranker {
    matcher: Matcher,
    settings: RankerSettings,
    index: Option<Arc<GazetteerIndex>>,
    cache: Cache<String, Arc<CandidateSet>>,
    computations: AtomicU64,
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("matcher", &self.matcher)
            .field("settings", &self.settings)
            .field("loaded", &self.index.is_some())
            .finish()
    }
}

impl Ranker {
    /// Creates a ranker with no resources loaded yet.
    pub fn new(matcher: Matcher, settings: RankerSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.cache_capacity)
            .build();
        Self {
            matcher,
            settings,
            index: None,
            cache,
            computations: AtomicU64::new(0),
        }
    }

    /// Creates a ranker over an already-built gazetteer index.
    pub fn with_index(
        matcher: Matcher,
        settings: RankerSettings,
        index: Arc<GazetteerIndex>,
    ) -> Self {
        let mut ranker = Self::new(matcher, settings);
        ranker.index = Some(index);
        ranker
    }

    /// Loads (and optionally filters) the gazetteer resources.
    ///
    /// Replacing the index invalidates the memoization cache: cached sets
    /// were computed against the previous association table.
    pub fn load_resources(
        &mut self,
        variants_path: &Path,
        ids_path: &Path,
        filter: Option<FilterSettings>,
    ) -> Result<(), ResourceError> {
        let mut index = GazetteerIndex::load(variants_path, ids_path)?;
        if let Some(filter) = filter {
            index = index.filter(filter.top_mentions, filter.minimum_relevance);
        }
        self.index = Some(Arc::new(index));
        self.cache.invalidate_all();
        info!(strategy = self.matcher.name(), "ranker resources ready");
        Ok(())
    }

    /// The gazetteer index, once loaded.
    pub fn index(&self) -> Option<&Arc<GazetteerIndex>> {
        self.index.as_ref()
    }

    /// How many underlying match computations have run in this session.
    ///
    /// Memoization keeps this at one per distinct surface form.
    pub fn computation_count(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Normalizes a raw surface form into the lookup key: whitespace
    /// trimmed and internal runs collapsed. Case is preserved so the exact
    /// strategy stays case-sensitive.
    pub fn normalize_surface(raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Finds gazetteer candidates for a batch of mentions.
    ///
    /// The sole public lookup entry point. Returns candidate sets keyed by
    /// the normalized lookup form; mentions with no match map to an empty
    /// set. Fails with [`RankingError::ResourcesNotLoaded`] if called before
    /// the gazetteer is available.
    pub fn find_candidates(&self, mentions: &[Mention]) -> Result<CandidateMap, RankingError> {
        let index = self
            .index
            .as_ref()
            .cloned()
            .ok_or(RankingError::ResourcesNotLoaded)?;

        let forms: Vec<String> = mentions
            .iter()
            .map(|m| Self::normalize_surface(&m.surface))
            .collect();

        let mut results = CandidateMap::new();
        match &self.matcher {
            Matcher::Embedding(matcher) => {
                self.retrieve_embedding_batch(matcher.as_ref(), &index, &forms)?;
                for form in forms {
                    let set = self
                        .cache
                        .get(&form)
                        .unwrap_or_else(|| Arc::new(CandidateSet::default()));
                    results.insert(form, set);
                }
            }
            _ => {
                for form in forms {
                    if results.contains_key(&form) {
                        continue;
                    }
                    let set = self.cache.get_with(form.clone(), || {
                        self.computations.fetch_add(1, Ordering::Relaxed);
                        Arc::new(self.compute_string_match(&index, &form))
                    });
                    results.insert(form, set);
                }
            }
        }

        debug!(
            strategy = self.matcher.name(),
            mentions = mentions.len(),
            distinct = results.len(),
            computations = self.computation_count(),
            "candidate lookup complete"
        );

        Ok(results)
    }

    /// Resolves cache misses for the embedding strategy with one batched
    /// retrieval call, then fills the cache.
    fn retrieve_embedding_batch(
        &self,
        matcher: &dyn EmbeddingMatcher,
        index: &Arc<GazetteerIndex>,
        forms: &[String],
    ) -> Result<(), RankingError> {
        let misses: BTreeSet<String> = forms
            .iter()
            .filter(|form| self.cache.get(*form).is_none())
            .cloned()
            .collect();
        if misses.is_empty() {
            return Ok(());
        }

        let request = EmbeddingSearchRequest {
            mentions: misses.iter().cloned().collect(),
            num_candidates: self.settings.top_k,
            search_size: self.settings.search_size,
            similarity_threshold: self.settings.similarity_threshold,
        };
        let response = matcher.retrieve(&request)?;

        for form in misses {
            self.computations.fetch_add(1, Ordering::Relaxed);
            let mut scored: Vec<(String, f64)> = response
                .matches_for(&form)
                .map(|m| m.iter().map(|(v, s)| (v.clone(), *s)).collect())
                .unwrap_or_default();
            sort_scored(&mut scored);
            scored.truncate(self.settings.top_k);

            let set = build_candidate_set(index, scored);
            self.cache.insert(form, Arc::new(set));
        }
        Ok(())
    }

    /// Scores one lookup form against the gazetteer with the configured
    /// string strategy.
    fn compute_string_match(&self, index: &GazetteerIndex, form: &str) -> CandidateSet {
        match &self.matcher {
            Matcher::Exact => match index.normalized_candidates(form) {
                Some(candidates) => {
                    let mut variants = BTreeMap::new();
                    variants.insert(
                        form.to_string(),
                        VariantMatch {
                            score: 1.0,
                            candidates,
                        },
                    );
                    CandidateSet { variants }
                }
                // Unknown surface form: a lookup miss, reported as an
                // empty set.
                None => CandidateSet::default(),
            },
            Matcher::Containment => self.scan_variants(index, form, containment_score),
            Matcher::EditDistance => self.scan_variants(index, form, |form, record| {
                Some(edit_distance_score(form, record))
            }),
            Matcher::Embedding(_) => {
                unreachable!("embedding lookups are resolved in batch, never per form")
            }
        }
    }

    fn scan_variants(
        &self,
        index: &GazetteerIndex,
        form: &str,
        score: fn(&str, &VariantRecord) -> Option<f64>,
    ) -> CandidateSet {
        let mut scored: Vec<(String, f64)> = Vec::new();
        for variant in index.variants() {
            let record = VariantRecord::new(variant);
            if let Some(s) = score(form, &record) {
                if s >= self.settings.similarity_threshold {
                    scored.push((variant.to_string(), s));
                }
            }
        }
        sort_scored(&mut scored);
        scored.truncate(self.settings.top_k);
        build_candidate_set(index, scored)
    }
}

/// Highest score first; ties resolve alphabetically for determinism.
fn sort_scored(scored: &mut [(String, f64)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

/// Attaches gazetteer relevances to matched variants. The similarity score
/// stays a separate confidence weight; relevance always comes from the
/// gazetteer's association counts.
fn build_candidate_set(index: &GazetteerIndex, scored: Vec<(String, f64)>) -> CandidateSet {
    let mut variants = BTreeMap::new();
    for (variant, score) in scored {
        if let Some(candidates) = index.normalized_candidates(&variant) {
            variants.insert(variant, VariantMatch { score, candidates });
        }
    }
    CandidateSet { variants }
}
