//! Embedding-based retrieval contract.
//!
//! The learned matcher maps a mention into a vector space and retrieves
//! nearest gazetteer variants from an approximate nearest-neighbor index.
//! Both the model and the index live outside this crate; only the request
//! and response shapes are pinned here so the ranker can stay
//! strategy-agnostic. Calls are blocking: implementations that talk to a
//! remote index resolve the call before returning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::MatchError;

/// Retrieval request for a batch of mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSearchRequest {
    /// Lookup surface forms to retrieve variants for.
    pub mentions: Vec<String>,
    /// Maximum variants to return per mention.
    pub num_candidates: usize,
    /// Breadth of the underlying index sweep.
    pub search_size: usize,
    /// Minimum similarity for a variant to be reported.
    pub similarity_threshold: f64,
}

/// Retrieval response: per mention, matched variant to similarity score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSearchResponse {
    pub matches: HashMap<String, HashMap<String, f64>>,
}

impl EmbeddingSearchResponse {
    /// Matched variants for `mention` (empty response slot counts as a miss).
    pub fn matches_for(&self, mention: &str) -> Option<&HashMap<String, f64>> {
        self.matches.get(mention)
    }
}

/// External nearest-neighbor retrieval over the gazetteer's variant space.
pub trait EmbeddingMatcher: Send + Sync {
    fn retrieve(
        &self,
        request: &EmbeddingSearchRequest,
    ) -> Result<EmbeddingSearchResponse, MatchError>;
}

/// Canned-table matcher for tests.
///
/// Scores come from a fixed `(mention, variant) -> similarity` table; the
/// threshold and `num_candidates` truncation of a real index are applied so
/// ranker behavior matches production shape. Every request is recorded.
#[cfg(any(test, feature = "mock"))]
pub struct MockEmbeddingMatcher {
    table: HashMap<String, Vec<(String, f64)>>,
    requests: parking_lot::Mutex<Vec<EmbeddingSearchRequest>>,
    fail_with: Option<String>,
}

#[cfg(any(test, feature = "mock"))]
impl MockEmbeddingMatcher {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            requests: parking_lot::Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// Registers a canned similarity for `(mention, variant)`.
    pub fn with_match(
        mut self,
        mention: impl Into<String>,
        variant: impl Into<String>,
        score: f64,
    ) -> Self {
        self.table
            .entry(mention.into())
            .or_default()
            .push((variant.into(), score));
        self
    }

    /// Makes every retrieval fail with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            table: HashMap::new(),
            requests: parking_lot::Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// All requests observed so far.
    pub fn requests(&self) -> Vec<EmbeddingSearchRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for MockEmbeddingMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl EmbeddingMatcher for MockEmbeddingMatcher {
    fn retrieve(
        &self,
        request: &EmbeddingSearchRequest,
    ) -> Result<EmbeddingSearchResponse, MatchError> {
        self.requests.lock().push(request.clone());

        if let Some(message) = &self.fail_with {
            return Err(MatchError::Retrieval {
                message: message.clone(),
            });
        }

        let mut matches = HashMap::new();
        for mention in &request.mentions {
            let mut scored: Vec<(String, f64)> = self
                .table
                .get(mention)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|(_, score)| *score >= request.similarity_threshold)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            scored.truncate(request.num_candidates);
            matches.insert(mention.clone(), scored.into_iter().collect());
        }

        Ok(EmbeddingSearchResponse { matches })
    }
}
