//! Delegated disambiguation through an externally-trained scorer.
//!
//! The learned entity-disambiguation model lives outside this crate and is
//! consumed as a blocking, document-scoped batch-prediction capability. This
//! module owns the adaptation in both directions: mentions plus their ranked
//! candidates into the scorer's sentence-keyed request shape, and the
//! scorer's label predictions back into knowledge-base identifier space via
//! a static cross-reference table.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{Document, LOCATION_TAG};
use crate::gazetteer::{GazetteerIndex, ResourceError};
use crate::ranking::{CandidateMap, Ranker, flatten_candidates};

use super::error::LinkingError;
use super::types::Prediction;

/// Label the scorer emits when it declines to link a mention.
pub const NO_ENTITY_LABEL: &str = "NONE";

/// Placeholder for the gold field the scorer's input format carries.
const GOLD_PLACEHOLDER: &str = "NONE";

/// One mention as the external scorer expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerMention {
    pub mention: String,
    pub sentence: String,
    pub ngram: String,
    /// Text of the previous and next sentence.
    pub context: (String, String),
    /// Ranked `[identifier, relevance]` pairs.
    pub candidates: Vec<(String, f64)>,
    pub position: usize,
    pub end_position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Present for format compatibility; always a placeholder at inference.
    pub gold: String,
}

/// Scorer request: sentence key to the mentions in that sentence.
pub type ScorerRequest = BTreeMap<String, Vec<ScorerMention>>;

/// One scored mention coming back from the external model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerPrediction {
    pub mention: String,
    /// External-form label, or [`NO_ENTITY_LABEL`].
    pub prediction: String,
    pub confidence: f64,
}

/// Scorer response, keyed identically to the request.
pub type ScorerResponse = BTreeMap<String, Vec<ScorerPrediction>>;

/// The externally-trained batch scorer.
///
/// One call covers one document. The call blocks until the scorer resolves;
/// the core assumes nothing about the scorer's internal concurrency.
pub trait PredictionService: Send + Sync {
    fn predict(&self, request: &ScorerRequest) -> Result<ScorerResponse, LinkingError>;
}

/// Static external-label to identifier cross-reference.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    labels: HashMap<String, String>,
}

impl CrossRefTable {
    /// Loads a JSON resource mapping external label to identifier.
    pub fn load(path: &Path) -> Result<Self, ResourceError> {
        let raw = fs::read_to_string(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let labels: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| ResourceError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        info!(entries = labels.len(), "cross-reference table loaded");
        Ok(Self { labels })
    }

    /// Builds a table from in-memory entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            labels: entries.into_iter().collect(),
        }
    }

    /// Maps an external label to an identifier. The no-entity marker, the
    /// empty label, and unmapped labels all resolve to `None` (NIL).
    pub fn resolve(&self, label: &str) -> Option<&str> {
        if label.is_empty() || label == NO_ENTITY_LABEL {
            return None;
        }
        self.labels.get(label).map(String::as_str)
    }

    /// Number of mapped labels.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Options shaping the delegated scorer's input.
#[derive(Debug, Clone, Default)]
pub struct DelegatedOptions {
    /// Append the place-of-publication pseudo-mention to each document.
    pub with_publication: bool,
    /// Restrict input to mentions tagged as plain locations.
    pub location_tags_only: bool,
    /// Publication place used when a document carries none.
    pub default_publication_place: String,
    /// Identifier of the default publication place.
    pub default_publication_id: String,
}

/// Sentence the publication pseudo-mention is embedded in.
const PUBLICATION_PREFIX: &str = "This article is published in ";

/// Builds the scorer request for one document.
pub(super) fn build_request(
    document: &Document,
    sets: &CandidateMap,
    index: &GazetteerIndex,
    options: &DelegatedOptions,
) -> ScorerRequest {
    let mut request = ScorerRequest::new();

    for mention in &document.mentions {
        if options.location_tags_only && !mention.is_location() {
            continue;
        }

        let form = Ranker::normalize_surface(&mention.surface);
        let candidates = sets
            .get(&form)
            .map(|set| flatten_candidates(set, index))
            .unwrap_or_default();
        let (left, right) = document.context_for(mention.sentence_pos);
        let sentence = document
            .sentence_text(mention.sentence_pos)
            .unwrap_or_default()
            .to_string();

        request
            .entry(document.sentence_key(mention.sentence_pos))
            .or_default()
            .push(ScorerMention {
                mention: mention.surface.clone(),
                sentence,
                ngram: mention.surface.clone(),
                context: (left, right),
                candidates,
                position: mention.start,
                end_position: mention.end,
                tag: mention.tag.clone(),
                gold: GOLD_PLACEHOLDER.to_string(),
            });
    }

    if options.with_publication {
        if let Some(publication) = publication_mention(document, options) {
            request
                .entry(document.sentence_key(0))
                .or_default()
                .push(publication);
        }
    }

    debug!(
        document = %document.id,
        sentences = request.len(),
        "delegated request built"
    );
    request
}

/// The already-disambiguated pseudo-mention for the place of publication.
/// Anchors the scorer's coherence model to the document's geography.
fn publication_mention(document: &Document, options: &DelegatedOptions) -> Option<ScorerMention> {
    let place = document
        .place
        .clone()
        .unwrap_or_else(|| options.default_publication_place.clone());
    let place_id = document
        .place_id
        .clone()
        .unwrap_or_else(|| options.default_publication_id.clone());
    if place.is_empty() || place_id.is_empty() {
        return None;
    }

    let sentence = format!("{PUBLICATION_PREFIX}{place}.");
    let position = PUBLICATION_PREFIX.chars().count();
    let end_position = position + place.chars().count();

    Some(ScorerMention {
        mention: place.clone(),
        sentence,
        ngram: place.clone(),
        context: (String::new(), String::new()),
        candidates: vec![(place_id, 1.0)],
        position,
        end_position,
        tag: Some(LOCATION_TAG.to_string()),
        gold: GOLD_PLACEHOLDER.to_string(),
    })
}

/// Joins the scorer's response back onto the document's mentions, in
/// document order, mapping labels into identifier space.
pub(super) fn map_response(
    document: &Document,
    options: &DelegatedOptions,
    crossref: &CrossRefTable,
    response: &ScorerResponse,
) -> Result<Vec<Prediction>, LinkingError> {
    let mut predictions = Vec::with_capacity(document.mentions.len());

    for mention in &document.mentions {
        if options.location_tags_only && !mention.is_location() {
            predictions.push(Prediction::nil());
            continue;
        }

        let key = document.sentence_key(mention.sentence_pos);
        let scored = response
            .get(&key)
            .and_then(|list| list.iter().find(|p| p.mention == mention.surface))
            .ok_or_else(|| LinkingError::MalformedResponse {
                reason: format!(
                    "no prediction returned for mention '{}' under sentence '{key}'",
                    mention.surface
                ),
            })?;

        let confidence = ((scored.confidence * 1000.0).round() / 1000.0).clamp(0.0, 1.0);
        predictions.push(match crossref.resolve(&scored.prediction) {
            Some(id) => Prediction {
                id: id.to_string(),
                confidence,
                distribution: BTreeMap::from([(id.to_string(), confidence)]),
            },
            None => Prediction::nil(),
        });
    }

    Ok(predictions)
}

/// Scripted scorer for tests: canned label per mention surface.
#[cfg(any(test, feature = "mock"))]
pub struct MockPredictionService {
    predictions: HashMap<String, (String, f64)>,
    requests: parking_lot::Mutex<Vec<ScorerRequest>>,
    fail_with: Option<String>,
}

#[cfg(any(test, feature = "mock"))]
impl MockPredictionService {
    pub fn new() -> Self {
        Self {
            predictions: HashMap::new(),
            requests: parking_lot::Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// Registers a canned `(label, confidence)` for a mention surface.
    pub fn with_prediction(
        mut self,
        mention: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        self.predictions
            .insert(mention.into(), (label.into(), confidence));
        self
    }

    /// Makes every prediction call fail with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            predictions: HashMap::new(),
            requests: parking_lot::Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// All requests observed so far.
    pub fn requests(&self) -> Vec<ScorerRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Default for MockPredictionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "mock"))]
impl PredictionService for MockPredictionService {
    fn predict(&self, request: &ScorerRequest) -> Result<ScorerResponse, LinkingError> {
        self.requests.lock().push(request.clone());

        if let Some(message) = &self.fail_with {
            return Err(LinkingError::ExternalModel {
                message: message.clone(),
            });
        }

        let mut response = ScorerResponse::new();
        for (key, mentions) in request {
            let scored = mentions
                .iter()
                .map(|m| {
                    let (label, confidence) = self
                        .predictions
                        .get(&m.mention)
                        .cloned()
                        .unwrap_or_else(|| (NO_ENTITY_LABEL.to_string(), 0.0));
                    ScorerPrediction {
                        mention: m.mention.clone(),
                        prediction: label,
                        confidence,
                    }
                })
                .collect();
            response.insert(key.clone(), scored);
        }
        Ok(response)
    }
}
