//! Placelink: linking place-name mentions to knowledge-base identifiers.
//!
//! The crate covers the two stages that do real work over noisy,
//! OCR-affected historical text: candidate generation/ranking against a
//! surface-form gazetteer, and disambiguation of those candidates into one
//! prediction (or NIL) per mention. Entity recognition, embedding
//! retrieval, the learned disambiguation scorer, and any serving layer are
//! external collaborators consumed through contracts.
//!
//! # Flow
//!
//! Recognized mentions go through [`Ranker::find_candidates`] to get a
//! [`CandidateSet`] per surface form, then through
//! [`Linker::perform_linking`] to get a [`Prediction`] per mention.
//!
//! # Module map
//!
//! - [`config`] - `PLACELINK_*` environment configuration
//! - [`document`] - mention/sentence/document records, boundary validation
//! - [`gazetteer`] - the frequency gazetteer, filtering, coordinates
//! - [`matching`] - string strategies and the embedding-retrieval contract
//! - [`ranking`] - the memoized candidate ranker
//! - [`linking`] - frequency/distance baselines and the delegated scorer
//!
//! Mock collaborators are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod document;
pub mod gazetteer;
pub mod linking;
pub mod matching;
pub mod ranking;

pub use config::{Config, ConfigError};
pub use document::{Document, LOCATION_TAG, Mention, RecordError, Sentence};
pub use gazetteer::{CoordinateIndex, GazetteerIndex, ResourceError, haversine_km};
pub use linking::{
    CrossRefTable, DEFAULT_SMOOTHING_EXPONENT, DelegatedOptions, Linker, LinkingError, MentionRow,
    NIL, NO_ENTITY_LABEL, Prediction, PredictionService, ScorerMention, ScorerPrediction,
    ScorerRequest, ScorerResponse, Strategy, attach_predictions, by_distance, most_popular,
};
#[cfg(any(test, feature = "mock"))]
pub use linking::MockPredictionService;
pub use matching::{
    EmbeddingMatcher, EmbeddingSearchRequest, EmbeddingSearchResponse, MatchError, VariantRecord,
    containment_score, edit_distance_score, exact_match_score,
};
#[cfg(any(test, feature = "mock"))]
pub use matching::MockEmbeddingMatcher;
pub use ranking::{
    Candidate, CandidateMap, CandidateSet, FilterSettings, Matcher, Ranker, RankerSettings,
    RankingError, VariantMatch, flatten_candidates,
};
