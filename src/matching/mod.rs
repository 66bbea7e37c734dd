//! Pairwise matching strategies.
//!
//! Three pure string strategies (exact, containment, edit-distance) plus the
//! [`EmbeddingMatcher`] contract for learned retrieval. All of them score a
//! lookup form against gazetteer variants; the ranker owns strategy choice,
//! thresholds, and top-K.

/// Embedding retrieval contract.
pub mod embedding;
/// Matching errors.
pub mod error;
/// String-similarity primitives.
pub mod string;
/// Comparison record types.
pub mod types;


pub use embedding::{EmbeddingMatcher, EmbeddingSearchRequest, EmbeddingSearchResponse};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingMatcher;
pub use error::MatchError;
pub use string::{containment_score, edit_distance_score, exact_match_score};
pub use types::VariantRecord;
