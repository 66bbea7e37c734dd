use thiserror::Error;

use crate::matching::MatchError;

/// Errors raised by the candidate ranker.
#[derive(Debug, Error)]
pub enum RankingError {
    /// `find_candidates` was invoked before the gazetteer was loaded.
    #[error("gazetteer resources have not been loaded")]
    ResourcesNotLoaded,

    /// A matching strategy failed.
    #[error(transparent)]
    Match(#[from] MatchError),
}
