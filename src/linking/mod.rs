//! Disambiguation: turning candidate sets into final predictions.
//!
//! [`Linker`] dispatches one of three exclusive strategies, chosen at
//! construction: the frequency baseline, the distance baseline, or
//! delegation to an externally-trained scorer. Strategies are swappable
//! without caller changes; every one yields a [`Prediction`] whose
//! identifier is either valid or [`NIL`].

/// Delegated scorer contract and adapters.
pub mod delegated;
/// Distance baseline.
pub mod distance;
/// Linking errors.
pub mod error;
/// Frequency baseline.
pub mod frequency;
/// Prediction types.
pub mod types;

#[cfg(test)]
mod tests;

pub use delegated::{
    CrossRefTable, DelegatedOptions, NO_ENTITY_LABEL, PredictionService, ScorerMention,
    ScorerPrediction, ScorerRequest, ScorerResponse,
};
#[cfg(any(test, feature = "mock"))]
pub use delegated::MockPredictionService;
pub use distance::by_distance;
pub use error::LinkingError;
pub use frequency::{DEFAULT_SMOOTHING_EXPONENT, most_popular};
pub use types::{MentionRow, NIL, Prediction};

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::document::Document;
use crate::gazetteer::{CoordinateIndex, GazetteerIndex};
use crate::ranking::{CandidateMap, CandidateSet, Ranker};

/// Closed set of disambiguation strategies.
pub enum Strategy {
    /// Highest gazetteer relevance wins.
    MostPopular,
    /// Geographically nearest to the document's publication place wins.
    ByDistance,
    /// Externally-trained scorer decides.
    Delegated {
        service: Box<dyn PredictionService>,
        crossref: CrossRefTable,
        options: DelegatedOptions,
    },
}

impl Strategy {
    /// Strategy name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::MostPopular => "most-popular",
            Strategy::ByDistance => "by-distance",
            Strategy::Delegated { .. } => "delegated",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Disambiguation engine.
#[derive(Debug)]
pub struct Linker {
    strategy: Strategy,
    coords: Option<Arc<CoordinateIndex>>,
    smoothing_exponent: f64,
}

impl Linker {
    /// Creates a linker with the given strategy.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            coords: None,
            smoothing_exponent: DEFAULT_SMOOTHING_EXPONENT,
        }
    }

    /// Attaches the coordinate index the distance baseline requires.
    pub fn with_coordinates(mut self, coords: Arc<CoordinateIndex>) -> Self {
        self.coords = Some(coords);
        self
    }

    /// Overrides the frequency baseline's smoothing exponent.
    pub fn with_smoothing_exponent(mut self, exponent: f64) -> Self {
        self.smoothing_exponent = exponent;
        self
    }

    /// Disambiguates every mention of one document.
    ///
    /// Returns one prediction per mention, in document order. For the
    /// delegated strategy this is one blocking external call; an error
    /// marks this document failed and leaves other documents untouched.
    pub fn perform_linking(
        &self,
        document: &Document,
        sets: &CandidateMap,
        index: &GazetteerIndex,
    ) -> Result<Vec<Prediction>, LinkingError> {
        let empty = CandidateSet::default();

        let predictions = match &self.strategy {
            Strategy::MostPopular => document
                .mentions
                .iter()
                .map(|m| {
                    most_popular(set_for(sets, &empty, &m.surface), self.smoothing_exponent)
                })
                .collect(),
            Strategy::ByDistance => {
                let coords = self
                    .coords
                    .as_ref()
                    .ok_or(LinkingError::CoordinatesNotLoaded)?;
                match document.place_id.as_deref() {
                    Some(origin) => document
                        .mentions
                        .iter()
                        .map(|m| by_distance(set_for(sets, &empty, &m.surface), origin, coords))
                        .collect(),
                    // No reference point: every mention resolves to NIL.
                    None => document.mentions.iter().map(|_| Prediction::nil()).collect(),
                }
            }
            Strategy::Delegated {
                service,
                crossref,
                options,
            } => {
                let request = delegated::build_request(document, sets, index, options);
                let response = service.predict(&request)?;
                delegated::map_response(document, options, crossref, &response)?
            }
        };

        info!(
            strategy = self.strategy.name(),
            document = %document.id,
            mentions = predictions.len(),
            "document linked"
        );
        Ok(predictions)
    }

    /// Disambiguates a batch of documents independently.
    ///
    /// Each document gets its own result: one failing document (for the
    /// delegated strategy, one failing external call) never corrupts the
    /// predictions already produced for the others.
    pub fn link_documents(
        &self,
        documents: &[(Document, CandidateMap)],
        index: &GazetteerIndex,
    ) -> Vec<Result<Vec<Prediction>, LinkingError>> {
        documents
            .iter()
            .map(|(document, sets)| {
                let result = self.perform_linking(document, sets, index);
                if let Err(error) = &result {
                    warn!(document = %document.id, %error, "document failed to link");
                }
                result
            })
            .collect()
    }
}

/// Candidate set for a mention surface, by normalized lookup form. A
/// surface the ranker never saw maps to the empty set (a lookup miss).
fn set_for<'a>(
    sets: &'a CandidateMap,
    empty: &'a CandidateSet,
    surface: &str,
) -> &'a CandidateSet {
    sets.get(&Ranker::normalize_surface(surface))
        .map(|set| set.as_ref())
        .unwrap_or(empty)
}

/// Attaches predictions back onto the original mention rows.
///
/// Counts must line up exactly; a divergence is reported instead of
/// silently dropping or misaligning records.
pub fn attach_predictions(
    rows: &mut [MentionRow],
    predictions: Vec<Prediction>,
) -> Result<(), LinkingError> {
    if rows.len() != predictions.len() {
        return Err(LinkingError::ResultCountMismatch {
            expected: rows.len(),
            actual: predictions.len(),
        });
    }
    for (row, prediction) in rows.iter_mut().zip(predictions) {
        row.prediction = Some(prediction);
    }
    Ok(())
}
