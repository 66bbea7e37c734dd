use std::collections::BTreeMap;
use std::sync::Arc;

use crate::document::{Document, Mention, Sentence};
use crate::gazetteer::{CoordinateIndex, GazetteerIndex};
use crate::ranking::{CandidateMap, CandidateSet, VariantMatch};

use super::delegated::MockPredictionService;
use super::error::LinkingError;
use super::types::{MentionRow, Prediction};
use super::{
    CrossRefTable, DelegatedOptions, Linker, PredictionService, ScorerRequest, ScorerResponse,
    Strategy, attach_predictions, by_distance, most_popular,
};

fn candidate_set(variant: &str, score: f64, candidates: &[(&str, f64)]) -> CandidateSet {
    let mut variants = BTreeMap::new();
    variants.insert(
        variant.to_string(),
        VariantMatch {
            score,
            candidates: candidates
                .iter()
                .map(|(id, relevance)| (id.to_string(), *relevance))
                .collect(),
        },
    );
    CandidateSet { variants }
}

fn london_set() -> CandidateSet {
    candidate_set("London", 1.0, &[("Q84", 0.9), ("Q92561", 0.1)])
}

fn sample_coords() -> CoordinateIndex {
    CoordinateIndex::from_entries([
        // London.
        ("Q84".to_string(), (51.507222, -0.1275)),
        // London, Ontario.
        ("Q92561".to_string(), (42.9849, -81.2453)),
        // Toronto.
        ("Q172".to_string(), (43.653226, -79.383184)),
    ])
}

#[test]
fn test_most_popular_reference_vector() {
    let prediction = most_popular(&london_set(), super::DEFAULT_SMOOTHING_EXPONENT);

    assert_eq!(prediction.id, "Q84");
    // Strictly raised above the raw 0.9 share, strictly below 1.
    assert!(prediction.confidence > 0.9);
    assert!(prediction.confidence < 1.0);
    // Calibrated near the observed reference output.
    assert!((prediction.confidence - 0.9896).abs() < 0.001);

    // The distribution preserves input ordering and sums to 1.
    assert!(prediction.distribution["Q84"] > prediction.distribution["Q92561"]);
    let total: f64 = prediction.distribution.values().sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn test_most_popular_empty_set_is_nil() {
    let prediction = most_popular(&CandidateSet::default(), super::DEFAULT_SMOOTHING_EXPONENT);
    assert!(prediction.is_nil());
    assert_eq!(prediction.confidence, 0.0);
    assert!(prediction.distribution.is_empty());
}

#[test]
fn test_most_popular_single_candidate_takes_full_mass() {
    let set = candidate_set("Sheffield", 1.0, &[("Q42448", 1.0)]);
    let prediction = most_popular(&set, super::DEFAULT_SMOOTHING_EXPONENT);
    assert_eq!(prediction.id, "Q42448");
    assert_eq!(prediction.confidence, 1.0);
}

#[test]
fn test_most_popular_flattens_across_variants() {
    let mut set = candidate_set("London", 1.0, &[("Q84", 0.6)]);
    set.variants.insert(
        "Londres".to_string(),
        VariantMatch {
            score: 0.8,
            candidates: BTreeMap::from([("Q84".to_string(), 0.9), ("Q2966".to_string(), 0.1)]),
        },
    );
    let prediction = most_popular(&set, super::DEFAULT_SMOOTHING_EXPONENT);
    assert_eq!(prediction.id, "Q84");
    assert_eq!(prediction.distribution.len(), 2);
}

#[test]
fn test_by_distance_nearer_candidate_wins() {
    let coords = sample_coords();

    let from_london = by_distance(&london_set(), "Q84", &coords);
    assert_eq!(from_london.id, "Q84");
    assert!(from_london.distribution.contains_key("Q84"));
    assert!(from_london.confidence > 0.5);

    let from_toronto = by_distance(&london_set(), "Q172", &coords);
    assert_eq!(from_toronto.id, "Q92561");
    // The losing candidate stays in the distribution.
    assert!(from_toronto.distribution.contains_key("Q84"));
}

#[test]
fn test_by_distance_nil_cases() {
    let coords = sample_coords();

    assert!(by_distance(&CandidateSet::default(), "Q84", &coords).is_nil());
    // Unknown reference identifier.
    assert!(by_distance(&london_set(), "Q404", &coords).is_nil());
    // No candidate coordinates resolvable.
    let set = candidate_set("Atlantis", 1.0, &[("Q9999999", 1.0)]);
    assert!(by_distance(&set, "Q84", &coords).is_nil());
}

#[test]
fn test_by_distance_distribution_sums_to_one() {
    let coords = sample_coords();
    let prediction = by_distance(&london_set(), "Q172", &coords);
    let total: f64 = prediction.distribution.values().sum();
    assert!((total - 1.0).abs() < 1e-12);
}

fn sample_doc() -> (Document, CandidateMap, GazetteerIndex) {
    let index = GazetteerIndex::from_associations([
        ("London".to_string(), "Q84".to_string(), 90_000),
        ("London".to_string(), "Q92561".to_string(), 800),
    ]);
    let document = Document {
        id: "art1".to_string(),
        sentences: vec![
            Sentence { pos: 0, text: "The fire of London raged.".to_string() },
            Sentence { pos: 1, text: "It spread quickly.".to_string() },
        ],
        mentions: vec![Mention {
            surface: "London".to_string(),
            start: 12,
            end: 18,
            tag: Some("LOC".to_string()),
            sentence_pos: 0,
        }],
        place: Some("Manchester".to_string()),
        place_id: Some("Q18125".to_string()),
    };
    let mut sets = CandidateMap::new();
    sets.insert("London".to_string(), Arc::new(london_set()));
    (document, sets, index)
}

#[test]
fn test_linker_most_popular_end_to_end() {
    let (document, sets, index) = sample_doc();
    let linker = Linker::new(Strategy::MostPopular);

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].id, "Q84");
}

#[test]
fn test_linker_by_distance_requires_coordinates() {
    let (document, sets, index) = sample_doc();
    let linker = Linker::new(Strategy::ByDistance);

    let err = linker.perform_linking(&document, &sets, &index).unwrap_err();
    assert!(matches!(err, LinkingError::CoordinatesNotLoaded));
}

#[test]
fn test_linker_by_distance_without_place_is_nil() {
    let (mut document, sets, index) = sample_doc();
    document.place_id = None;
    let linker =
        Linker::new(Strategy::ByDistance).with_coordinates(Arc::new(sample_coords()));

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert!(predictions[0].is_nil());
}

fn delegated_linker(service: impl PredictionService + 'static) -> Linker {
    Linker::new(Strategy::Delegated {
        service: Box::new(service),
        crossref: CrossRefTable::from_entries([
            ("London_(England)".to_string(), "Q84".to_string()),
        ]),
        options: DelegatedOptions::default(),
    })
}

#[test]
fn test_delegated_maps_labels_to_identifiers() {
    let (document, sets, index) = sample_doc();
    let service =
        MockPredictionService::new().with_prediction("London", "London_(England)", 0.87654);
    let linker = delegated_linker(service);

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert_eq!(predictions[0].id, "Q84");
    // Confidence comes back rounded to three decimals.
    assert_eq!(predictions[0].confidence, 0.877);
}

#[test]
fn test_delegated_unmapped_label_is_nil() {
    let (document, sets, index) = sample_doc();
    let service =
        MockPredictionService::new().with_prediction("London", "Somewhere_Unknown", 0.9);
    let linker = delegated_linker(service);

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert!(predictions[0].is_nil());
}

#[test]
fn test_delegated_no_entity_label_is_nil() {
    let (document, sets, index) = sample_doc();
    let service = MockPredictionService::new();
    let linker = delegated_linker(service);

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert!(predictions[0].is_nil());
}

#[test]
fn test_delegated_request_shape() {
    let (document, sets, index) = sample_doc();
    let service = Arc::new(
        MockPredictionService::new().with_prediction("London", "London_(England)", 0.9),
    );
    let linker = Linker::new(Strategy::Delegated {
        service: Box::new(SharedService(service.clone())),
        crossref: CrossRefTable::from_entries([
            ("London_(England)".to_string(), "Q84".to_string()),
        ]),
        options: DelegatedOptions::default(),
    });

    linker.perform_linking(&document, &sets, &index).unwrap();

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let mentions = &requests[0]["art1_0"];
    assert_eq!(mentions.len(), 1);
    let m = &mentions[0];
    assert_eq!(m.mention, "London");
    assert_eq!(m.sentence, "The fire of London raged.");
    assert_eq!(m.context, (String::new(), "It spread quickly.".to_string()));
    assert_eq!(m.position, 12);
    assert_eq!(m.end_position, 18);
    assert_eq!(m.candidates[0].0, "Q84");
}

#[test]
fn test_delegated_appends_publication_pseudo_mention() {
    let (document, sets, index) = sample_doc();
    let service = Arc::new(MockPredictionService::new());
    let linker = Linker::new(Strategy::Delegated {
        service: Box::new(SharedService(service.clone())),
        crossref: CrossRefTable::default(),
        options: DelegatedOptions {
            with_publication: true,
            ..DelegatedOptions::default()
        },
    });

    linker.perform_linking(&document, &sets, &index).unwrap();

    let requests = service.requests();
    let first_sentence = &requests[0]["art1_0"];
    assert_eq!(first_sentence.len(), 2);
    let publ = &first_sentence[1];
    assert_eq!(publ.mention, "Manchester");
    assert_eq!(publ.sentence, "This article is published in Manchester.");
    assert_eq!(publ.candidates, vec![("Q18125".to_string(), 1.0)]);
}

#[test]
fn test_delegated_location_tags_only_skips_other_mentions() {
    let (mut document, sets, index) = sample_doc();
    document.mentions.push(Mention {
        surface: "Town Hall".to_string(),
        start: 0,
        end: 9,
        tag: Some("BUILDING".to_string()),
        sentence_pos: 1,
    });
    let service = Arc::new(
        MockPredictionService::new().with_prediction("London", "London_(England)", 0.9),
    );
    let linker = Linker::new(Strategy::Delegated {
        service: Box::new(SharedService(service.clone())),
        crossref: CrossRefTable::from_entries([
            ("London_(England)".to_string(), "Q84".to_string()),
        ]),
        options: DelegatedOptions {
            location_tags_only: true,
            ..DelegatedOptions::default()
        },
    });

    let predictions = linker.perform_linking(&document, &sets, &index).unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].id, "Q84");
    assert!(predictions[1].is_nil());

    // The non-location mention never reached the scorer.
    let requests = service.requests();
    assert!(!requests[0].contains_key("art1_1"));
}

struct SharedService(Arc<MockPredictionService>);

impl PredictionService for SharedService {
    fn predict(&self, request: &ScorerRequest) -> Result<ScorerResponse, LinkingError> {
        self.0.predict(request)
    }
}

/// Fails only for documents containing a poisoned mention surface.
struct PoisonedService;

impl PredictionService for PoisonedService {
    fn predict(&self, request: &ScorerRequest) -> Result<ScorerResponse, LinkingError> {
        let poisoned = request
            .values()
            .flatten()
            .any(|m| m.mention == "Mordor");
        if poisoned {
            return Err(LinkingError::ExternalModel {
                message: "scorer rejected the document".to_string(),
            });
        }
        MockPredictionService::new().predict(request)
    }
}

#[test]
fn test_document_failure_does_not_corrupt_batch() {
    let (healthy, sets, index) = sample_doc();
    let mut poisoned = healthy.clone();
    poisoned.id = "art2".to_string();
    poisoned.mentions[0].surface = "Mordor".to_string();

    let linker = Linker::new(Strategy::Delegated {
        service: Box::new(PoisonedService),
        crossref: CrossRefTable::default(),
        options: DelegatedOptions::default(),
    });

    let batch = vec![
        (healthy.clone(), sets.clone()),
        (poisoned, sets.clone()),
        (healthy, sets),
    ];
    let results = linker.link_documents(&batch, &index);

    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().unwrap_err(),
        LinkingError::ExternalModel { .. }
    ));
    assert!(results[2].is_ok());
    assert_eq!(results[0].as_ref().unwrap().len(), 1);
}

#[test]
fn test_delegated_missing_mention_is_malformed_response() {
    let (document, sets, index) = sample_doc();

    struct SilentService;
    impl PredictionService for SilentService {
        fn predict(&self, _request: &ScorerRequest) -> Result<ScorerResponse, LinkingError> {
            Ok(ScorerResponse::new())
        }
    }

    let linker = Linker::new(Strategy::Delegated {
        service: Box::new(SilentService),
        crossref: CrossRefTable::default(),
        options: DelegatedOptions::default(),
    });

    let err = linker.perform_linking(&document, &sets, &index).unwrap_err();
    assert!(matches!(err, LinkingError::MalformedResponse { .. }));
}

#[test]
fn test_attach_predictions_aligns_rows() {
    let mut rows = vec![
        MentionRow::new("art1", Mention::new("London")),
        MentionRow::new("art1", Mention::new("Sheffield")),
    ];
    let predictions = vec![Prediction::nil(), Prediction::nil()];

    attach_predictions(&mut rows, predictions).unwrap();
    assert!(rows.iter().all(|row| row.prediction.is_some()));
}

#[test]
fn test_attach_predictions_detects_count_mismatch() {
    let mut rows = vec![MentionRow::new("art1", Mention::new("London"))];
    let err = attach_predictions(&mut rows, vec![]).unwrap_err();
    assert!(matches!(
        err,
        LinkingError::ResultCountMismatch { expected: 1, actual: 0 }
    ));
    assert!(rows[0].prediction.is_none());
}

#[test]
fn test_crossref_resolution() {
    let table = CrossRefTable::from_entries([
        ("London_(England)".to_string(), "Q84".to_string()),
    ]);
    assert_eq!(table.resolve("London_(England)"), Some("Q84"));
    assert_eq!(table.resolve("NONE"), None);
    assert_eq!(table.resolve(""), None);
    assert_eq!(table.resolve("Atlantis"), None);
}
