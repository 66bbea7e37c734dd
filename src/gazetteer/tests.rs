use std::io::Write;

use tempfile::NamedTempFile;

use super::coords::{CoordinateIndex, haversine_km};
use super::error::ResourceError;
use super::{GazetteerIndex, has_disambiguating_qualifier};

fn write_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn sample_index() -> GazetteerIndex {
    GazetteerIndex::from_associations([
        ("London".to_string(), "Q84".to_string(), 90_000),
        ("London".to_string(), "Q92561".to_string(), 800),
        ("Londinium".to_string(), "Q84".to_string(), 60),
        ("London (Ontario)".to_string(), "Q92561".to_string(), 450),
        ("Sheffield".to_string(), "Q42448".to_string(), 12_000),
        ("Shefield".to_string(), "Q42448".to_string(), 9),
    ])
}

#[test]
fn test_load_round_trip() {
    let variants = write_json(r#"{"London": {"Q84": 90000, "Q92561": 800}}"#);
    let ids = write_json(r#"{"Q84": {"London": 90000}, "Q92561": {"London": 800}}"#);

    let index = GazetteerIndex::load(variants.path(), ids.path()).expect("load");
    assert_eq!(index.variant_count(), 1);
    assert_eq!(index.id_count(), 2);
    assert_eq!(index.raw_count("London", "Q84"), Some(90_000));
}

#[test]
fn test_load_missing_file_is_resource_error() {
    let ids = write_json("{}");
    let err = GazetteerIndex::load(std::path::Path::new("/nonexistent/gaz.json"), ids.path())
        .unwrap_err();
    assert!(matches!(err, ResourceError::Io { .. }));
}

#[test]
fn test_load_malformed_json_is_resource_error() {
    let variants = write_json(r#"{"London": "not a map"}"#);
    let ids = write_json("{}");
    let err = GazetteerIndex::load(variants.path(), ids.path()).unwrap_err();
    assert!(matches!(err, ResourceError::Malformed { .. }));
}

#[test]
fn test_normalized_candidates_sum_to_one() {
    let index = sample_index();
    let candidates = index.normalized_candidates("London").expect("known variant");

    let total: f64 = candidates.values().sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!(candidates["Q84"] > candidates["Q92561"]);
}

#[test]
fn test_unknown_variant_is_a_miss_not_an_error() {
    let index = sample_index();
    assert!(index.normalized_candidates("Paperopoli").is_none());
    assert_eq!(index.raw_count("Paperopoli", "Q84"), None);
}

#[test]
fn test_filter_is_subset_with_surviving_candidates() {
    let index = sample_index();
    let filtered = index.filter(10, 0.0);

    assert!(filtered.variant_count() <= index.variant_count());
    for variant in filtered.variants() {
        assert!(index.contains_variant(variant));
        let candidates = filtered.candidates(variant).expect("surviving variant");
        assert!(!candidates.is_empty());
        for (id, count) in candidates {
            assert_eq!(index.raw_count(variant, id), Some(*count));
        }
    }
}

#[test]
fn test_filter_drops_qualified_variants() {
    let index = sample_index();
    let filtered = index.filter(10, 0.0);

    assert!(!filtered.contains_variant("London (Ontario)"));
    assert!(filtered.contains_variant("London"));
}

#[test]
fn test_filter_applies_relevance_threshold_per_identifier() {
    let index = sample_index();
    // "Shefield" holds 9 of Q42448's 12009 occurrences, well under 1%.
    let filtered = index.filter(10, 0.01);

    assert!(!filtered.contains_variant("Shefield"));
    assert!(filtered.contains_variant("Sheffield"));
}

#[test]
fn test_filter_keeps_top_mentions_per_identifier() {
    let index = sample_index();
    let filtered = index.filter(1, 0.0);

    // Q84 keeps only "London"; "Londinium" is rank 2.
    assert!(filtered.contains_variant("London"));
    assert!(!filtered.contains_variant("Londinium"));
}

#[test]
fn test_filter_is_idempotent() {
    let index = sample_index();
    let once = index.filter(2, 0.01);
    let twice = once.filter(2, 0.01);

    let mut a: Vec<&str> = once.variants().collect();
    let mut b: Vec<&str> = twice.variants().collect();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
    for variant in once.variants() {
        assert_eq!(once.candidates(variant), twice.candidates(variant));
    }
}

#[test]
fn test_filter_rebuilds_both_directions_consistently() {
    let index = sample_index();
    let filtered = index.filter(10, 0.0);

    for variant in filtered.variants() {
        for (id, count) in filtered.candidates(variant).unwrap() {
            let mirrored = filtered
                .variants_for_id(id)
                .and_then(|variants| variants.get(variant));
            assert_eq!(mirrored, Some(count), "{variant} / {id} out of sync");
        }
    }
}

#[test]
fn test_qualifier_detection() {
    assert!(has_disambiguating_qualifier("Sheffield (Tasmania)"));
    assert!(has_disambiguating_qualifier("Ashton, Northamptonshire"));
    assert!(!has_disambiguating_qualifier("Stoke-on-Trent"));
}

#[test]
fn test_coordinate_index_load_and_lookup() {
    let file = write_json(r#"{"Q84": [51.507222, -0.1275], "Q90": [48.8567, 2.3508]}"#);
    let coords = CoordinateIndex::load(file.path()).expect("load");

    assert_eq!(coords.len(), 2);
    let (lat, lon) = coords.lookup("Q84").expect("known id");
    assert!((lat - 51.507222).abs() < 1e-9);
    assert!((lon + 0.1275).abs() < 1e-9);
    assert!(coords.lookup("Q404").is_none());
}

#[test]
fn test_coordinate_index_rejects_bad_pair() {
    let file = write_json(r#"{"Q84": [51.5]}"#);
    let err = CoordinateIndex::load(file.path()).unwrap_err();
    assert!(matches!(err, ResourceError::InvalidCoordinate { id } if id == "Q84"));
}

#[test]
fn test_haversine_london_paris() {
    let london = (51.507222, -0.1275);
    let paris = (48.8567, 2.3508);
    let d = haversine_km(london, paris);
    // Published great-circle distance is roughly 344 km.
    assert!((d - 344.0).abs() < 2.0, "got {d}");
}

#[test]
fn test_haversine_zero_for_same_point() {
    let p = (51.5, -0.12);
    assert!(haversine_km(p, p).abs() < 1e-9);
}
