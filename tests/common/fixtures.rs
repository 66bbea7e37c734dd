//! Test fixtures for integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use placelink::{Document, Mention, Sentence};

/// Installs a quiet tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A small but realistic gazetteer written to disk: three English places,
/// one transatlantic ambiguity, and one qualified noise entry.
pub struct GazetteerFixture {
    pub dir: TempDir,
    pub variants_path: PathBuf,
    pub ids_path: PathBuf,
    pub coordinates_path: PathBuf,
}

impl GazetteerFixture {
    pub fn write() -> Self {
        let dir = TempDir::new().expect("create fixture dir");

        let variants = serde_json::json!({
            "London": {"Q84": 90000, "Q92561": 800},
            "Londinium": {"Q84": 60},
            "London (Ontario)": {"Q92561": 450},
            "Sheffield": {"Q42448": 12000},
            "New York City": {"Q60": 40000}
        });
        let ids = serde_json::json!({
            "Q84": {"London": 90000, "Londinium": 60},
            "Q92561": {"London": 800, "London (Ontario)": 450},
            "Q42448": {"Sheffield": 12000},
            "Q60": {"New York City": 40000}
        });
        let coordinates = serde_json::json!({
            "Q84": [51.507222, -0.1275],
            "Q92561": [42.9849, -81.2453],
            "Q42448": [53.380833, -1.466944],
            "Q60": [40.712778, -74.006111],
            "Q18125": [53.479444, -2.245278]
        });

        let variants_path = dir.path().join("mentions_to_ids.json");
        let ids_path = dir.path().join("ids_to_mentions.json");
        let coordinates_path = dir.path().join("coordinates.json");
        fs::write(&variants_path, variants.to_string()).expect("write variants");
        fs::write(&ids_path, ids.to_string()).expect("write ids");
        fs::write(&coordinates_path, coordinates.to_string()).expect("write coordinates");

        Self {
            dir,
            variants_path,
            ids_path,
            coordinates_path,
        }
    }
}

/// A two-sentence article mentioning London, published in Manchester.
pub fn london_article() -> Document {
    Document {
        id: "article_101".to_string(),
        sentences: vec![
            Sentence {
                pos: 0,
                text: "A dreadful fire broke out in London yesterday.".to_string(),
            },
            Sentence {
                pos: 1,
                text: "Several warehouses were destroyed.".to_string(),
            },
        ],
        mentions: vec![Mention {
            surface: "London".to_string(),
            start: 29,
            end: 35,
            tag: Some("LOC".to_string()),
            sentence_pos: 0,
        }],
        place: Some("Manchester".to_string()),
        place_id: Some("Q18125".to_string()),
    }
}
