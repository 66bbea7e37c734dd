use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Mention;

/// Sentinel identifier meaning "no suitable knowledge-base entry".
pub const NIL: &str = "NIL";

/// Final linking decision for one mention.
///
/// Not retained by the engine; callers own the lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Knowledge-base identifier, or [`NIL`].
    pub id: String,
    /// Decision confidence in `[0, 1]`.
    pub confidence: f64,
    /// Re-normalized candidate distribution behind the decision.
    pub distribution: BTreeMap<String, f64>,
}

impl Prediction {
    /// The NIL prediction: no entry, zero confidence, empty distribution.
    pub fn nil() -> Self {
        Self {
            id: NIL.to_string(),
            confidence: 0.0,
            distribution: BTreeMap::new(),
        }
    }

    /// Returns `true` if this prediction is the NIL sentinel.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.id == NIL
    }
}

/// One mention row of a results table, awaiting (or carrying) a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRow {
    pub document_id: String,
    pub mention: Mention,
    #[serde(default)]
    pub prediction: Option<Prediction>,
}

impl MentionRow {
    /// Builds a row with no prediction attached yet.
    pub fn new(document_id: impl Into<String>, mention: Mention) -> Self {
        Self {
            document_id: document_id.into(),
            mention,
            prediction: None,
        }
    }
}
