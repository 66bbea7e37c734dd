//! Mention and document records.
//!
//! Mentions are produced by an external entity-recognition model. They
//! arrive as loosely-shaped JSON and are validated into explicit records at
//! this boundary; nothing downstream ever touches raw maps.

/// Record validation errors.
pub mod error;


pub use error::RecordError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// NER tag an entity-recognition model assigns to plain location mentions.
pub const LOCATION_TAG: &str = "LOC";

/// A recognized text span believed to name a place. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Surface form as it appears in the text.
    pub surface: String,
    /// Character offset of the span start within its sentence.
    #[serde(default)]
    pub start: usize,
    /// Character offset one past the span end.
    #[serde(default)]
    pub end: usize,
    /// NER type tag, e.g. `"LOC"` or `"BUILDING"`.
    #[serde(default)]
    pub tag: Option<String>,
    /// Position of the containing sentence within the document.
    #[serde(default)]
    pub sentence_pos: usize,
}

impl Mention {
    /// Builds a bare mention from a surface form.
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            start: 0,
            end: 0,
            tag: None,
            sentence_pos: 0,
        }
    }

    /// Validates a loosely-shaped JSON value into a mention.
    ///
    /// Only `mention` is required; span, tag, and sentence position are
    /// optional and default when absent.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let map = match value {
            Value::Object(map) => map,
            Value::String(_) => return Err(RecordError::NotAnObject { found: "bare string" }),
            Value::Array(_) => return Err(RecordError::NotAnObject { found: "array" }),
            Value::Null => return Err(RecordError::NotAnObject { found: "null" }),
            Value::Bool(_) => return Err(RecordError::NotAnObject { found: "boolean" }),
            Value::Number(_) => return Err(RecordError::NotAnObject { found: "number" }),
        };

        let surface = map
            .get("mention")
            .ok_or(RecordError::MissingField { field: "mention" })?
            .as_str()
            .ok_or(RecordError::InvalidField {
                field: "mention",
                expected: "a string",
            })?
            .to_string();

        let read_pos = |field: &'static str| -> Result<usize, RecordError> {
            match map.get(field) {
                None | Some(Value::Null) => Ok(0),
                Some(value) => value
                    .as_u64()
                    .map(|n| n as usize)
                    .ok_or(RecordError::InvalidField {
                        field,
                        expected: "a non-negative integer",
                    }),
            }
        };

        let tag = match map.get("tag") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or(RecordError::InvalidField {
                        field: "tag",
                        expected: "a string",
                    })?
                    .to_string(),
            ),
        };

        Ok(Self {
            surface,
            start: read_pos("start")?,
            end: read_pos("end")?,
            tag,
            sentence_pos: read_pos("sentence_pos")?,
        })
    }

    /// Returns `true` if the mention is tagged as a plain location.
    #[inline]
    pub fn is_location(&self) -> bool {
        self.tag.as_deref() == Some(LOCATION_TAG)
    }
}

/// One sentence of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub pos: usize,
    pub text: String,
}

/// A document with its sentences, recognized mentions, and optional
/// place-of-publication metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub sentences: Vec<Sentence>,
    pub mentions: Vec<Mention>,
    /// Human-readable publication place, e.g. `"Manchester"`.
    #[serde(default)]
    pub place: Option<String>,
    /// Knowledge-base identifier of the publication place.
    #[serde(default)]
    pub place_id: Option<String>,
}

impl Document {
    /// Text of the sentence at `pos`, if present.
    pub fn sentence_text(&self, pos: usize) -> Option<&str> {
        self.sentences
            .iter()
            .find(|s| s.pos == pos)
            .map(|s| s.text.as_str())
    }

    /// Left and right context for the sentence at `pos`: the neighboring
    /// sentences' text, with an empty string where a neighbor is absent.
    pub fn context_for(&self, pos: usize) -> (String, String) {
        let left = pos
            .checked_sub(1)
            .and_then(|p| self.sentence_text(p))
            .unwrap_or_default()
            .to_string();
        let right = self.sentence_text(pos + 1).unwrap_or_default().to_string();
        (left, right)
    }

    /// Stable key for one sentence of this document, `"{id}_{pos}"`.
    pub fn sentence_key(&self, pos: usize) -> String {
        format!("{}_{}", self.id, pos)
    }
}
