use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::MatchError;

/// Labeled comparison target for the pairwise string strategies.
///
/// Gazetteer variants reach the scoring functions wrapped in this record
/// rather than as bare strings. When the record arrives from a JSON
/// boundary, use [`VariantRecord::from_value`]; it rejects bare strings and
/// other unlabeled shapes with [`MatchError::InputShape`] instead of
/// coercing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// The gazetteer surface variant to compare against.
    pub variant: String,
}

impl VariantRecord {
    /// Wraps an in-memory variant.
    #[inline]
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
        }
    }

    /// Validates a loosely-shaped JSON value into a record.
    pub fn from_value(value: &Value) -> Result<Self, MatchError> {
        let map = match value {
            Value::Object(map) => map,
            Value::String(_) => return Err(MatchError::InputShape { found: "bare string" }),
            Value::Array(_) => return Err(MatchError::InputShape { found: "array" }),
            Value::Null => return Err(MatchError::InputShape { found: "null" }),
            Value::Bool(_) => return Err(MatchError::InputShape { found: "boolean" }),
            Value::Number(_) => return Err(MatchError::InputShape { found: "number" }),
        };

        let variant = map
            .get("variant")
            .ok_or(MatchError::MissingField { field: "variant" })?
            .as_str()
            .ok_or(MatchError::InvalidField { field: "variant" })?;

        Ok(Self::new(variant))
    }
}
