use thiserror::Error;

/// Errors raised while validating externally produced mention records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record arrived as something other than a JSON object.
    #[error("mention record must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// A required field is absent.
    #[error("mention record is missing the `{field}` field")]
    MissingField { field: &'static str },

    /// A field holds the wrong type.
    #[error("mention record field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}
