use thiserror::Error;

/// Errors raised by the matching strategies.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A comparison target arrived as something other than a labeled record.
    ///
    /// Strategies only accept a [`VariantRecord`](super::VariantRecord);
    /// a bare string is rejected here instead of being silently wrapped.
    #[error("comparison target must be a labeled record, got {found}")]
    InputShape { found: &'static str },

    /// The labeled record is missing a required field.
    #[error("comparison record is missing the `{field}` field")]
    MissingField { field: &'static str },

    /// A labeled record field holds the wrong type.
    #[error("comparison record field `{field}` must be a string")]
    InvalidField { field: &'static str },

    /// The embedding retrieval service failed.
    #[error("embedding retrieval failed: {message}")]
    Retrieval { message: String },
}
