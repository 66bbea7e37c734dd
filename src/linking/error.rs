use thiserror::Error;

/// Errors raised while disambiguating candidates into predictions.
#[derive(Debug, Error)]
pub enum LinkingError {
    /// The delegated scorer failed outright.
    ///
    /// Scoped to one document: the caller marks that document failed and
    /// continues with the rest of the batch.
    #[error("external disambiguation model failed: {message}")]
    ExternalModel { message: String },

    /// The delegated scorer returned output that cannot be joined back onto
    /// the document's mentions.
    #[error("external model response is malformed: {reason}")]
    MalformedResponse { reason: String },

    /// The distance strategy was invoked without a coordinate index.
    #[error("coordinate resources have not been loaded")]
    CoordinatesNotLoaded,

    /// Re-joining predictions onto the original rows found diverging counts.
    #[error("prediction rows diverged: {expected} rows but {actual} predictions")]
    ResultCountMismatch { expected: usize, actual: usize },
}
