//! Gazetteer resource error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading gazetteer-backed resources.
///
/// All variants are fatal at startup: an absent or malformed resource means
/// the engine cannot produce meaningful candidates.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource file could not be read.
    #[error("failed to read resource {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resource file is not valid JSON of the expected shape.
    #[error("malformed resource {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A coordinate entry did not decode to a `[latitude, longitude]` pair.
    #[error("coordinate entry for '{id}' must be a [latitude, longitude] pair")]
    InvalidCoordinate { id: String },
}
