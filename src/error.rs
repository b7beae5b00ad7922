// Error taxonomy for the rebuild pipeline
// Required-source and store failures are fatal; detail enrichment is not.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the rebuild pipeline
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// A required external source could not be fetched or parsed.
    /// Fatal: the rebuild aborts before any store mutation.
    #[error("source '{name}' unavailable: {cause}")]
    SourceUnavailable { name: String, cause: String },

    /// The optional per-character detail fetch failed.
    /// Recovered locally: the icon degrades to an empty value.
    #[error("detail fetch for '{name}' failed: {cause}")]
    DetailFetchFailed { name: String, cause: String },

    /// The file-reset policy could not delete the store file, most likely
    /// because another process holds it open. Raised before any destructive
    /// action, so the original file is left untouched.
    #[error("store file {path:?} is locked: {cause}")]
    StoreLocked {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// Two characters with the same name reached the commit. The unique-name
    /// invariant makes this impossible when filtering and reconciliation
    /// behave, so it signals an upstream data-quality problem.
    #[error("duplicate character name in rebuild batch: {0}")]
    DuplicateCharacter(String),

    /// Store operation error (wraps rusqlite::Error)
    #[error("store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration loading or validation error
    #[error("configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Build a `SourceUnavailable` for a named source from any displayable cause.
    pub fn source_unavailable(name: &str, cause: impl std::fmt::Display) -> Self {
        TrackerError::SourceUnavailable {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }
}
