//! Error types for the patch engine.

use thiserror::Error;

/// Errors that can occur while diffing, applying or replaying patches.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patch does not apply cleanly to the given base.
    #[error("patch does not apply: {0}")]
    PatchApplyError(String),

    /// A snapshot path is not a clean relative path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The patch bytes could not be decoded.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),

    /// Replay failed at a given step.
    #[error("replay failed at patch {index}: {source}")]
    Replay {
        index: usize,
        #[source]
        source: Box<PatchError>,
    },

    /// The git executable failed or is missing.
    #[error("git error: {0}")]
    Git(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Filesystem error in a scratch directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for patch operations.
pub type Result<T> = std::result::Result<T, PatchError>;
