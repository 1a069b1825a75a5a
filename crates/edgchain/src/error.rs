//! Error types for the version controller.

use edgchain_core::{CommitId, CoreError, ProjectId};
use edgchain_envelope::EnvelopeError;
use edgchain_patch::PatchError;
use edgchain_registry::RegistryError;
use edgchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Registry rejected the mutation or query.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Envelope error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Patch error.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// Core primitive error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A version on the path to the target could not be fetched, opened or
    /// applied. Reconstruction is aborted as a whole.
    #[error("broken chain in {project} at {cid}: {reason}")]
    BrokenChain {
        project: ProjectId,
        cid: CommitId,
        reason: String,
    },

    /// The engine's patch does not turn the base into the new snapshot.
    #[error("{engine} engine produced a patch that does not reproduce the snapshot")]
    PatchMismatch { engine: &'static str },

    /// A version must be readable by at least one recipient.
    #[error("no recipients given")]
    NoRecipients,

    /// A blocking task failed to complete.
    #[error("task failed: {0}")]
    Task(String),
}

impl ControllerError {
    /// True if rebasing onto the new latest commit and retrying can succeed.
    ///
    /// Only a stale parent qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ControllerError::Registry(e) if e.is_stale_parent())
    }
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
