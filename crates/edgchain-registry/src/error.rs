//! Error types for the registry.
//!
//! Every error is an atomic rejection: a failed mutation leaves the
//! registry exactly as it was and emits no event.

use edgchain_core::{CommitId, Identity, ProjectId};
use thiserror::Error;

use crate::project::Role;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A project with this id already exists.
    #[error("project already exists: {0}")]
    DuplicateProject(ProjectId),

    /// No project with this id.
    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),

    /// The caller lacks the role this mutation requires.
    #[error("{caller} is not permitted to {action} on {project}")]
    Unauthorized {
        project: ProjectId,
        caller: Identity,
        action: &'static str,
    },

    /// The declared parent is no longer the latest commit.
    #[error("stale parent on {project}: declared {declared}, latest is {latest}")]
    StaleParent {
        project: ProjectId,
        declared: CommitId,
        latest: CommitId,
    },

    /// The commit id is already part of this project's history.
    #[error("commit {cid} already exists in {project}")]
    DuplicateCommit { project: ProjectId, cid: CommitId },

    /// The commit id is not part of this project's history.
    #[error("unknown commit {cid} in {project}")]
    UnknownCommit { project: ProjectId, cid: CommitId },

    /// Removing this owner would leave the project without owners.
    #[error("cannot remove the last owner of {0}")]
    LastOwner(ProjectId),

    /// The user already holds the role.
    #[error("{user} is already a {role} of {project}")]
    AlreadyMember {
        project: ProjectId,
        user: Identity,
        role: Role,
    },

    /// The user does not hold the role.
    #[error("{user} is not a {role} of {project}")]
    NotMember {
        project: ProjectId,
        user: Identity,
        role: Role,
    },

    /// A signed transaction failed verification.
    #[error("invalid transaction signature")]
    InvalidSignature,

    /// A signed transaction was already accepted once.
    #[error("transaction already submitted")]
    ReplayedTransaction,

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl RegistryError {
    /// True for errors a caller can resolve by rebasing and retrying.
    pub fn is_stale_parent(&self) -> bool {
        matches!(self, RegistryError::StaleParent { .. })
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
