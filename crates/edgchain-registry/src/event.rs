//! Events emitted by accepted registry mutations.

use edgchain_core::{CommitId, Identity, ProjectId};
use serde::{Deserialize, Serialize};

/// A record of one accepted mutation.
///
/// Exactly one event is emitted per accepted mutation; rejected mutations
/// emit nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    ProjectCreated {
        id: ProjectId,
        creator: Identity,
        genesis_cid: CommitId,
    },
    OwnerAdded {
        id: ProjectId,
        user: Identity,
    },
    OwnerRemoved {
        id: ProjectId,
        user: Identity,
    },
    ContributorAdded {
        id: ProjectId,
        user: Identity,
    },
    ContributorRemoved {
        id: ProjectId,
        user: Identity,
    },
    CommitAccepted {
        id: ProjectId,
        cid: CommitId,
        parent_cid: CommitId,
        author: Identity,
    },
}

impl RegistryEvent {
    /// The project this event belongs to.
    pub fn project(&self) -> ProjectId {
        match self {
            RegistryEvent::ProjectCreated { id, .. }
            | RegistryEvent::OwnerAdded { id, .. }
            | RegistryEvent::OwnerRemoved { id, .. }
            | RegistryEvent::ContributorAdded { id, .. }
            | RegistryEvent::ContributorRemoved { id, .. }
            | RegistryEvent::CommitAccepted { id, .. } => *id,
        }
    }
}
