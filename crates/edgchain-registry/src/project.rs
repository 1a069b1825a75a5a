//! Per-project state: roles, pointers and the commit chain.
//!
//! All validation lives here so it can be exercised without the async
//! wrapper. Every method either fully applies a mutation or returns an
//! error with the state untouched.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use edgchain_core::{CommitId, Digest, Identity, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// A permission role within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Contributor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Contributor => f.write_str("contributor"),
        }
    }
}

/// One accepted commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub cid: CommitId,
    /// Equal to `cid` for the genesis commit.
    pub parent: CommitId,
    pub author: Identity,
    /// Digest of the version manifest in the content store, if recorded.
    pub envelope: Option<Digest>,
    /// Position in the chain; genesis is 0.
    pub height: u64,
}

impl CommitRecord {
    pub fn is_genesis(&self) -> bool {
        self.cid == self.parent
    }
}

/// State of a single project.
#[derive(Debug, Clone)]
pub struct ProjectState {
    id: ProjectId,
    genesis: CommitId,
    latest: CommitId,
    owners: BTreeSet<Identity>,
    contributors: BTreeSet<Identity>,
    commits: HashMap<CommitId, CommitRecord>,
}

impl ProjectState {
    /// A new project whose creator is the first owner.
    pub fn new(
        id: ProjectId,
        genesis: CommitId,
        creator: Identity,
        envelope: Option<Digest>,
    ) -> Self {
        let mut commits = HashMap::new();
        commits.insert(
            genesis,
            CommitRecord {
                cid: genesis,
                parent: genesis,
                author: creator,
                envelope,
                height: 0,
            },
        );

        Self {
            id,
            genesis,
            latest: genesis,
            owners: BTreeSet::from([creator]),
            contributors: BTreeSet::new(),
            commits,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn genesis(&self) -> CommitId {
        self.genesis
    }

    pub fn latest(&self) -> CommitId {
        self.latest
    }

    pub fn is_owner(&self, who: &Identity) -> bool {
        self.owners.contains(who)
    }

    pub fn is_contributor(&self, who: &Identity) -> bool {
        self.contributors.contains(who)
    }

    /// Owners may commit without being listed as contributors.
    pub fn can_commit(&self, who: &Identity) -> bool {
        self.is_owner(who) || self.is_contributor(who)
    }

    pub fn owners(&self) -> Vec<Identity> {
        self.owners.iter().copied().collect()
    }

    pub fn contributors(&self) -> Vec<Identity> {
        self.contributors.iter().copied().collect()
    }

    /// Number of commits including genesis.
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn commit(&self, cid: &CommitId) -> Result<&CommitRecord> {
        self.commits
            .get(cid)
            .ok_or(RegistryError::UnknownCommit {
                project: self.id,
                cid: *cid,
            })
    }

    fn require_owner(&self, caller: &Identity, action: &'static str) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(RegistryError::Unauthorized {
                project: self.id,
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role Mutations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_owner(&mut self, caller: &Identity, user: Identity) -> Result<()> {
        self.require_owner(caller, "add owners")?;
        if !self.owners.insert(user) {
            return Err(RegistryError::AlreadyMember {
                project: self.id,
                user,
                role: Role::Owner,
            });
        }
        Ok(())
    }

    pub fn remove_owner(
        &mut self,
        caller: &Identity,
        user: &Identity,
        allow_ownerless: bool,
    ) -> Result<()> {
        self.require_owner(caller, "remove owners")?;
        if !self.owners.contains(user) {
            return Err(RegistryError::NotMember {
                project: self.id,
                user: *user,
                role: Role::Owner,
            });
        }
        if self.owners.len() == 1 && !allow_ownerless {
            return Err(RegistryError::LastOwner(self.id));
        }
        self.owners.remove(user);
        Ok(())
    }

    pub fn add_contributor(&mut self, caller: &Identity, user: Identity) -> Result<()> {
        self.require_owner(caller, "add contributors")?;
        if !self.contributors.insert(user) {
            return Err(RegistryError::AlreadyMember {
                project: self.id,
                user,
                role: Role::Contributor,
            });
        }
        Ok(())
    }

    pub fn remove_contributor(&mut self, caller: &Identity, user: &Identity) -> Result<()> {
        self.require_owner(caller, "remove contributors")?;
        if !self.contributors.remove(user) {
            return Err(RegistryError::NotMember {
                project: self.id,
                user: *user,
                role: Role::Contributor,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commits
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a commit on top of `latest`.
    ///
    /// Checks run in order: authorization, uniqueness, parent freshness.
    /// A cid already in the chain is a duplicate whatever parent it declares.
    pub fn commit_data(
        &mut self,
        caller: &Identity,
        cid: CommitId,
        parent: CommitId,
        envelope: Option<Digest>,
    ) -> Result<&CommitRecord> {
        if !self.can_commit(caller) {
            return Err(RegistryError::Unauthorized {
                project: self.id,
                caller: *caller,
                action: "commit",
            });
        }
        if self.commits.contains_key(&cid) {
            return Err(RegistryError::DuplicateCommit {
                project: self.id,
                cid,
            });
        }
        if parent != self.latest {
            return Err(RegistryError::StaleParent {
                project: self.id,
                declared: parent,
                latest: self.latest,
            });
        }

        let height = self.commits[&parent].height + 1;
        self.commits.insert(
            cid,
            CommitRecord {
                cid,
                parent,
                author: *caller,
                envelope,
                height,
            },
        );
        self.latest = cid;
        Ok(&self.commits[&cid])
    }

    /// Commits from genesis up to and including `cid`.
    pub fn history(&self, cid: &CommitId) -> Result<Vec<CommitRecord>> {
        let mut record = self.commit(cid)?;
        let mut chain = Vec::with_capacity(record.height as usize + 1);

        while !record.is_genesis() {
            chain.push(record.clone());
            record = self.commit(&record.parent)?;
        }
        chain.push(record.clone());

        chain.reverse();
        Ok(chain)
    }
}
