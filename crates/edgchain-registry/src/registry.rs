//! The commit-chain registry.
//!
//! The project table sits behind a `RwLock`; each project has its own
//! `Mutex`, so commits to one project serialize while different projects
//! proceed independently. Events are appended while the project lock is
//! held, which keeps per-project event order identical to mutation order.
//! Appending never yields, so a cancelled caller cannot leave a mutation
//! without its event.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use edgchain_core::{CommitId, Digest, Identity, ProjectId};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::event::RegistryEvent;
use crate::project::{CommitRecord, ProjectState};
use crate::transaction::{Mutation, Transaction};

/// Configuration for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Permit removing the last owner of a project.
    pub allow_ownerless_projects: bool,
    /// Buffer size of the live event channel.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_ownerless_projects: false,
            event_capacity: 1024,
        }
    }
}

/// Authoritative record of projects, permissions and commit chains.
pub struct Registry {
    config: RegistryConfig,
    projects: RwLock<HashMap<ProjectId, Arc<Mutex<ProjectState>>>>,
    events: parking_lot::Mutex<Vec<RegistryEvent>>,
    seen_transactions: Mutex<HashSet<Digest>>,
    notify: broadcast::Sender<RegistryEvent>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        let (notify, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            projects: RwLock::new(HashMap::new()),
            events: parking_lot::Mutex::new(Vec::new()),
            seen_transactions: Mutex::new(HashSet::new()),
            notify,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    async fn project(&self, id: &ProjectId) -> Result<Arc<Mutex<ProjectState>>> {
        self.projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(RegistryError::UnknownProject(*id))
    }

    fn emit(&self, event: RegistryEvent) {
        self.events.lock().push(event.clone());
        // No subscribers is not an error.
        let _ = self.notify.send(event);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Project Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new project; `caller` becomes its first owner.
    pub async fn create_project(
        &self,
        caller: &Identity,
        id: ProjectId,
        genesis_cid: CommitId,
    ) -> Result<()> {
        self.create(caller, id, genesis_cid, None).await
    }

    /// Register a new project and record the genesis version manifest.
    pub async fn create_project_with_envelope(
        &self,
        caller: &Identity,
        id: ProjectId,
        genesis_cid: CommitId,
        envelope: Digest,
    ) -> Result<()> {
        self.create(caller, id, genesis_cid, Some(envelope)).await
    }

    async fn create(
        &self,
        caller: &Identity,
        id: ProjectId,
        genesis_cid: CommitId,
        envelope: Option<Digest>,
    ) -> Result<()> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&id) {
            debug!(project = %id, "rejected duplicate project");
            return Err(RegistryError::DuplicateProject(id));
        }

        let state = ProjectState::new(id, genesis_cid, *caller, envelope);
        projects.insert(id, Arc::new(Mutex::new(state)));

        info!(project = %id, creator = %caller, genesis = %genesis_cid, "project created");
        self.emit(RegistryEvent::ProjectCreated {
            id,
            creator: *caller,
            genesis_cid,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role Management
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_owner(&self, caller: &Identity, id: ProjectId, user: Identity) -> Result<()> {
        let project = self.project(&id).await?;
        let mut state = project.lock().await;
        state.add_owner(caller, user)?;

        debug!(project = %id, user = %user, "owner added");
        self.emit(RegistryEvent::OwnerAdded { id, user });
        Ok(())
    }

    /// Remove an owner. Fails with `LastOwner` when removing the only owner,
    /// unless the registry allows ownerless projects.
    pub async fn remove_owner(
        &self,
        caller: &Identity,
        id: ProjectId,
        user: Identity,
    ) -> Result<()> {
        let project = self.project(&id).await?;
        let mut state = project.lock().await;
        state.remove_owner(caller, &user, self.config.allow_ownerless_projects)?;

        debug!(project = %id, user = %user, "owner removed");
        self.emit(RegistryEvent::OwnerRemoved { id, user });
        Ok(())
    }

    pub async fn add_contributor(
        &self,
        caller: &Identity,
        id: ProjectId,
        user: Identity,
    ) -> Result<()> {
        let project = self.project(&id).await?;
        let mut state = project.lock().await;
        state.add_contributor(caller, user)?;

        debug!(project = %id, user = %user, "contributor added");
        self.emit(RegistryEvent::ContributorAdded { id, user });
        Ok(())
    }

    pub async fn remove_contributor(
        &self,
        caller: &Identity,
        id: ProjectId,
        user: Identity,
    ) -> Result<()> {
        let project = self.project(&id).await?;
        let mut state = project.lock().await;
        state.remove_contributor(caller, &user)?;

        debug!(project = %id, user = %user, "contributor removed");
        self.emit(RegistryEvent::ContributorRemoved { id, user });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commits
    // ─────────────────────────────────────────────────────────────────────────

    /// Append `cid` to the chain. `parent_cid` must equal the latest commit.
    pub async fn commit_data(
        &self,
        caller: &Identity,
        id: ProjectId,
        cid: CommitId,
        parent_cid: CommitId,
    ) -> Result<()> {
        self.commit(caller, id, cid, parent_cid, None).await
    }

    /// Like [`commit_data`](Self::commit_data), also recording the digest of
    /// the version manifest.
    pub async fn commit_data_with_envelope(
        &self,
        caller: &Identity,
        id: ProjectId,
        cid: CommitId,
        parent_cid: CommitId,
        envelope: Digest,
    ) -> Result<()> {
        self.commit(caller, id, cid, parent_cid, Some(envelope)).await
    }

    async fn commit(
        &self,
        caller: &Identity,
        id: ProjectId,
        cid: CommitId,
        parent_cid: CommitId,
        envelope: Option<Digest>,
    ) -> Result<()> {
        let project = self.project(&id).await?;
        let mut state = project.lock().await;

        let height = match state.commit_data(caller, cid, parent_cid, envelope) {
            Ok(record) => record.height,
            Err(e) => {
                debug!(project = %id, cid = %cid, error = %e, "commit rejected");
                return Err(e);
            }
        };

        info!(project = %id, cid = %cid, parent = %parent_cid, author = %caller, height, "commit accepted");
        self.emit(RegistryEvent::CommitAccepted {
            id,
            cid,
            parent_cid,
            author: *caller,
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signed Transactions
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify and apply a signed transaction.
    ///
    /// A transaction id is consumed on first submission, whether or not the
    /// mutation succeeds. Any later submission of the same transaction fails
    /// with `ReplayedTransaction`, so a rejected signature cannot be held
    /// back and replayed once the registry state makes it valid. Callers
    /// retry by signing a new transaction.
    pub async fn submit(&self, tx: &Transaction) -> Result<()> {
        tx.verify()?;
        let tx_id = tx.id()?;

        if !self.seen_transactions.lock().await.insert(tx_id) {
            return Err(RegistryError::ReplayedTransaction);
        }

        let caller = &tx.caller;
        match tx.mutation.clone() {
            Mutation::CreateProject {
                id,
                genesis_cid,
                envelope,
            } => self.create(caller, id, genesis_cid, envelope).await,
            Mutation::AddOwner { id, user } => self.add_owner(caller, id, user).await,
            Mutation::RemoveOwner { id, user } => self.remove_owner(caller, id, user).await,
            Mutation::AddContributor { id, user } => self.add_contributor(caller, id, user).await,
            Mutation::RemoveContributor { id, user } => {
                self.remove_contributor(caller, id, user).await
            }
            Mutation::CommitData {
                id,
                cid,
                parent_cid,
                envelope,
            } => self.commit(caller, id, cid, parent_cid, envelope).await,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_genesis_cid(&self, id: &ProjectId) -> Result<CommitId> {
        Ok(self.project(id).await?.lock().await.genesis())
    }

    pub async fn get_latest_cid(&self, id: &ProjectId) -> Result<CommitId> {
        Ok(self.project(id).await?.lock().await.latest())
    }

    /// Parent of `cid`. The genesis commit is its own parent.
    pub async fn get_parent_cid(&self, id: &ProjectId, cid: &CommitId) -> Result<CommitId> {
        Ok(self.project(id).await?.lock().await.commit(cid)?.parent)
    }

    /// Manifest digest recorded with `cid`, if any.
    pub async fn get_envelope(&self, id: &ProjectId, cid: &CommitId) -> Result<Option<Digest>> {
        Ok(self.project(id).await?.lock().await.commit(cid)?.envelope)
    }

    /// The full record of one commit.
    pub async fn get_commit(&self, id: &ProjectId, cid: &CommitId) -> Result<CommitRecord> {
        Ok(self.project(id).await?.lock().await.commit(cid)?.clone())
    }

    /// Commits from genesis up to and including `cid`.
    pub async fn history(&self, id: &ProjectId, cid: &CommitId) -> Result<Vec<CommitRecord>> {
        self.project(id).await?.lock().await.history(cid)
    }

    pub async fn is_owner(&self, id: &ProjectId, who: &Identity) -> Result<bool> {
        Ok(self.project(id).await?.lock().await.is_owner(who))
    }

    pub async fn is_contributor(&self, id: &ProjectId, who: &Identity) -> Result<bool> {
        Ok(self.project(id).await?.lock().await.is_contributor(who))
    }

    pub async fn can_commit(&self, id: &ProjectId, who: &Identity) -> Result<bool> {
        Ok(self.project(id).await?.lock().await.can_commit(who))
    }

    /// Owners in sorted order.
    pub async fn owners(&self, id: &ProjectId) -> Result<Vec<Identity>> {
        Ok(self.project(id).await?.lock().await.owners())
    }

    /// Contributors in sorted order.
    pub async fn contributors(&self, id: &ProjectId) -> Result<Vec<Identity>> {
        Ok(self.project(id).await?.lock().await.contributors())
    }

    /// All project ids in sorted order.
    pub async fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Every event emitted so far, in emission order.
    pub async fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    /// Events belonging to one project.
    pub async fn events_for(&self, id: &ProjectId) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.project() == *id)
            .cloned()
            .collect()
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.notify.subscribe()
    }
}
