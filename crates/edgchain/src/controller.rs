//! The version controller: orchestration across store, envelope, patch
//! engine and registry.
//!
//! Committing a version runs: reconstruct latest → diff → verify → encrypt →
//! store → register. Registration is a signed transaction from the author's
//! keypair. No lock is held between steps; the registry's parent check
//! alone decides which of several concurrent commits wins. Blobs written
//! by a losing commit stay in the store as harmless orphans.

use std::sync::Arc;

use edgchain_core::{CommitId, Digest, Keypair, ProjectId};
use edgchain_envelope::{
    decrypt_patch, encrypt_patch, generate_dek, RecipientEntry, VersionManifest, WrappedDek,
    X25519PublicKey, X25519StaticSecret,
};
use edgchain_patch::{replay, DiffEngine, PatchError, Snapshot};
use edgchain_registry::{CommitRecord, Mutation, Registry, Transaction};
use edgchain_store::ContentStore;
use tracing::{debug, info, warn};

use crate::error::{ControllerError, Result};

/// Configuration for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Attempts made by `commit_with_retry`, including the first.
    pub max_commit_attempts: u32,
    /// Check that every reconstructed snapshot hashes to its commit id.
    pub verify_reconstruction: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            verify_reconstruction: true,
        }
    }
}

/// Outcome of an accepted commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub project: ProjectId,
    pub cid: CommitId,
    /// Equal to `cid` for a genesis commit.
    pub parent: CommitId,
    /// Digest of the version manifest in the content store.
    pub manifest: Digest,
    /// Attempts used, starting at 1.
    pub attempts: u32,
}

/// Commits and reconstructs encrypted project versions.
pub struct VersionController<S, D> {
    registry: Arc<Registry>,
    store: Arc<S>,
    engine: Arc<D>,
    config: ControllerConfig,
}

impl<S, D> VersionController<S, D>
where
    S: ContentStore + 'static,
    D: DiffEngine + 'static,
{
    /// Create a controller over a shared registry and store.
    pub fn new(registry: Arc<Registry>, store: Arc<S>, engine: D, config: ControllerConfig) -> Self {
        Self {
            registry,
            store,
            engine: Arc::new(engine),
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &D {
        &self.engine
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commit Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a project whose genesis commit is `genesis`, owned by
    /// `creator`.
    ///
    /// The genesis envelope holds the diff from the empty snapshot.
    pub async fn create_project(
        &self,
        id: ProjectId,
        genesis: &Snapshot,
        recipients: &[X25519PublicKey],
        creator: &Keypair,
    ) -> Result<CommitReceipt> {
        let patch = self.diff(Snapshot::new(), genesis.clone()).await?;
        let manifest = self.seal_and_store(&patch, recipients).await?;
        let cid = genesis.commit_id()?;

        let tx = Transaction::sign(
            creator,
            Mutation::CreateProject {
                id,
                genesis_cid: cid,
                envelope: Some(manifest),
            },
        )?;
        self.registry.submit(&tx).await?;

        info!(
            project = %id,
            cid = %cid,
            creator = %tx.caller,
            files = genesis.len(),
            "genesis committed"
        );
        Ok(CommitReceipt {
            project: id,
            cid,
            parent: cid,
            manifest,
            attempts: 1,
        })
    }

    /// Commit `snapshot` as the next version, in a single attempt.
    ///
    /// `key` must open the existing versions; the new version is readable
    /// by `recipients`. Fails with a stale-parent registry error if another
    /// commit lands first.
    pub async fn commit_new_version(
        &self,
        id: ProjectId,
        snapshot: &Snapshot,
        recipients: &[X25519PublicKey],
        author: &Keypair,
        key: &X25519StaticSecret,
    ) -> Result<CommitReceipt> {
        self.try_commit(id, snapshot, recipients, author, key, 1)
            .await
    }

    /// Like [`commit_new_version`](Self::commit_new_version), but rebases
    /// and retries on a stale parent, up to `max_commit_attempts` times.
    pub async fn commit_with_retry(
        &self,
        id: ProjectId,
        snapshot: &Snapshot,
        recipients: &[X25519PublicKey],
        author: &Keypair,
        key: &X25519StaticSecret,
    ) -> Result<CommitReceipt> {
        let max = self.config.max_commit_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self
                .try_commit(id, snapshot, recipients, author, key, attempt)
                .await
            {
                Err(e) if e.is_retryable() && attempt < max => {
                    warn!(project = %id, attempt, error = %e, "commit raced, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_commit(
        &self,
        id: ProjectId,
        snapshot: &Snapshot,
        recipients: &[X25519PublicKey],
        author: &Keypair,
        key: &X25519StaticSecret,
        attempt: u32,
    ) -> Result<CommitReceipt> {
        let parent = self.registry.get_latest_cid(&id).await?;
        let base = self.reconstruct(id, &parent, key).await?;

        let patch = self.diff(base, snapshot.clone()).await?;
        let manifest = self.seal_and_store(&patch, recipients).await?;
        let cid = snapshot.commit_id()?;

        let tx = Transaction::sign(
            author,
            Mutation::CommitData {
                id,
                cid,
                parent_cid: parent,
                envelope: Some(manifest),
            },
        )?;
        self.registry.submit(&tx).await?;

        info!(project = %id, cid = %cid, parent = %parent, patch_len = patch.len(), "version committed");
        Ok(CommitReceipt {
            project: id,
            cid,
            parent,
            manifest,
            attempts: attempt,
        })
    }

    /// Diff on a blocking thread. The patch must reproduce `new` from
    /// `base` before anything is stored or registered; a commit whose patch
    /// does not would leave the chain unreadable.
    async fn diff(&self, base: Snapshot, new: Snapshot) -> Result<Vec<u8>> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let patch = engine.diff(&base, &new)?;
            if engine.apply(&base, &patch)? != new {
                return Err(ControllerError::PatchMismatch {
                    engine: engine.name(),
                });
            }
            Ok(patch)
        })
        .await
        .map_err(|e| ControllerError::Task(e.to_string()))?
    }

    /// Encrypt `patch` under a fresh DEK, store ciphertext, wrapped DEKs and
    /// manifest, and return the manifest digest.
    async fn seal_and_store(
        &self,
        patch: &[u8],
        recipients: &[X25519PublicKey],
    ) -> Result<Digest> {
        if recipients.is_empty() {
            return Err(ControllerError::NoRecipients);
        }

        let dek = generate_dek();
        let sealed = encrypt_patch(patch, &dek)?;
        let patch_digest = self.store.put(&sealed.ciphertext).await?;

        let mut entries = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let wrapped = WrappedDek::wrap(&dek, recipient)?;
            let wrapped_digest = self.store.put(&wrapped.to_bytes()?).await?;
            entries.push(RecipientEntry {
                recipient: *recipient,
                wrapped_dek: wrapped_digest,
            });
        }

        let manifest = VersionManifest::new(patch_digest, sealed.nonce, sealed.tag, entries);
        let manifest_digest = self.store.put(&manifest.to_bytes()?).await?;

        debug!(
            patch = %patch_digest,
            manifest = %manifest_digest,
            recipients = manifest.recipients.len(),
            "sealed version"
        );
        Ok(manifest_digest)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconstruction
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the snapshot at `target` by replaying every patch from
    /// genesis.
    ///
    /// Any missing, undecryptable or unappliable version aborts the whole
    /// reconstruction with `BrokenChain`.
    pub async fn reconstruct(
        &self,
        id: ProjectId,
        target: &CommitId,
        key: &X25519StaticSecret,
    ) -> Result<Snapshot> {
        let chain = self.registry.history(&id, target).await?;

        let mut patches = Vec::with_capacity(chain.len());
        for record in &chain {
            patches.push(self.open_version(id, record, key).await?);
        }

        let engine = Arc::clone(&self.engine);
        let replayed =
            tokio::task::spawn_blocking(move || replay(engine.as_ref(), Snapshot::new(), &patches))
                .await
                .map_err(|e| ControllerError::Task(e.to_string()))?;

        let snapshot = match replayed {
            Ok(snapshot) => snapshot,
            Err(PatchError::Replay { index, source }) => {
                return Err(ControllerError::BrokenChain {
                    project: id,
                    cid: chain[index].cid,
                    reason: source.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if self.config.verify_reconstruction && snapshot.commit_id()? != *target {
            return Err(ControllerError::BrokenChain {
                project: id,
                cid: *target,
                reason: "reconstructed snapshot does not match commit id".into(),
            });
        }

        debug!(project = %id, cid = %target, versions = chain.len(), "reconstructed");
        Ok(snapshot)
    }

    /// Rebuild the latest snapshot.
    pub async fn reconstruct_latest(
        &self,
        id: ProjectId,
        key: &X25519StaticSecret,
    ) -> Result<Snapshot> {
        let latest = self.registry.get_latest_cid(&id).await?;
        self.reconstruct(id, &latest, key).await
    }

    /// Commits from genesis to latest.
    pub async fn history(&self, id: ProjectId) -> Result<Vec<CommitRecord>> {
        let latest = self.registry.get_latest_cid(&id).await?;
        Ok(self.registry.history(&id, &latest).await?)
    }

    /// Fetch and decrypt one version's patch bytes.
    pub async fn open_version(
        &self,
        id: ProjectId,
        record: &CommitRecord,
        key: &X25519StaticSecret,
    ) -> Result<Vec<u8>> {
        let broken = |reason: String| ControllerError::BrokenChain {
            project: id,
            cid: record.cid,
            reason,
        };

        let manifest_digest = record
            .envelope
            .ok_or_else(|| broken("no envelope recorded".into()))?;

        let manifest_bytes = self
            .store
            .get(&manifest_digest)
            .await
            .map_err(|e| broken(format!("manifest: {}", e)))?;
        let manifest = VersionManifest::from_bytes(&manifest_bytes)
            .map_err(|e| broken(format!("manifest: {}", e)))?;

        let entry = manifest
            .require_recipient(&key.public_key())
            .map_err(|e| broken(e.to_string()))?;

        let wrapped_bytes = self
            .store
            .get(&entry.wrapped_dek)
            .await
            .map_err(|e| broken(format!("wrapped key: {}", e)))?;
        let dek = WrappedDek::from_bytes(&wrapped_bytes)
            .and_then(|wrapped| wrapped.unwrap(key))
            .map_err(|e| broken(format!("wrapped key: {}", e)))?;

        let ciphertext = self
            .store
            .get(&manifest.patch)
            .await
            .map_err(|e| broken(format!("patch blob: {}", e)))?;

        decrypt_patch(&ciphertext, &manifest.nonce, &manifest.tag, &dek)
            .map_err(|e| broken(format!("patch blob: {}", e)))
    }
}
