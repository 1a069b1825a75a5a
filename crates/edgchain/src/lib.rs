//! # EDGChain
//!
//! Access-controlled version control over encrypted, content-addressed
//! patches.
//!
//! ## Overview
//!
//! A project is a linear chain of commits anchored in a registry:
//!
//! - **Registry**: project membership (owners, contributors) and the
//!   genesis/latest/parent pointers of every commit
//! - **Content store**: immutable blobs addressed by their SHA-256 digest
//! - **Envelope**: each version's patch is encrypted under a fresh key that
//!   is wrapped for every recipient
//! - **Patch engine**: diffs between snapshots and ordered replay
//!
//! ## Key Concepts
//!
//! - **Commit id**: SHA-256 of the committed snapshot's canonical encoding.
//! - **Stale parent**: a commit must name the current latest as its parent;
//!   of two concurrent commits on the same parent exactly one wins.
//! - **Broken chain**: reconstruction needs every version from genesis and
//!   fails as a whole if any one cannot be fetched, opened or applied.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use edgchain::{ControllerConfig, VersionController};
//! use edgchain::core::{Keypair, ProjectId};
//! use edgchain::envelope::X25519StaticSecret;
//! use edgchain::patch::{NativeDiffEngine, Snapshot};
//! use edgchain::registry::Registry;
//! use edgchain::store::SqliteStore;
//!
//! async fn example() -> edgchain::Result<()> {
//!     let owner = Keypair::generate();
//!     let key = X25519StaticSecret::generate();
//!
//!     let controller = VersionController::new(
//!         Arc::new(Registry::default()),
//!         Arc::new(SqliteStore::open("blobs.db")?),
//!         NativeDiffEngine::new(),
//!         ControllerConfig::default(),
//!     );
//!
//!     let id = ProjectId::from_name("demo");
//!     let mut v1 = Snapshot::new();
//!     v1.insert("main.py", b"print('Version 1')\n".to_vec())?;
//!     controller
//!         .create_project(id, &v1, &[key.public_key()], &owner)
//!         .await?;
//!
//!     let mut v2 = v1.clone();
//!     v2.insert("main.py", b"print('Version 2')\n".to_vec())?;
//!     controller
//!         .commit_new_version(id, &v2, &[key.public_key()], &owner, &key)
//!         .await?;
//!
//!     assert_eq!(controller.reconstruct_latest(id, &key).await?, v2);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `edgchain::core` - Digests, ids, CIDs and signing keys
//! - `edgchain::store` - Content store abstraction, memory and SQLite
//! - `edgchain::envelope` - Patch encryption and key wrapping
//! - `edgchain::patch` - Snapshots and diff engines
//! - `edgchain::registry` - Projects, roles and the commit chain

pub mod controller;
pub mod error;

// Re-export component crates
pub use edgchain_core as core;
pub use edgchain_envelope as envelope;
pub use edgchain_patch as patch;
pub use edgchain_registry as registry;
pub use edgchain_store as store;

// Re-export main types for convenience
pub use controller::{CommitReceipt, ControllerConfig, VersionController};
pub use error::{ControllerError, Result};

// Re-export commonly used types
pub use edgchain_core::{CommitId, Digest, Identity, Keypair, ProjectId};
pub use edgchain_patch::{DiffEngine, GitDiffEngine, NativeDiffEngine, Snapshot};
pub use edgchain_registry::{CommitRecord, Registry, RegistryConfig, RegistryError};
