//! # EDGChain Registry
//!
//! The authoritative, append-only record of projects, their owners and
//! contributors, and each project's linear commit chain.
//!
//! ## Overview
//!
//! The registry stores only 32-byte digests. Patch ciphertext and wrapped
//! keys live in the content store; the registry optionally records the
//! digest of each commit's version manifest so the chain alone locates
//! every envelope.
//!
//! ## Rules
//!
//! - A project id is created exactly once; its creator is the first owner
//! - Only owners manage owners and contributors
//! - Owners and contributors may commit
//! - A commit's parent must be the current latest commit, so concurrent
//!   commits on the same parent have exactly one winner
//! - Commit ids are unique within a project; the genesis id counts
//!
//! ## Usage
//!
//! ```rust
//! use edgchain_core::{CommitId, Keypair, ProjectId};
//! use edgchain_registry::Registry;
//!
//! # tokio_test_block(async {
//! let registry = Registry::default();
//! let owner = Keypair::generate().identity();
//! let project = ProjectId::from_name("demo");
//! let genesis = CommitId::from_bytes([1; 32]);
//!
//! registry.create_project(&owner, project, genesis).await.unwrap();
//! registry
//!     .commit_data(&owner, project, CommitId::from_bytes([2; 32]), genesis)
//!     .await
//!     .unwrap();
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod event;
pub mod project;
pub mod registry;
pub mod transaction;

pub use error::{RegistryError, Result};
pub use event::RegistryEvent;
pub use project::{CommitRecord, ProjectState, Role};
pub use registry::{Registry, RegistryConfig};
pub use transaction::{Mutation, Transaction};
