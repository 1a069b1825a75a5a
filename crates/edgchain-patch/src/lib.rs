//! # EDGChain Patch
//!
//! Turns a sequence of full file-tree snapshots into a chain of binary
//! patches, and replays those patches to rebuild any snapshot.
//!
//! ## Key Types
//!
//! - [`Snapshot`] - Ordered `path -> bytes` map with a canonical digest
//! - [`DiffEngine`] - The pluggable `diff`/`apply` primitive
//! - [`NativeDiffEngine`] - In-process engine with hash-guarded operations
//! - [`GitDiffEngine`] - Engine backed by `git diff --binary` / `git apply`
//!
//! ## Usage
//!
//! ```rust
//! use edgchain_patch::{replay, DiffEngine, NativeDiffEngine, Snapshot};
//!
//! let engine = NativeDiffEngine::new();
//! let v1 = Snapshot::from_files([("main.py", "print('v1')")]).unwrap();
//! let v2 = Snapshot::from_files([("main.py", "print('v2')")]).unwrap();
//!
//! let patches = vec![
//!     engine.diff(&Snapshot::new(), &v1).unwrap(),
//!     engine.diff(&v1, &v2).unwrap(),
//! ];
//! assert_eq!(replay(&engine, Snapshot::new(), &patches).unwrap(), v2);
//! ```

pub mod engine;
pub mod error;
pub mod git;
pub mod native;
pub mod snapshot;

pub use engine::{replay, DiffEngine};
pub use error::{PatchError, Result};
pub use git::GitDiffEngine;
pub use native::{FileOp, NativeDiffEngine, Patch, PATCH_FORMAT_VERSION};
pub use snapshot::{validate_path, Snapshot};
