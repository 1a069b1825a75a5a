//! # EDGChain Store
//!
//! Content-addressed blob storage. Blobs are keyed by the SHA-256 digest of
//! their bytes, so identical content always lands on the same key and
//! concurrent writers of the same content converge without conflict.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait for `put`/`get` by digest
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use edgchain_store::{ContentStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("blobs.db").unwrap();
//!     let digest = store.put(b"patch bytes").await.unwrap();
//!     let bytes = store.get(&digest).await.unwrap();
//!     assert_eq!(&bytes[..], b"patch bytes");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: storing the same bytes twice is a no-op
//! - **Append-only**: there is no delete; unreferenced blobs are harmless orphans
//! - **Verified reads**: the SQLite backend re-hashes blobs on read

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ContentStore, InsertResult};
