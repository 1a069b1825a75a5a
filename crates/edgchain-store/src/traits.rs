//! ContentStore trait: the abstract interface for blob persistence.
//!
//! This trait keeps the version controller storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests). An IPFS client would
//! be a third implementation behind the same two operations.

use async_trait::async_trait;
use bytes::Bytes;
use edgchain_core::Digest;

use crate::error::Result;

/// Result of inserting a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Blob was stored for the first time.
    Inserted,
    /// Identical content was already present (idempotent, not an error).
    AlreadyExists,
}

/// Async interface for a content-addressed blob store.
///
/// Keys are always `Digest::of(bytes)`; callers never choose them.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob, returning its digest and whether it was new.
    async fn insert(&self, data: &[u8]) -> Result<(Digest, InsertResult)>;

    /// Fetch a blob by digest.
    ///
    /// Fails with `StoreError::NotFound` if the digest is unknown.
    async fn get(&self, digest: &Digest) -> Result<Bytes>;

    /// Check whether a blob exists.
    async fn has(&self, digest: &Digest) -> Result<bool>;

    /// Number of distinct blobs held.
    async fn count(&self) -> Result<usize>;

    /// Store a blob and return its digest.
    async fn put(&self, data: &[u8]) -> Result<Digest> {
        let (digest, _) = self.insert(data).await?;
        Ok(digest)
    }
}
