//! In-memory implementation of the ContentStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use edgchain_core::Digest;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{ContentStore, InsertResult};

/// In-memory blob store.
///
/// All data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Digest, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the bytes stored under a digest without re-hashing.
    ///
    /// Only useful for simulating corruption or tampering in tests.
    pub async fn tamper(&self, digest: &Digest, data: impl Into<Bytes>) {
        self.blobs.write().await.insert(*digest, data.into());
    }

    /// Drop a blob, simulating an unavailable or garbage-collected entry.
    pub async fn evict(&self, digest: &Digest) -> bool {
        self.blobs.write().await.remove(digest).is_some()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert(&self, data: &[u8]) -> Result<(Digest, InsertResult)> {
        let digest = Digest::of(data);
        let mut blobs = self.blobs.write().await;

        if blobs.contains_key(&digest) {
            return Ok((digest, InsertResult::AlreadyExists));
        }

        blobs.insert(digest, Bytes::copy_from_slice(data));
        debug!(digest = %digest, size = data.len(), "stored blob");
        Ok((digest, InsertResult::Inserted))
    }

    async fn get(&self, digest: &Digest) -> Result<Bytes> {
        self.blobs
            .read()
            .await
            .get(digest)
            .cloned()
            .ok_or(StoreError::NotFound(*digest))
    }

    async fn has(&self, digest: &Digest) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(digest))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.blobs.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();

        let digest = store.put(b"hello").await.unwrap();
        assert_eq!(digest, Digest::of(b"hello"));

        let retrieved = store.get(&digest).await.unwrap();
        assert_eq!(&retrieved[..], b"hello");
        assert!(store.has(&digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryStore::new();

        let (d1, r1) = store.insert(b"same").await.unwrap();
        let (d2, r2) = store.insert(b"same").await.unwrap();

        assert_eq!(d1, d2);
        assert_eq!(r1, InsertResult::Inserted);
        assert_eq!(r2, InsertResult::AlreadyExists);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let store = MemoryStore::new();
        let missing = Digest::of(b"never stored");

        let err = store.get(&missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(d) if d == missing));
    }

    #[tokio::test]
    async fn test_evict() {
        let store = MemoryStore::new();
        let digest = store.put(b"temporary").await.unwrap();

        assert!(store.evict(&digest).await);
        assert!(!store.has(&digest).await.unwrap());
    }
}
