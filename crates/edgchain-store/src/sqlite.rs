//! SQLite implementation of the ContentStore trait.
//!
//! This is the persistent backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use edgchain_core::Digest;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{ContentStore, InsertResult};

/// SQLite-based blob store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert(&self, data: &[u8]) -> Result<(Digest, InsertResult)> {
        let digest = Digest::of(data);
        let data = data.to_vec();

        let result = self
            .with_conn(move |conn| {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO blobs (digest, data, size, stored_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        digest.as_bytes().as_slice(),
                        data.as_slice(),
                        data.len() as i64,
                        now_millis()
                    ],
                )?;

                Ok(if inserted == 1 {
                    InsertResult::Inserted
                } else {
                    InsertResult::AlreadyExists
                })
            })
            .await?;

        if result == InsertResult::Inserted {
            debug!(digest = %digest, "stored blob");
        }
        Ok((digest, result))
    }

    async fn get(&self, digest: &Digest) -> Result<Bytes> {
        let expected = *digest;

        let data: Option<Vec<u8>> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT data FROM blobs WHERE digest = ?1",
                    params![expected.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        let data = data.ok_or(StoreError::NotFound(expected))?;

        let actual = Digest::of(&data);
        if actual != expected {
            warn!(expected = %expected, actual = %actual, "blob failed digest check");
            return Err(StoreError::Corrupted { expected, actual });
        }

        Ok(Bytes::from(data))
    }

    async fn has(&self, digest: &Digest) -> Result<bool> {
        let digest = *digest;

        self.with_conn(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM blobs WHERE digest = ?1)",
                params![digest.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
            Ok(n as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteStore::open_memory().unwrap();

        let digest = store.put(b"encrypted patch").await.unwrap();
        assert_eq!(digest, Digest::of(b"encrypted patch"));

        let bytes = store.get(&digest).await.unwrap();
        assert_eq!(&bytes[..], b"encrypted patch");
    }

    #[tokio::test]
    async fn test_idempotent_insert() {
        let store = SqliteStore::open_memory().unwrap();

        let (_, r1) = store.insert(b"blob").await.unwrap();
        let (_, r2) = store.insert(b"blob").await.unwrap();

        assert_eq!(r1, InsertResult::Inserted);
        assert_eq!(r2, InsertResult::AlreadyExists);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_blob() {
        let store = SqliteStore::open_memory().unwrap();
        let missing = Digest::of(b"absent");

        assert!(!store.has(&missing).await.unwrap());
        assert!(matches!(
            store.get(&missing).await,
            Err(StoreError::NotFound(d)) if d == missing
        ));
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let digest = store.put(b"original").await.unwrap();

        store
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE blobs SET data = ?1 WHERE digest = ?2",
                    params![b"tampered".as_slice(), digest.as_bytes().as_slice()],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            store.get(&digest).await,
            Err(StoreError::Corrupted { expected, .. }) if expected == digest
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.db");

        let digest = {
            let store = SqliteStore::open(&path).unwrap();
            store.put(b"durable").await.unwrap()
        };

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(&reopened.get(&digest).await.unwrap()[..], b"durable");
    }
}
