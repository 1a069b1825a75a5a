//! Schema migrations for the SQLite blob store.
//!
//! The schema version lives in `PRAGMA user_version`. `MIGRATIONS[n]`
//! upgrades a database from version `n` to `n + 1`; all pending steps run
//! in one transaction.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Ordered schema steps.
const MIGRATIONS: &[&str] = &[
    // v1: content-addressed blobs.
    r#"
    CREATE TABLE blobs (
        digest BLOB PRIMARY KEY CHECK (length(digest) = 32),
        data BLOB NOT NULL,
        size INTEGER NOT NULL,
        stored_at INTEGER NOT NULL
    );
    CREATE INDEX idx_blobs_stored_at ON blobs(stored_at);
    "#,
];

/// Schema version after all migrations.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to `CURRENT_VERSION`. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            found, CURRENT_VERSION
        )));
    }
    if found == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &MIGRATIONS[found as usize..] {
        tx.execute_batch(step)?;
    }
    tx.pragma_update(None, "user_version", CURRENT_VERSION)?;
    tx.commit()?;

    info!(from = found, to = CURRENT_VERSION, "migrated blob store schema");
    Ok(())
}

/// Unix time in milliseconds; 0 if the clock reads before the epoch.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
