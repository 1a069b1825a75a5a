//! The controller over the SQLite store and the git diff engine.

use std::sync::Arc;

use anyhow::Result;
use edgchain::store::SqliteStore;
use edgchain::{
    ControllerConfig, GitDiffEngine, NativeDiffEngine, Registry, Snapshot, VersionController,
};
use edgchain_testkit::{demo_project_id, demo_v1, demo_v2, demo_v3, Participant};
use tempfile::TempDir;

#[tokio::test]
async fn sqlite_store_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("blobs.db");
    let registry = Arc::new(Registry::default());
    let owner = Participant::from_seed(1);
    let id = demo_project_id();

    {
        let c = VersionController::new(
            Arc::clone(&registry),
            Arc::new(SqliteStore::open(&db)?),
            NativeDiffEngine::new(),
            ControllerConfig::default(),
        );
        c.create_project(id, &demo_v1(), &[owner.public_key()], &owner.keypair)
            .await?;
        c.commit_new_version(
            id,
            &demo_v2(),
            &[owner.public_key()],
            &owner.keypair,
            &owner.key,
        )
        .await?;
    }

    let reopened = VersionController::new(
        registry,
        Arc::new(SqliteStore::open(&db)?),
        NativeDiffEngine::new(),
        ControllerConfig::default(),
    );
    assert_eq!(reopened.reconstruct_latest(id, &owner.key).await?, demo_v2());
    Ok(())
}

#[tokio::test]
async fn git_engine_end_to_end() -> Result<()> {
    let engine = GitDiffEngine::new();
    if !engine.is_available() {
        return Ok(());
    }

    let owner = Participant::from_seed(1);
    let id = demo_project_id();
    let c = VersionController::new(
        Arc::new(Registry::default()),
        Arc::new(SqliteStore::open_memory()?),
        engine,
        ControllerConfig::default(),
    );
    let recipients = [owner.public_key()];

    let g = c
        .create_project(id, &demo_v1(), &recipients, &owner.keypair)
        .await?;
    c.commit_new_version(id, &demo_v2(), &recipients, &owner.keypair, &owner.key)
        .await?;
    c.commit_new_version(id, &demo_v3(), &recipients, &owner.keypair, &owner.key)
        .await?;

    assert_eq!(c.reconstruct(id, &g.cid, &owner.key).await?, demo_v1());
    assert_eq!(c.reconstruct_latest(id, &owner.key).await?, demo_v3());
    Ok(())
}

#[tokio::test]
async fn git_engine_keeps_line_endings_under_gitattributes() -> Result<()> {
    let engine = GitDiffEngine::new();
    if !engine.is_available() {
        return Ok(());
    }

    let owner = Participant::from_seed(1);
    let id = demo_project_id();
    let c = VersionController::new(
        Arc::new(Registry::default()),
        Arc::new(SqliteStore::open_memory()?),
        engine,
        ControllerConfig::default(),
    );
    let recipients = [owner.public_key()];

    let v1 = Snapshot::from_files([
        (".gitattributes", b"* text=auto\n".to_vec()),
        ("win.txt", b"line one\r\nline two\r\n".to_vec()),
    ])?;
    let mut v2 = v1.clone();
    v2.insert("win.txt", b"line one\r\nline 2\r\n".to_vec())?;

    c.create_project(id, &v1, &recipients, &owner.keypair)
        .await?;
    c.commit_new_version(id, &v2, &recipients, &owner.keypair, &owner.key)
        .await?;

    let latest = c.reconstruct_latest(id, &owner.key).await?;
    assert_eq!(latest.get("win.txt"), Some(&b"line one\r\nline 2\r\n"[..]));
    assert_eq!(latest, v2);
    Ok(())
}
