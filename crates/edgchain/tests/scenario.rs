//! End-to-end scenarios over a shared registry and store.

use std::sync::Arc;

use anyhow::Result;
use edgchain::registry::RegistryEvent;
use edgchain::store::{ContentStore, MemoryStore};
use edgchain::{
    ControllerConfig, ControllerError, NativeDiffEngine, RegistryError, VersionController,
};
use edgchain_testkit::{demo_project_id, demo_v1, demo_v2, demo_v3, TestFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn controller(f: &TestFixture) -> VersionController<MemoryStore, NativeDiffEngine> {
    VersionController::new(
        Arc::clone(&f.registry),
        Arc::clone(&f.store),
        NativeDiffEngine::new(),
        ControllerConfig::default(),
    )
}

#[tokio::test]
async fn genesis_then_two_commits_by_owner_and_contributor() -> Result<()> {
    init_tracing();
    let f = TestFixture::new();
    let c = controller(&f);
    let id = demo_project_id();
    let owner = f.owner.identity();
    let contributor = f.contributor.identity();

    let g = c
        .create_project(id, &demo_v1(), &f.recipients(), &f.owner.keypair)
        .await?;
    f.registry.add_contributor(&owner, id, contributor).await?;

    let c1 = c
        .commit_new_version(
            id,
            &demo_v2(),
            &f.recipients(),
            &f.contributor.keypair,
            &f.contributor.key,
        )
        .await?;
    let c2 = c
        .commit_new_version(id, &demo_v3(), &f.recipients(), &f.owner.keypair, &f.owner.key)
        .await?;

    assert_eq!(f.registry.get_genesis_cid(&id).await?, g.cid);
    assert_eq!(f.registry.get_latest_cid(&id).await?, c2.cid);
    assert_eq!(f.registry.get_parent_cid(&id, &c2.cid).await?, c1.cid);
    assert_eq!(f.registry.get_parent_cid(&id, &c1.cid).await?, g.cid);
    assert_eq!(f.registry.get_parent_cid(&id, &g.cid).await?, g.cid);

    assert_eq!(c.reconstruct(id, &c2.cid, &f.contributor.key).await?, demo_v3());
    assert_eq!(c.reconstruct(id, &c1.cid, &f.owner.key).await?, demo_v2());

    let history = c.history(id).await?;
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].author, contributor);
    assert_eq!(history[2].height, 2);

    let events = f.registry.events_for(&id).await;
    assert!(matches!(events[0], RegistryEvent::ProjectCreated { .. }));
    assert!(matches!(events[1], RegistryEvent::ContributorAdded { .. }));
    assert!(matches!(
        events[2],
        RegistryEvent::CommitAccepted { cid, .. } if cid == c1.cid
    ));
    assert!(matches!(
        events[3],
        RegistryEvent::CommitAccepted { cid, .. } if cid == c2.cid
    ));

    // Three versions, each with ciphertext, two wrapped keys and a manifest.
    assert_eq!(f.store.count().await?, 12);
    Ok(())
}

#[tokio::test]
async fn outsider_commit_rejected_and_latest_unchanged() -> Result<()> {
    init_tracing();
    let f = TestFixture::new();
    let c = controller(&f);
    let id = demo_project_id();

    let g = c
        .create_project(id, &demo_v1(), &f.recipients(), &f.owner.keypair)
        .await?;

    let err = c
        .commit_new_version(
            id,
            &demo_v2(),
            &f.recipients(),
            &f.outsider.keypair,
            &f.owner.key,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Registry(RegistryError::Unauthorized { .. })
    ));
    assert_eq!(f.registry.get_latest_cid(&id).await?, g.cid);
    assert_eq!(c.reconstruct_latest(id, &f.owner.key).await?, demo_v1());
    Ok(())
}

#[tokio::test]
async fn removed_contributor_loses_commit_rights() -> Result<()> {
    init_tracing();
    let f = TestFixture::new();
    let c = controller(&f);
    let id = demo_project_id();
    let owner = f.owner.identity();
    let contributor = f.contributor.identity();

    c.create_project(id, &demo_v1(), &f.recipients(), &f.owner.keypair)
        .await?;
    f.registry.add_contributor(&owner, id, contributor).await?;
    f.registry
        .remove_contributor(&owner, id, contributor)
        .await?;

    let result = c
        .commit_new_version(
            id,
            &demo_v2(),
            &f.recipients(),
            &f.contributor.keypair,
            &f.contributor.key,
        )
        .await;
    assert!(matches!(
        result,
        Err(ControllerError::Registry(RegistryError::Unauthorized { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn recipient_set_can_change_between_versions() -> Result<()> {
    init_tracing();
    let f = TestFixture::new();
    let c = controller(&f);
    let id = demo_project_id();
    let owner = &f.owner.keypair;

    c.create_project(id, &demo_v1(), &f.recipients(), owner)
        .await?;
    // v2 is sealed for the owner only.
    let c1 = c
        .commit_new_version(id, &demo_v2(), &[f.owner.public_key()], owner, &f.owner.key)
        .await?;

    assert_eq!(c.reconstruct_latest(id, &f.owner.key).await?, demo_v2());
    match c.reconstruct_latest(id, &f.contributor.key).await {
        Err(ControllerError::BrokenChain { cid, .. }) => assert_eq!(cid, c1.cid),
        other => panic!("expected BrokenChain, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unknown_project_is_registry_error() {
    init_tracing();
    let f = TestFixture::new();
    let c = controller(&f);

    assert!(matches!(
        c.reconstruct_latest(demo_project_id(), &f.owner.key).await,
        Err(ControllerError::Registry(RegistryError::UnknownProject(_)))
    ));
}
