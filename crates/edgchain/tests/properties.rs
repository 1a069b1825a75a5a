//! Properties over random snapshot histories.

use std::collections::HashSet;
use std::sync::Arc;

use edgchain::envelope::X25519StaticSecret;
use edgchain::store::MemoryStore;
use edgchain::{
    CommitId, ControllerConfig, DiffEngine, NativeDiffEngine, ProjectId, Registry, Snapshot,
    VersionController,
};
use edgchain_testkit::generators::{keypair, snapshot_history, snapshot_pair};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_committed_version_reconstructs(
        author in keypair(),
        history in snapshot_history(6, 6, 48),
    ) {
        let key = X25519StaticSecret::from_bytes([7; 32]);
        let recipients = [key.public_key()];
        let id = ProjectId::from_name("history");
        let c = VersionController::new(
            Arc::new(Registry::default()),
            Arc::new(MemoryStore::new()),
            NativeDiffEngine::new(),
            ControllerConfig::default(),
        );

        runtime().block_on(async {
            let mut seen = HashSet::new();
            let mut committed: Vec<(CommitId, &Snapshot)> = Vec::new();

            for (k, snapshot) in history.iter().enumerate() {
                // A snapshot already in the chain would be a duplicate commit.
                if !seen.insert(snapshot.commit_id().unwrap()) {
                    continue;
                }
                let receipt = if k == 0 {
                    c.create_project(id, snapshot, &recipients, &author).await
                } else {
                    c.commit_new_version(id, snapshot, &recipients, &author, &key).await
                }
                .unwrap();
                committed.push((receipt.cid, snapshot));
            }

            let chain = c.history(id).await.unwrap();
            prop_assert_eq!(chain.len(), committed.len());
            for (record, (cid, snapshot)) in chain.iter().zip(&committed) {
                prop_assert_eq!(record.cid, *cid);
                prop_assert_eq!(&c.reconstruct(id, cid, &key).await.unwrap(), *snapshot);
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_native_patch_reproduces_successor((base, next) in snapshot_pair(8, 64)) {
        let engine = NativeDiffEngine::new();
        let patch = engine.diff(&base, &next).unwrap();
        prop_assert_eq!(engine.apply(&base, &patch).unwrap(), next);
    }
}
