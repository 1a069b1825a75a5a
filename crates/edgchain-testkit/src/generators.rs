//! Proptest generators for property-based testing.

use proptest::prelude::*;

use edgchain_core::Keypair;
use edgchain_patch::Snapshot;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a valid relative path of one to three segments.
pub fn path() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}(/[a-z][a-z0-9_]{0,7}){0,2}(\\.[a-z]{1,3})?".prop_map(String::from)
}

/// Generate file content of specified max length.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a snapshot with up to `max_files` files.
pub fn snapshot(max_files: usize, max_len: usize) -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_map(path(), content(max_len), 0..=max_files).prop_map(|files| {
        let mut snapshot = Snapshot::new();
        for (path, content) in files {
            // Generated paths always validate; a path that would need a
            // file to also be a directory is skipped.
            let _ = snapshot.insert(path, content);
        }
        snapshot
    })
}

/// Generate a snapshot and an edited successor sharing some files.
pub fn snapshot_pair(max_files: usize, max_len: usize) -> impl Strategy<Value = (Snapshot, Snapshot)> {
    (
        snapshot(max_files, max_len),
        snapshot(max_files, max_len),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(base, extra, keep)| {
            let mut next = base.clone();
            let paths: Vec<String> = base.paths().map(String::from).collect();
            if !paths.is_empty() {
                next.remove(&paths[keep.index(paths.len())]);
            }
            for (path, content) in extra.iter() {
                let _ = next.insert(path, content);
            }
            (base, next)
        })
}

/// Generate a linear history of snapshots.
pub fn snapshot_history(
    max_versions: usize,
    max_files: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<Snapshot>> {
    prop::collection::vec(snapshot(max_files, max_len), 1..=max_versions)
}
