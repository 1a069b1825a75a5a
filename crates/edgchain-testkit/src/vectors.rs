//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the CID mapping and the snapshot commit-id encoding,
//! so any implementation interoperating with an existing chain produces
//! identical identifiers.

use edgchain_core::{cid_to_digest, digest_to_cid, CommitId};
use edgchain_patch::Snapshot;
use serde::Serialize;

use crate::fixtures::{DEMO_V1, DEMO_V2, DEMO_V3};

/// A CIDv0 string and the SHA-256 digest it carries.
#[derive(Debug, Clone, Serialize)]
pub struct CidVector {
    pub name: &'static str,
    pub cid: &'static str,
    /// 32 bytes hex.
    pub digest: &'static str,
}

/// A snapshot and its expected commit id.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotVector {
    pub name: &'static str,
    pub files: &'static [(&'static str, &'static str)],
    /// 32 bytes hex.
    pub commit_id: &'static str,
    /// CIDv0 of the commit id, or empty if not pinned.
    pub cid: &'static str,
}

/// CIDs used by the registry contract tests.
pub fn cid_vectors() -> Vec<CidVector> {
    vec![
        CidVector {
            name: "genesis",
            cid: "QmT78zSuBmuS4z925W2u7F6zXZx3jUunZ2x7Y6W92Ar81m",
            digest: "46d44814b9c5af141c3aaaaf1f9e28fcd89657fdb461d285cd2a4192658cb680",
        },
        CidVector {
            name: "data1",
            cid: "QmXoypizjW3WknFiJnKLwHCnL72vedxjQkDDP1mXWo6uco",
            digest: "8cb97a00a6c90a14ecf182d8363583d402f69919e38f0498edd9d92a5c02a7b4",
        },
        CidVector {
            name: "data2",
            cid: "QmYwAPJzv5CZsnAzt8auVTLXgfF6iMJxmswXAXqc7x2xR9",
            digest: "9d6c2be50f70695347c6da90ab40aa3876d98791bd5c86c0f6758d6d2e85254c",
        },
        CidVector {
            name: "genesis-variant",
            cid: "QmT78zSuBmuS4z925W2u7F6zXZx3jUunZ2x7Y6W92Ar811",
            digest: "46d44814b9c5af141c3aaaaf1f9e28fcd89657fdb461d285cd2a4192658cb654",
        },
    ]
}

/// Commit ids of the empty snapshot and the demo versions.
pub fn snapshot_vectors() -> Vec<SnapshotVector> {
    vec![
        SnapshotVector {
            name: "empty",
            files: &[],
            commit_id: "c19a797fa1fd590cd2e5b42d1cf5f246e29b91684e2f87404b81dc345c7a56a0",
            cid: "QmbNQ1j6BUYuRf6Sj73JrwH7xwXKsmaXTipK3o2QYnWp1D",
        },
        SnapshotVector {
            name: "demo-v1",
            files: DEMO_V1,
            commit_id: "adf774cab6257850d2adcc7744032d7acdad1fb8f151832ef8992b490e46635f",
            cid: "Qma3k6LNyZfBqb8zKfrkqrMPoLixQyKdANamcrdXU6m3Lz",
        },
        SnapshotVector {
            name: "demo-v2",
            files: DEMO_V2,
            commit_id: "33925ab53cbb703904f35475bd660f9604eafcb671a7a8048afa673f66dff539",
            cid: "",
        },
        SnapshotVector {
            name: "demo-v3",
            files: DEMO_V3,
            commit_id: "9c4aeb9fdcdbb95d3dee71ecf461c7f51e24780107442011019e2033f8a042a1",
            cid: "",
        },
    ]
}

/// Check a CID vector in both directions.
pub fn verify_cid_vector(v: &CidVector) -> Result<(), String> {
    let digest = cid_to_digest(v.cid).map_err(|e| format!("{}: {}", v.name, e))?;
    if hex::encode(digest) != v.digest {
        return Err(format!(
            "{}: decoded {}, expected {}",
            v.name,
            hex::encode(digest),
            v.digest
        ));
    }

    let encoded = digest_to_cid(&digest).map_err(|e| format!("{}: {}", v.name, e))?;
    if encoded != v.cid {
        return Err(format!("{}: encoded {}, expected {}", v.name, encoded, v.cid));
    }
    Ok(())
}

/// Check a snapshot vector's commit id and CID.
pub fn verify_snapshot_vector(v: &SnapshotVector) -> Result<(), String> {
    let snapshot = Snapshot::from_files(v.files.iter().map(|(p, c)| (*p, c.as_bytes())))
        .map_err(|e| format!("{}: {}", v.name, e))?;
    let commit_id: CommitId = snapshot
        .commit_id()
        .map_err(|e| format!("{}: {}", v.name, e))?;

    if commit_id.to_hex() != v.commit_id {
        return Err(format!(
            "{}: computed {}, expected {}",
            v.name,
            commit_id.to_hex(),
            v.commit_id
        ));
    }

    if !v.cid.is_empty() {
        let cid = commit_id.to_cid().map_err(|e| format!("{}: {}", v.name, e))?;
        if cid != v.cid {
            return Err(format!("{}: cid {}, expected {}", v.name, cid, v.cid));
        }
    }
    Ok(())
}

/// Verify every vector, collecting all failures.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = cid_vectors()
        .iter()
        .map(verify_cid_vector)
        .chain(snapshot_vectors().iter().map(verify_snapshot_vector))
        .filter_map(|r| r.err())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

#[derive(Serialize)]
struct VectorFile {
    version: u32,
    cids: Vec<CidVector>,
    snapshots: Vec<SnapshotVector>,
}

/// All vectors as pretty-printed JSON, for other implementations to check
/// against.
pub fn export_vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&VectorFile {
        version: 1,
        cids: cid_vectors(),
        snapshots: snapshot_vectors(),
    })
}
