//! In-process diff engine.
//!
//! A patch is a CBOR document listing file operations in strictly
//! increasing path order. Every operation that reads base content carries
//! the SHA-256 of the content it expects, and every operation that writes
//! carries the SHA-256 of the content it produces, so a patch never
//! silently applies to the wrong base.

use edgchain_core::Digest;
use serde::{Deserialize, Serialize};

use crate::engine::DiffEngine;
use crate::error::{PatchError, Result};
use crate::snapshot::{validate_path, Snapshot};

/// Current patch format version.
pub const PATCH_FORMAT_VERSION: u8 = 1;

/// A single file change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOp {
    /// Create a file that does not exist in the base.
    Add {
        path: String,
        #[serde(with = "serde_bytes")]
        content: Vec<u8>,
        result: Digest,
    },

    /// Remove a file.
    Delete { path: String, base: Digest },

    /// Replace the middle of a file, keeping `prefix` leading and `suffix`
    /// trailing bytes of the base.
    Modify {
        path: String,
        base: Digest,
        prefix: u64,
        suffix: u64,
        #[serde(with = "serde_bytes")]
        insert: Vec<u8>,
        result: Digest,
    },
}

impl FileOp {
    /// Path this operation touches.
    pub fn path(&self) -> &str {
        match self {
            FileOp::Add { path, .. } | FileOp::Delete { path, .. } | FileOp::Modify { path, .. } => {
                path
            }
        }
    }
}

/// A decoded native patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub version: u8,
    pub ops: Vec<FileOp>,
}

impl Patch {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PatchError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes and check structural validity.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let patch: Patch =
            ciborium::from_reader(bytes).map_err(|e| PatchError::MalformedPatch(e.to_string()))?;

        if patch.version != PATCH_FORMAT_VERSION {
            return Err(PatchError::MalformedPatch(format!(
                "unsupported patch version {}",
                patch.version
            )));
        }

        for pair in patch.ops.windows(2) {
            if pair[0].path() >= pair[1].path() {
                return Err(PatchError::MalformedPatch(format!(
                    "operations out of order at {:?}",
                    pair[1].path()
                )));
            }
        }
        for op in &patch.ops {
            validate_path(op.path())?;
        }

        Ok(patch)
    }
}

/// Length of the longest common prefix.
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Length of the longest common suffix not overlapping the first `skip` bytes.
fn common_suffix(a: &[u8], b: &[u8], skip: usize) -> usize {
    a[skip..]
        .iter()
        .rev()
        .zip(b[skip..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// The in-process diff engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDiffEngine;

impl NativeDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the structured patch between two snapshots.
    pub fn diff_ops(&self, base: &Snapshot, new: &Snapshot) -> Patch {
        let mut ops = Vec::new();
        let mut old = base.iter().peekable();
        let mut cur = new.iter().peekable();

        loop {
            let op = match (old.peek(), cur.peek()) {
                (None, None) => break,
                (Some(&(path, content)), None) => {
                    old.next();
                    Some(delete(path, content))
                }
                (None, Some(&(path, content))) => {
                    cur.next();
                    Some(add(path, content))
                }
                (Some(&(op, oc)), Some(&(np, nc))) => {
                    if op < np {
                        old.next();
                        Some(delete(op, oc))
                    } else if np < op {
                        cur.next();
                        Some(add(np, nc))
                    } else {
                        old.next();
                        cur.next();
                        (oc != nc).then(|| modify(np, oc, nc))
                    }
                }
            };
            ops.extend(op);
        }

        Patch {
            version: PATCH_FORMAT_VERSION,
            ops,
        }
    }

    /// Apply a decoded patch.
    pub fn apply_ops(&self, base: &Snapshot, patch: &Patch) -> Result<Snapshot> {
        let mut next = base.clone();

        // Deletions run first so a file can become a directory, or the
        // reverse, within one patch.
        let (deletes, writes): (Vec<&FileOp>, Vec<&FileOp>) = patch
            .ops
            .iter()
            .partition(|op| matches!(op, FileOp::Delete { .. }));

        for op in deletes.into_iter().chain(writes) {
            match op {
                FileOp::Add {
                    path,
                    content,
                    result,
                } => {
                    if next.contains(path) {
                        return Err(conflict(path, "added file already exists"));
                    }
                    check(path, content, result, "added content")?;
                    next.insert(path.clone(), content.clone())?;
                }
                FileOp::Delete { path, base } => {
                    let current = next
                        .get(path)
                        .ok_or_else(|| conflict(path, "deleted file is missing"))?;
                    check(path, current, base, "base content")?;
                    next.remove(path);
                }
                FileOp::Modify {
                    path,
                    base,
                    prefix,
                    suffix,
                    insert,
                    result,
                } => {
                    let current = next
                        .get(path)
                        .ok_or_else(|| conflict(path, "modified file is missing"))?;
                    check(path, current, base, "base content")?;

                    let (prefix, suffix) = (*prefix as usize, *suffix as usize);
                    if prefix.saturating_add(suffix) > current.len() {
                        return Err(conflict(path, "delta exceeds base length"));
                    }

                    let mut content = Vec::with_capacity(prefix + insert.len() + suffix);
                    content.extend_from_slice(&current[..prefix]);
                    content.extend_from_slice(insert);
                    content.extend_from_slice(&current[current.len() - suffix..]);

                    check(path, &content, result, "result content")?;
                    next.insert(path.clone(), content)?;
                }
            }
        }

        Ok(next)
    }
}

fn add(path: &str, content: &[u8]) -> FileOp {
    FileOp::Add {
        path: path.to_string(),
        content: content.to_vec(),
        result: Digest::of(content),
    }
}

fn delete(path: &str, content: &[u8]) -> FileOp {
    FileOp::Delete {
        path: path.to_string(),
        base: Digest::of(content),
    }
}

fn modify(path: &str, old: &[u8], new: &[u8]) -> FileOp {
    let prefix = common_prefix(old, new);
    let suffix = common_suffix(old, new, prefix);
    FileOp::Modify {
        path: path.to_string(),
        base: Digest::of(old),
        prefix: prefix as u64,
        suffix: suffix as u64,
        insert: new[prefix..new.len() - suffix].to_vec(),
        result: Digest::of(new),
    }
}

fn conflict(path: &str, reason: &str) -> PatchError {
    PatchError::PatchApplyError(format!("{}: {}", path, reason))
}

fn check(path: &str, content: &[u8], expected: &Digest, what: &str) -> Result<()> {
    if Digest::of(content) != *expected {
        return Err(conflict(path, &format!("{} hash mismatch", what)));
    }
    Ok(())
}

impl DiffEngine for NativeDiffEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn diff(&self, base: &Snapshot, new: &Snapshot) -> Result<Vec<u8>> {
        self.diff_ops(base, new).to_bytes()
    }

    fn apply(&self, base: &Snapshot, patch: &[u8]) -> Result<Snapshot> {
        let patch = Patch::from_bytes(patch)?;
        self.apply_ops(base, &patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::replay;
    use proptest::prelude::*;

    fn snap(files: &[(&str, &str)]) -> Snapshot {
        Snapshot::from_files(files.iter().map(|(p, c)| (*p, c.as_bytes()))).unwrap()
    }

    #[test]
    fn test_diff_from_empty_is_all_adds() {
        let engine = NativeDiffEngine::new();
        let v1 = snap(&[("README.md", "# Demo"), ("main.py", "print('v1')")]);

        let patch = engine.diff_ops(&Snapshot::new(), &v1);
        assert_eq!(patch.ops.len(), 2);
        assert!(patch.ops.iter().all(|op| matches!(op, FileOp::Add { .. })));

        let bytes = engine.diff(&Snapshot::new(), &v1).unwrap();
        assert_eq!(engine.apply(&Snapshot::new(), &bytes).unwrap(), v1);
    }

    #[test]
    fn test_modify_uses_minimal_middle() {
        let engine = NativeDiffEngine::new();
        let a = snap(&[("main.py", "print('v1')")]);
        let b = snap(&[("main.py", "print('v2')")]);

        let patch = engine.diff_ops(&a, &b);
        match &patch.ops[..] {
            [FileOp::Modify {
                prefix,
                suffix,
                insert,
                ..
            }] => {
                assert_eq!(*prefix, 8);
                assert_eq!(*suffix, 2);
                assert_eq!(insert, b"2");
            }
            other => panic!("unexpected ops: {other:?}"),
        }
    }

    #[test]
    fn test_delete_and_unchanged() {
        let engine = NativeDiffEngine::new();
        let a = snap(&[("keep", "same"), ("gone", "bye")]);
        let b = snap(&[("keep", "same")]);

        let patch = engine.diff_ops(&a, &b);
        assert_eq!(patch.ops.len(), 1);
        assert!(matches!(&patch.ops[0], FileOp::Delete { path, .. } if path == "gone"));

        let bytes = patch.to_bytes().unwrap();
        assert_eq!(engine.apply(&a, &bytes).unwrap(), b);
    }

    #[test]
    fn test_identical_snapshots_give_empty_patch() {
        let engine = NativeDiffEngine::new();
        let a = snap(&[("x", "1")]);
        assert!(engine.diff_ops(&a, &a).ops.is_empty());
    }

    #[test]
    fn test_diff_is_deterministic() {
        let engine = NativeDiffEngine::new();
        let a = snap(&[("a", "1"), ("b", "2")]);
        let b = snap(&[("b", "3"), ("c", "4")]);
        assert_eq!(engine.diff(&a, &b).unwrap(), engine.diff(&a, &b).unwrap());
    }

    #[test]
    fn test_apply_to_wrong_base_fails() {
        let engine = NativeDiffEngine::new();
        let a = snap(&[("main.py", "print('v1')")]);
        let b = snap(&[("main.py", "print('v2')")]);
        let other = snap(&[("main.py", "print('other')")]);

        let bytes = engine.diff(&a, &b).unwrap();
        assert!(matches!(
            engine.apply(&other, &bytes),
            Err(PatchError::PatchApplyError(_))
        ));
        assert!(matches!(
            engine.apply(&Snapshot::new(), &bytes),
            Err(PatchError::PatchApplyError(_))
        ));
    }

    #[test]
    fn test_add_over_existing_fails() {
        let engine = NativeDiffEngine::new();
        let v1 = snap(&[("main.py", "x")]);
        let bytes = engine.diff(&Snapshot::new(), &v1).unwrap();
        assert!(matches!(
            engine.apply(&v1, &bytes),
            Err(PatchError::PatchApplyError(_))
        ));
    }

    #[test]
    fn test_garbage_patch_is_malformed() {
        let engine = NativeDiffEngine::new();
        assert!(matches!(
            engine.apply(&Snapshot::new(), b"not cbor at all"),
            Err(PatchError::MalformedPatch(_))
        ));
    }

    #[test]
    fn test_out_of_order_ops_rejected() {
        let patch = Patch {
            version: PATCH_FORMAT_VERSION,
            ops: vec![add("b", b"2"), add("a", b"1")],
        };
        let bytes = patch.to_bytes().unwrap();
        assert!(matches!(
            Patch::from_bytes(&bytes),
            Err(PatchError::MalformedPatch(_))
        ));
    }

    #[test]
    fn test_replay_three_versions() {
        let engine = NativeDiffEngine::new();
        let v1 = snap(&[("main.py", "print('v1')"), ("README.md", "# Demo")]);
        let v2 = snap(&[("main.py", "print('v2')"), ("README.md", "# Demo")]);
        let v3 = snap(&[("main.py", "print('v3')"), ("NOTES.md", "new")]);

        let patches = vec![
            engine.diff(&Snapshot::new(), &v1).unwrap(),
            engine.diff(&v1, &v2).unwrap(),
            engine.diff(&v2, &v3).unwrap(),
        ];

        assert_eq!(replay(&engine, Snapshot::new(), &patches).unwrap(), v3);
        assert_eq!(replay(&engine, Snapshot::new(), &patches[..2]).unwrap(), v2);
    }

    #[test]
    fn test_replay_reports_failing_index() {
        let engine = NativeDiffEngine::new();
        let v1 = snap(&[("a", "1")]);
        let patches = vec![engine.diff(&Snapshot::new(), &v1).unwrap(), b"junk".to_vec()];

        assert!(matches!(
            replay(&engine, Snapshot::new(), &patches),
            Err(PatchError::Replay { index: 1, .. })
        ));
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::btree_map(
            "[a-c]{1,2}(/[a-c]{1,2})?",
            prop::collection::vec(any::<u8>(), 0..64),
            0..6,
        )
        .prop_map(|files| {
            // Keep whichever of "a" and "a/b" comes first.
            let mut snapshot = Snapshot::new();
            for (path, content) in files {
                let _ = snapshot.insert(path, content);
            }
            snapshot
        })
    }

    #[test]
    fn test_file_becomes_directory_and_back() {
        let engine = NativeDiffEngine::new();
        let file = snap(&[("src", "flat"), ("z", "keep")]);
        let dir = snap(&[
            ("src/lib.rs", "nested"),
            ("src/main.rs", "fn main() {}"),
            ("z", "keep"),
        ]);

        let forward = engine.diff(&file, &dir).unwrap();
        assert_eq!(engine.apply(&file, &forward).unwrap(), dir);

        let back = engine.diff(&dir, &file).unwrap();
        assert_eq!(engine.apply(&dir, &back).unwrap(), file);
    }

    proptest! {
        #[test]
        fn prop_apply_diff_roundtrip(a in arb_snapshot(), b in arb_snapshot()) {
            let engine = NativeDiffEngine::new();
            let bytes = engine.diff(&a, &b).unwrap();
            prop_assert_eq!(engine.apply(&a, &bytes).unwrap(), b);
        }
    }
}
