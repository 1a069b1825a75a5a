//! Full file-tree snapshots and their canonical encoding.
//!
//! A snapshot is an ordered `path -> bytes` map. Its commit id is the
//! SHA-256 of a deterministic CBOR encoding:
//! - a single definite-length map
//! - text keys (paths), byte-string values
//! - keys sorted by encoded byte comparison (shorter first, then bytewise)

use std::collections::BTreeMap;
use std::ops::Bound;

use ciborium::value::Value;
use edgchain_core::{CommitId, Digest};

use crate::error::{PatchError, Result};

/// Check that a path is a clean relative path with `/` separators.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason| PatchError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(invalid("backslash or NUL in path"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("empty segment")),
            "." | ".." => return Err(invalid("relative segment")),
            _ => {}
        }
    }
    Ok(())
}

/// A file tree at one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<String, Vec<u8>>,
}

impl Snapshot {
    /// The empty snapshot every project history starts from.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(path, content)` pairs.
    pub fn from_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut snapshot = Self::new();
        for (path, content) in files {
            snapshot.insert(path, content)?;
        }
        Ok(snapshot)
    }

    /// Insert or replace a file, returning the previous content.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        let path = path.into();
        validate_path(&path)?;
        self.check_tree_shape(&path)?;
        Ok(self.files.insert(path, content.into()))
    }

    /// A path cannot be both a file and a directory: no ancestor of `path`
    /// may be a file and `path` may not already hold files beneath it.
    fn check_tree_shape(&self, path: &str) -> Result<()> {
        let conflict = |reason| PatchError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        for (i, _) in path.match_indices('/') {
            if self.files.contains_key(&path[..i]) {
                return Err(conflict("an ancestor directory is a file"));
            }
        }

        let dir = format!("{}/", path);
        let below = self
            .files
            .range::<str, _>((Bound::Included(dir.as_str()), Bound::Unbounded))
            .next()
            .is_some_and(|(p, _)| p.starts_with(&dir));
        if below {
            return Err(conflict("path is an existing directory"));
        }
        Ok(())
    }

    /// Remove a file, returning its content.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Get a file's content.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterate files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    /// Iterate paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if there are no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Encode to canonical CBOR bytes.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut entries: Vec<(&String, &Vec<u8>)> = self.files.iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.len()
                .cmp(&b.len())
                .then_with(|| a.as_bytes().cmp(b.as_bytes()))
        });

        let map = Value::Map(
            entries
                .into_iter()
                .map(|(p, c)| (Value::Text(p.clone()), Value::Bytes(c.clone())))
                .collect(),
        );

        let mut buf = Vec::new();
        ciborium::into_writer(&map, &mut buf)
            .map_err(|e| PatchError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR bytes. Paths are validated; duplicates are rejected.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| PatchError::SerializationError(e.to_string()))?;

        let Value::Map(entries) = value else {
            return Err(PatchError::SerializationError(
                "snapshot must be a CBOR map".into(),
            ));
        };

        let mut snapshot = Self::new();
        for (key, value) in entries {
            let (Value::Text(path), Value::Bytes(content)) = (key, value) else {
                return Err(PatchError::SerializationError(
                    "snapshot entries must be text -> bytes".into(),
                ));
            };
            if snapshot.insert(path.clone(), content)?.is_some() {
                return Err(PatchError::SerializationError(format!(
                    "duplicate path {:?}",
                    path
                )));
            }
        }
        Ok(snapshot)
    }

    /// SHA-256 of the canonical encoding.
    pub fn digest(&self) -> Result<Digest> {
        Ok(Digest::of(&self.to_canonical_bytes()?))
    }

    /// The commit id a commit producing this snapshot is registered under.
    pub fn commit_id(&self) -> Result<CommitId> {
        Ok(CommitId::from(self.digest()?))
    }
}
