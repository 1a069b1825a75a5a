//! Diff engine backed by the `git` executable.
//!
//! Patches are `git diff --binary` output and are applied with
//! `git apply`. Each call works in its own `TempDir`, which is removed
//! when the call returns on any path. Commands run with an explicit
//! working directory; the process working directory is never changed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use tracing::debug;

use crate::engine::DiffEngine;
use crate::error::{PatchError, Result};
use crate::snapshot::Snapshot;

const TREE_DIR: &str = "tree";
const PATCH_FILE: &str = "change.patch";

/// Repository-local attributes that switch off every content conversion,
/// so bytes in the work tree are exactly the bytes in the snapshot. They
/// take precedence over any `.gitattributes` carried by the snapshot.
const RAW_ATTRIBUTES: &str = "* -text -eol -filter -ident -working-tree-encoding\n";

/// Diff engine that shells out to `git`.
#[derive(Debug, Clone)]
pub struct GitDiffEngine {
    program: PathBuf,
}

impl Default for GitDiffEngine {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitDiffEngine {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// True if the configured executable runs.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let output = Command::new(&self.program)
            .args([
                "-c",
                "core.autocrlf=false",
                "-c",
                "core.quotepath=false",
                "-c",
                "user.name=edgchain",
                "-c",
                "user.email=edgchain@localhost",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", null_device())
            .output()
            .map_err(|e| PatchError::Git(format!("failed to run git: {}", e)))?;
        Ok(output)
    }

    /// `git init` in `tree` with conversions disabled.
    fn init_repo(&self, tree: &Path) -> Result<()> {
        self.git_ok(tree, &["init", "--quiet"])?;
        let info = tree.join(".git").join("info");
        fs::create_dir_all(&info)?;
        fs::write(info.join("attributes"), RAW_ATTRIBUTES)?;
        Ok(())
    }

    fn git_ok(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let output = self.git(dir, args)?;
        if !output.status.success() {
            return Err(PatchError::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Reject paths that would collide with git's own metadata.
fn check_git_path(path: &str) -> Result<()> {
    if path.split('/').any(|segment| segment == ".git") {
        return Err(PatchError::InvalidPath {
            path: path.to_string(),
            reason: "reserved by the git engine",
        });
    }
    Ok(())
}

/// Write every file of `snapshot` under `root`.
fn write_tree(root: &Path, snapshot: &Snapshot) -> Result<()> {
    for (path, content) in snapshot.iter() {
        check_git_path(path)?;
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)?;
    }
    Ok(())
}

/// Remove everything under `root` except `.git`.
fn clear_tree(root: &Path) -> Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Read every regular file under `root` back into a snapshot.
fn read_tree(root: &Path) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_name() == ".git" {
                continue;
            }
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .map_err(|e| PatchError::Git(e.to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            snapshot.insert(name, fs::read(&path)?)?;
        }
    }

    Ok(snapshot)
}

impl DiffEngine for GitDiffEngine {
    fn name(&self) -> &'static str {
        "git"
    }

    fn diff(&self, base: &Snapshot, new: &Snapshot) -> Result<Vec<u8>> {
        let scratch = TempDir::new()?;
        let tree = scratch.path().join(TREE_DIR);
        fs::create_dir(&tree)?;

        self.init_repo(&tree)?;
        write_tree(&tree, base)?;
        self.git_ok(&tree, &["add", "--all"])?;
        self.git_ok(
            &tree,
            &["commit", "--quiet", "--allow-empty", "--no-verify", "-m", "base"],
        )?;

        clear_tree(&tree)?;
        write_tree(&tree, new)?;
        self.git_ok(&tree, &["add", "--all"])?;

        let output = self.git_ok(
            &tree,
            &["diff", "--cached", "--binary", "--full-index", "--no-renames", "HEAD"],
        )?;

        debug!(
            base_files = base.len(),
            new_files = new.len(),
            patch_len = output.stdout.len(),
            "git diff"
        );
        Ok(output.stdout)
    }

    fn apply(&self, base: &Snapshot, patch: &[u8]) -> Result<Snapshot> {
        if patch.is_empty() {
            return Ok(base.clone());
        }

        let scratch = TempDir::new()?;
        let tree = scratch.path().join(TREE_DIR);
        fs::create_dir(&tree)?;
        // Own repository, so paths resolve against `tree` even when the
        // temp root sits inside another checkout.
        self.init_repo(&tree)?;
        write_tree(&tree, base)?;

        let patch_path = scratch.path().join(PATCH_FILE);
        fs::write(&patch_path, patch)?;
        let patch_arg = patch_path.to_string_lossy().into_owned();

        let output = self.git(
            &tree,
            &["apply", "--binary", "--whitespace=nowarn", patch_arg.as_str()],
        )?;
        if !output.status.success() {
            return Err(PatchError::PatchApplyError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        read_tree(&tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Option<GitDiffEngine> {
        let engine = GitDiffEngine::new();
        engine.is_available().then_some(engine)
    }

    fn snap(files: Vec<(&str, Vec<u8>)>) -> Snapshot {
        Snapshot::from_files(files).unwrap()
    }

    #[test]
    fn test_roundtrip_with_deletion_and_binary() {
        let Some(engine) = engine() else { return };

        let v1 = snap(vec![
            ("README.md", b"# Demo\n".to_vec()),
            ("main.py", b"print('v1')\n".to_vec()),
            ("assets/blob.bin", vec![0, 1, 2, 255, 0, 7]),
        ]);
        let v2 = snap(vec![
            ("main.py", b"print('v2')\n".to_vec()),
            ("assets/blob.bin", vec![0, 1, 3, 255, 0]),
            ("docs/new.txt", b"hello\n".to_vec()),
        ]);

        let genesis = engine.diff(&Snapshot::new(), &v1).unwrap();
        assert_eq!(engine.apply(&Snapshot::new(), &genesis).unwrap(), v1);

        let patch = engine.diff(&v1, &v2).unwrap();
        assert_eq!(engine.apply(&v1, &patch).unwrap(), v2);
    }

    #[test]
    fn test_bytes_survive_snapshot_gitattributes() {
        let Some(engine) = engine() else { return };

        // A snapshot asking git to normalise line endings must still
        // round-trip byte for byte.
        let v1 = snap(vec![
            (".gitattributes", b"* text=auto eol=lf\n".to_vec()),
            ("win.txt", b"line one\r\nline two\r\n".to_vec()),
        ]);
        let v2 = snap(vec![
            (".gitattributes", b"* text=auto eol=lf\n".to_vec()),
            ("win.txt", b"line one\r\nline 2\r\n".to_vec()),
            ("mixed.txt", b"a\r\nb\nc\r".to_vec()),
        ]);

        let genesis = engine.diff(&Snapshot::new(), &v1).unwrap();
        assert_eq!(engine.apply(&Snapshot::new(), &genesis).unwrap(), v1);

        let patch = engine.diff(&v1, &v2).unwrap();
        assert_eq!(engine.apply(&v1, &patch).unwrap(), v2);
    }

    #[test]
    fn test_deterministic() {
        let Some(engine) = engine() else { return };

        let a = snap(vec![("a.txt", b"one\n".to_vec())]);
        let b = snap(vec![("a.txt", b"two\n".to_vec())]);
        assert_eq!(engine.diff(&a, &b).unwrap(), engine.diff(&a, &b).unwrap());
    }

    #[test]
    fn test_no_change_is_empty_patch() {
        let Some(engine) = engine() else { return };

        let a = snap(vec![("a.txt", b"same\n".to_vec())]);
        let patch = engine.diff(&a, &a).unwrap();
        assert!(patch.is_empty());
        assert_eq!(engine.apply(&a, &patch).unwrap(), a);
    }

    #[test]
    fn test_conflicting_base_fails() {
        let Some(engine) = engine() else { return };

        let a = snap(vec![("main.py", b"print('v1')\n".to_vec())]);
        let b = snap(vec![("main.py", b"print('v2')\n".to_vec())]);
        let other = snap(vec![("main.py", b"something else entirely\n".to_vec())]);

        let patch = engine.diff(&a, &b).unwrap();
        assert!(matches!(
            engine.apply(&other, &patch),
            Err(PatchError::PatchApplyError(_))
        ));
    }

    #[test]
    fn test_git_metadata_path_rejected() {
        let Some(engine) = engine() else { return };

        let mut s = Snapshot::new();
        s.insert("sub/.git", b"x".to_vec()).unwrap();
        assert!(matches!(
            engine.diff(&Snapshot::new(), &s),
            Err(PatchError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_missing_executable() {
        let engine = GitDiffEngine::with_program("/nonexistent/git-binary");
        assert!(!engine.is_available());
        assert!(matches!(
            engine.diff(&Snapshot::new(), &Snapshot::new()),
            Err(PatchError::Git(_))
        ));
    }
}
