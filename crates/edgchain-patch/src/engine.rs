//! The pluggable diff/apply primitive and patch replay.

use tracing::trace;

use crate::error::{PatchError, Result};
use crate::snapshot::Snapshot;

/// A diff/apply primitive over snapshots.
///
/// Implementations must satisfy `apply(a, diff(a, b)) == b` and produce the
/// same patch bytes for the same inputs.
pub trait DiffEngine: Send + Sync {
    /// Short identifier, recorded in logs.
    fn name(&self) -> &'static str;

    /// Compute a patch transforming `base` into `new`.
    fn diff(&self, base: &Snapshot, new: &Snapshot) -> Result<Vec<u8>>;

    /// Apply a patch to `base`.
    ///
    /// Fails with `PatchApplyError` if the patch does not apply cleanly.
    fn apply(&self, base: &Snapshot, patch: &[u8]) -> Result<Snapshot>;
}

impl<E: DiffEngine + ?Sized> DiffEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn diff(&self, base: &Snapshot, new: &Snapshot) -> Result<Vec<u8>> {
        (**self).diff(base, new)
    }

    fn apply(&self, base: &Snapshot, patch: &[u8]) -> Result<Snapshot> {
        (**self).apply(base, patch)
    }
}

/// Apply `patches` in order starting from `base`.
///
/// Errors are wrapped with the index of the failing patch.
pub fn replay<E, I, P>(engine: &E, base: Snapshot, patches: I) -> Result<Snapshot>
where
    E: DiffEngine + ?Sized,
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut current = base;
    for (index, patch) in patches.into_iter().enumerate() {
        current = engine
            .apply(&current, patch.as_ref())
            .map_err(|e| PatchError::Replay {
                index,
                source: Box::new(e),
            })?;
        trace!(engine = engine.name(), index, files = current.len(), "applied patch");
    }
    Ok(current)
}
