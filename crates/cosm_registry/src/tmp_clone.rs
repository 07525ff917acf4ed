use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;

/// Removes the depot's temporary clone directory on drop, regardless of
/// whether the operation that used it succeeded. Mirrors the scope-guard
/// idiom the spec calls for around `clones/tmp-clone` (§9).
pub struct TmpCloneGuard {
    path: Utf8PathBuf,
}

impl TmpCloneGuard {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for TmpCloneGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs_err::remove_dir_all(&self.path) {
                warn!("failed to remove temporary clone at {}: {e}", self.path);
            }
        }
    }
}
