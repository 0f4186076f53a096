//! Scoped working directory changes.

use std::path::{Path, PathBuf};

use crate::PatchError;

/// Changes the process working directory and restores it on drop.
///
/// Restoration happens whether the work done in between succeeded or not.
#[derive(Debug)]
pub struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    /// Enter `dir`, remembering the current directory.
    pub fn enter(dir: impl AsRef<Path>) -> Result<Self, PatchError> {
        let dir = dir.as_ref();
        let original = std::env::current_dir().map_err(|source| PatchError::WorkingDir {
            path: PathBuf::from("."),
            source,
        })?;

        std::env::set_current_dir(dir).map_err(|source| PatchError::WorkingDir {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::debug!("Entered {}", dir.display());

        Ok(Self { original })
    }

    /// Enter the parent of the current directory.
    ///
    /// Bench commands run from `<bench>/sites`; deployment files live one
    /// level up.
    pub fn enter_parent() -> Result<Self, PatchError> {
        Self::enter("..")
    }

    /// Directory that will be restored
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.original) {
            tracing::error!(
                "Failed to restore working directory {}: {}",
                self.original.display(),
                e
            );
        }
    }
}
