//! Patch errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while patching a deployment file
#[derive(Error, Debug)]
pub enum PatchError {
    /// File exists but holds nothing but whitespace
    #[error("invalid {kind}: {} is empty", path.display())]
    EmptyFile { kind: &'static str, path: PathBuf },

    /// Reading or writing the file failed
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Changing the working directory failed
    #[error("failed to change directory to {}: {source}", path.display())]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
