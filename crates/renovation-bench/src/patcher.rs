//! Supervisor config and Procfile patching
//!
//! Each file is optional. A missing file is skipped with a notice, a blank
//! file is an error and is left untouched. The two files are patched
//! independently: a failure on one never prevents the other.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{PatchError, WorkingDirGuard};

/// Literal substitution applied to a deployment file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    pub from: &'static str,
    pub to: &'static str,
}

const WSGI_ENTRYPOINT: Replacement = Replacement {
    from: "frappe.app:application",
    to: "frappe_util_configs.app:application",
};

const SOCKETIO_SCRIPT: Replacement = Replacement {
    from: "apps/frappe/socketio.js",
    to: "apps/frappe_util_configs/socketio.js",
};

/// Substitutions for `config/supervisor.conf`
pub const SUPERVISOR_REPLACEMENTS: &[Replacement] = &[WSGI_ENTRYPOINT, SOCKETIO_SCRIPT];

/// Substitutions for `Procfile`
pub const PROCFILE_REPLACEMENTS: &[Replacement] = &[SOCKETIO_SCRIPT];

/// Deployment files this crate knows how to patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentFile {
    /// Process supervisor config
    Supervisor,
    /// Procfile process declarations
    Procfile,
}

impl DeploymentFile {
    /// Location relative to the bench root
    pub fn relative_path(self) -> PathBuf {
        match self {
            Self::Supervisor => Path::new("config").join("supervisor.conf"),
            Self::Procfile => PathBuf::from("Procfile"),
        }
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor config",
            Self::Procfile => "procfile",
        }
    }

    /// Substitutions applied to this file
    pub fn replacements(self) -> &'static [Replacement] {
        match self {
            Self::Supervisor => SUPERVISOR_REPLACEMENTS,
            Self::Procfile => PROCFILE_REPLACEMENTS,
        }
    }
}

/// Result of patching one file
#[derive(Debug)]
pub enum FileOutcome {
    /// File does not exist in this deployment
    Missing,
    /// File is patched; `changed` is false when it already was
    Patched { changed: bool },
    /// File could not be patched
    Failed(PatchError),
}

impl FileOutcome {
    fn from_result(result: Result<FileOutcome, PatchError>) -> Self {
        result.unwrap_or_else(FileOutcome::Failed)
    }
}

/// Outcome of a full patch run
#[derive(Debug)]
pub struct PatchReport {
    pub supervisor: FileOutcome,
    pub procfile: FileOutcome,
}

impl PatchReport {
    /// Whether no file failed
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Errors of the files that failed
    pub fn failures(&self) -> impl Iterator<Item = &PatchError> {
        [&self.supervisor, &self.procfile]
            .into_iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Failed(err) => Some(err),
                _ => None,
            })
    }

    /// Whether any file content changed
    pub fn changed_any(&self) -> bool {
        [&self.supervisor, &self.procfile]
            .into_iter()
            .any(|outcome| matches!(outcome, FileOutcome::Patched { changed: true }))
    }
}

/// Patches the deployment files of one bench
#[derive(Debug, Clone)]
pub struct BenchPatcher {
    root: PathBuf,
}

impl BenchPatcher {
    /// Create a patcher for the bench rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a deployment file in this bench
    pub fn path_of(&self, file: DeploymentFile) -> PathBuf {
        self.root.join(file.relative_path())
    }

    /// Patch every deployment file, each independently of the others
    pub fn run(&self) -> PatchReport {
        PatchReport {
            supervisor: FileOutcome::from_result(self.patch(DeploymentFile::Supervisor)),
            procfile: FileOutcome::from_result(self.patch(DeploymentFile::Procfile)),
        }
    }

    /// Patch one deployment file in place
    pub fn patch(&self, file: DeploymentFile) -> Result<FileOutcome, PatchError> {
        let path = self.path_of(file);

        let original = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("{} not found at {}, skipping", file.label(), path.display());
                return Ok(FileOutcome::Missing);
            }
            Err(e) => return Err(PatchError::io("read", path, e)),
        };

        if original.trim().is_empty() {
            return Err(PatchError::EmptyFile {
                kind: file.label(),
                path,
            });
        }

        let patched = apply_replacements(&original, file.replacements());
        let changed = patched != original;
        if !changed {
            tracing::debug!("{} already patched", file.label());
            return Ok(FileOutcome::Patched { changed });
        }

        fs::write(&path, &patched).map_err(|e| PatchError::io("write", &path, e))?;
        for r in matching_replacements(&original, file.replacements()) {
            tracing::info!("{} updated to use {}", file.label(), r.to);
        }
        Ok(FileOutcome::Patched { changed })
    }
}

/// Apply every replacement to `text`
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> String {
    replacements
        .iter()
        .fold(text.to_string(), |acc, r| acc.replace(r.from, r.to))
}

/// Replacements whose source text occurs in `text`
fn matching_replacements<'a>(
    text: &'a str,
    replacements: &'a [Replacement],
) -> impl Iterator<Item = &'a Replacement> {
    replacements.iter().filter(move |r| text.contains(r.from))
}

/// Patch the bench that contains the current directory.
///
/// Bench commands run from `<bench>/sites`, so this steps up one level for
/// the duration of the patch and then returns to where it started.
pub fn update_config() -> Result<PatchReport, PatchError> {
    let _guard = WorkingDirGuard::enter_parent()?;
    Ok(BenchPatcher::new(".").run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_replacements() {
        let text = "command=gunicorn -b 127.0.0.1:8000 frappe.app:application --preload\n\
                    command=node apps/frappe/socketio.js\n";
        let patched = apply_replacements(text, SUPERVISOR_REPLACEMENTS);

        assert!(patched.contains("frappe_util_configs.app:application"));
        assert!(patched.contains("apps/frappe_util_configs/socketio.js"));
        assert!(!patched.contains(" frappe.app:application"));
        assert!(!patched.contains("apps/frappe/socketio.js"));
    }

    #[test]
    fn test_replacements_are_idempotent() {
        let once = apply_replacements("frappe.app:application apps/frappe/socketio.js", SUPERVISOR_REPLACEMENTS);
        let twice = apply_replacements(&once, SUPERVISOR_REPLACEMENTS);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_procfile_keeps_entrypoint() {
        let text = "web: bench serve --port 8000\nsocketio: /usr/bin/node apps/frappe/socketio.js\n";
        let patched = apply_replacements(text, PROCFILE_REPLACEMENTS);
        assert_eq!(
            patched,
            "web: bench serve --port 8000\nsocketio: /usr/bin/node apps/frappe_util_configs/socketio.js\n"
        );
    }

    #[test]
    fn test_only_matching_replacements_reported() {
        let partly = "command=gunicorn frappe_util_configs.app:application\n\
                      command=node apps/frappe/socketio.js\n";
        let matched: Vec<_> = matching_replacements(partly, SUPERVISOR_REPLACEMENTS).collect();
        assert_eq!(matched, vec![&SOCKETIO_SCRIPT]);

        let patched = apply_replacements(partly, SUPERVISOR_REPLACEMENTS);
        assert_eq!(matching_replacements(&patched, SUPERVISOR_REPLACEMENTS).count(), 0);
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(
            DeploymentFile::Supervisor.relative_path(),
            Path::new("config").join("supervisor.conf")
        );
        assert_eq!(DeploymentFile::Procfile.relative_path(), PathBuf::from("Procfile"));
    }
}
