//! Renovation Bench - deployment file patching
//!
//! Points a bench's process supervisor config and Procfile at this app's
//! WSGI entrypoint and socketio script instead of the framework's defaults.
//! Runs once at install time.

pub mod cwd;
pub mod error;
pub mod patcher;

pub use cwd::WorkingDirGuard;
pub use error::PatchError;
pub use patcher::{
    apply_replacements, update_config, BenchPatcher, DeploymentFile, FileOutcome, PatchReport,
    Replacement, PROCFILE_REPLACEMENTS, SUPERVISOR_REPLACEMENTS,
};
