//! Versync error types and formatting helpers
//!
//! Uses anyhow for error propagation in the binary. SyncError is the small
//! taxonomy callers match on; `exit_code` recovers the code the process
//! should exit with.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::styling::{ERROR, ERROR_BOLD, ERROR_EMOJI, HINT, HINT_EMOJI, format_with_gutter};

/// Exit code for malformed or missing arguments (matches clap's usage errors).
pub const INVALID_ARGUMENT_EXIT_CODE: i32 = 2;

/// Exit code used when a child could not be spawned at all (shell convention).
pub const SPAWN_FAILED_EXIT_CODE: i32 = 127;

/// A child process that could not be spawned, or that exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildFailure {
    /// Exit code to propagate (128 + signal for signal deaths, 127 for spawn failures)
    pub code: i32,
    pub message: String,
}

impl fmt::Display for ChildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ChildFailure {}

/// Errors surfaced by a synchronization run
#[derive(Debug)]
pub enum SyncError {
    /// Malformed or missing arguments; raised before any external call
    InvalidArgument { message: String },
    /// The manifest setter failed in `location`; later steps were not run
    ManifestUpdateFailed {
        location: PathBuf,
        code: i32,
        message: String,
    },
    /// The full-project bump failed
    FullBumpFailed { code: i32, message: String },
}

impl SyncError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SyncError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn manifest_update_failed(location: &Path, failure: ChildFailure) -> Self {
        SyncError::ManifestUpdateFailed {
            location: location.to_path_buf(),
            code: failure.code,
            message: failure.message,
        }
    }

    pub fn full_bump_failed(failure: ChildFailure) -> Self {
        SyncError::FullBumpFailed {
            code: failure.code,
            message: failure.message,
        }
    }

    /// The process exit code this error maps to.
    pub fn code(&self) -> i32 {
        match self {
            SyncError::InvalidArgument { .. } => INVALID_ARGUMENT_EXIT_CODE,
            SyncError::ManifestUpdateFailed { code, .. } | SyncError::FullBumpFailed { code, .. } => {
                *code
            }
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::InvalidArgument { message } => {
                write!(
                    f,
                    "{ERROR_EMOJI} {ERROR}Invalid argument: {message}{ERROR:#}\n\n{HINT_EMOJI} {HINT}Usage: versync <UPDATE_MANIFESTS> <VERSION>{HINT:#}"
                )
            }
            SyncError::ManifestUpdateFailed {
                location, message, ..
            } => {
                write!(
                    f,
                    "{ERROR_EMOJI} {ERROR}Manifest update failed in {ERROR:#}{ERROR_BOLD}{}{ERROR_BOLD:#}\n{}",
                    location.display(),
                    format_with_gutter(message)
                )
            }
            SyncError::FullBumpFailed { message, .. } => {
                write!(
                    f,
                    "{ERROR_EMOJI} {ERROR}Full-project version bump failed{ERROR:#}\n{}",
                    format_with_gutter(message)
                )
            }
        }
    }
}

impl std::error::Error for SyncError {}

/// Extract the exit code from a SyncError, if the error is one
pub fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<SyncError>().map(SyncError::code)
}
