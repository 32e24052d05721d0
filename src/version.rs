//! The version token handed to every external tool.

use std::fmt;

use crate::error::SyncError;

/// A version string, passed verbatim to the manifest setter and the bump tool.
///
/// The only invariant enforced at construction is non-emptiness. Format checks
/// belong to the tools that consume the string, unless [`VersionString::require_semver`]
/// is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionString(String);

impl VersionString {
    pub fn parse(raw: impl Into<String>) -> Result<Self, SyncError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SyncError::invalid_argument("version must not be empty"));
        }
        Ok(Self(raw))
    }

    /// Reject anything that isn't a valid semantic version (e.g. `1.2.3`, `2.0.0-rc.1`).
    pub fn require_semver(&self) -> Result<semver::Version, SyncError> {
        semver::Version::parse(&self.0).map_err(|e| {
            SyncError::invalid_argument(format!("{} is not a semantic version: {e}", self.0))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
