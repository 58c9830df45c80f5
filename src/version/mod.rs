//! SDL versions, requirements and release resolution
//!
//! A user-supplied requirement string is parsed into a [`VersionRequirement`],
//! resolved against the release catalog into a [`ResolvedRevision`], and the
//! version actually installed is read back from the artifact tree by
//! [`detect_version`].

pub mod catalog;
pub mod detect;
pub mod requirement;
pub mod resolve;

pub use catalog::{ReleaseCatalog, ReleaseCatalogEntry};
pub use detect::detect_version;
pub use requirement::VersionRequirement;
pub use resolve::{head_branch, resolve, ResolvedRevision};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (major, minor, patch) triple, ordered lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SdlVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SdlVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SdlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<&semver::Version> for SdlVersion {
    fn from(v: &semver::Version) -> Self {
        Self::new(v.major, v.minor, v.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        assert!(SdlVersion::new(2, 30, 0) < SdlVersion::new(2, 32, 0));
        assert!(SdlVersion::new(2, 32, 10) < SdlVersion::new(3, 0, 0));
        assert!(SdlVersion::new(3, 1, 9) < SdlVersion::new(3, 2, 0));
    }

    #[test]
    fn display() {
        assert_eq!(SdlVersion::new(3, 2, 0).to_string(), "3.2.0");
    }
}
