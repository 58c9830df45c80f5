//! Requirement resolution
//!
//! Maps a [`VersionRequirement`] to the git reference that should be built.
//! Converting that reference to a commit is a separate, network-bound step
//! (see [`crate::git::resolve_commit`]).

use crate::error::{SetupError, SetupResult};
use crate::version::catalog::{ReleaseCatalog, ReleaseCatalogEntry};
use crate::version::requirement::VersionRequirement;
use serde::Serialize;

/// Development branch tracked by each supported major
const HEAD_BRANCHES: &[(u64, &str)] = &[(2, "SDL2"), (3, "main")];

/// Git reference chosen for a requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRevision {
    /// Branch, tag or literal reference
    pub reference: String,
    /// Catalog entry the reference came from, for catalog-based requirements
    pub release: Option<ReleaseCatalogEntry>,
}

/// Development branch for `major`, if it is tracked
pub fn head_branch(major: u64) -> Option<&'static str> {
    HEAD_BRANCHES
        .iter()
        .find(|(m, _)| *m == major)
        .map(|(_, branch)| *branch)
}

/// Resolve a requirement against `catalog`
pub fn resolve(
    requirement: &VersionRequirement,
    allow_prerelease: bool,
    catalog: &ReleaseCatalog,
) -> SetupResult<ResolvedRevision> {
    match requirement {
        VersionRequirement::Literal(reference) => Ok(ResolvedRevision {
            reference: reference.clone(),
            release: None,
        }),
        VersionRequirement::MajorHead { major } => {
            let branch = head_branch(*major).ok_or(SetupError::UnsupportedMajor(*major))?;
            Ok(ResolvedRevision {
                reference: branch.to_string(),
                release: None,
            })
        }
        VersionRequirement::Exact(wanted) => {
            let entry = catalog.newest_matching(allow_prerelease, |v| v == wanted);
            from_entry(requirement, allow_prerelease, entry)
        }
        VersionRequirement::MajorLatest { major } => {
            let entry = catalog.newest_matching(allow_prerelease, |v| v.major == *major);
            from_entry(requirement, allow_prerelease, entry)
        }
    }
}

fn from_entry(
    requirement: &VersionRequirement,
    allow_prerelease: bool,
    entry: Option<&ReleaseCatalogEntry>,
) -> SetupResult<ResolvedRevision> {
    let entry = entry.ok_or_else(|| SetupError::NoMatchingRelease {
        requirement: requirement.to_string(),
        allow_prerelease,
    })?;
    Ok(ResolvedRevision {
        reference: entry.tag.clone(),
        release: Some(entry.clone()),
    })
}
