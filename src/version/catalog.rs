//! Catalog of published SDL releases
//!
//! Hand-maintained. Adding a release is a one-line edit to one of the
//! tables below; the catalog itself makes no ordering assumptions about them.

use crate::version::SdlVersion;
use serde::Serialize;

/// Release series with contiguous patch levels `0..=last_patch`
const RELEASE_SERIES: &[(u64, u64, u64)] = &[
    (2, 24, 2),
    (2, 26, 5),
    (2, 28, 5),
    (2, 30, 12),
    (2, 32, 8),
    (3, 2, 16),
];

/// SDL 2.0.x patch levels that were published
const SDL2_0_PATCHES: &[u64] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 14, 16, 18, 20, 22];

/// Pre-releases and their tag prefixes
const PRERELEASES: &[(u64, u64, u64, &str)] = &[
    (2, 29, 2, "prerelease"),
    (2, 29, 3, "prerelease"),
    (2, 31, 2, "prerelease"),
    (3, 1, 3, "preview"),
    (3, 1, 6, "preview"),
    (3, 1, 8, "prerelease"),
    (3, 1, 10, "prerelease"),
];

/// One published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseCatalogEntry {
    pub version: SdlVersion,
    /// Git reference producing this release
    pub tag: String,
    pub is_prerelease: bool,
}

impl ReleaseCatalogEntry {
    pub fn release(version: SdlVersion) -> Self {
        Self {
            version,
            tag: format!("release-{}", version),
            is_prerelease: false,
        }
    }

    pub fn prerelease(version: SdlVersion, prefix: &str) -> Self {
        Self {
            version,
            tag: format!("{}-{}", prefix, version),
            is_prerelease: true,
        }
    }
}

/// A set of releases, kept sorted by version
#[derive(Debug, Clone)]
pub struct ReleaseCatalog {
    entries: Vec<ReleaseCatalogEntry>,
}

impl ReleaseCatalog {
    /// Build a catalog from arbitrary entries.
    ///
    /// Entries are sorted here; duplicate versions keep the first occurrence.
    pub fn new(mut entries: Vec<ReleaseCatalogEntry>) -> Self {
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        entries.dedup_by(|later, earlier| later.version == earlier.version);
        Self { entries }
    }

    /// The releases known at build time of this tool
    pub fn builtin() -> Self {
        let mut entries = Vec::new();

        for patch in SDL2_0_PATCHES {
            entries.push(ReleaseCatalogEntry::release(SdlVersion::new(2, 0, *patch)));
        }
        for (major, minor, last_patch) in RELEASE_SERIES {
            for patch in 0..=*last_patch {
                entries.push(ReleaseCatalogEntry::release(SdlVersion::new(
                    *major, *minor, patch,
                )));
            }
        }
        for (major, minor, patch, prefix) in PRERELEASES {
            entries.push(ReleaseCatalogEntry::prerelease(
                SdlVersion::new(*major, *minor, *patch),
                prefix,
            ));
        }

        Self::new(entries)
    }

    /// All entries in ascending version order
    pub fn entries(&self) -> &[ReleaseCatalogEntry] {
        &self.entries
    }

    /// Newest entry accepted by `filter`, honouring pre-release visibility
    pub fn newest_matching(
        &self,
        allow_prerelease: bool,
        filter: impl Fn(&SdlVersion) -> bool,
    ) -> Option<&ReleaseCatalogEntry> {
        self.entries
            .iter()
            .filter(|e| allow_prerelease || !e.is_prerelease)
            .filter(|e| filter(&e.version))
            .max_by(|a, b| a.version.cmp(&b.version))
    }
}

impl Default for ReleaseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
