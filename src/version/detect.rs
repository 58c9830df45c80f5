//! Detect the SDL version installed under a prefix
//!
//! The requirement that produced a build says little about the exact patch
//! level (`2-latest`, `3-head`), so the installed headers are authoritative.

use crate::error::{SetupError, SetupResult};
use crate::version::SdlVersion;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Version headers and the macro carrying the patch component
const VERSION_HEADERS: &[(&str, &str)] = &[
    ("include/SDL3/SDL_version.h", "SDL_MICRO_VERSION"),
    ("include/SDL2/SDL_version.h", "SDL_PATCHLEVEL"),
];

const PKG_CONFIG_FILES: &[&str] = &["lib/pkgconfig/sdl3.pc", "lib/pkgconfig/sdl2.pc"];

/// Read the installed SDL version from `prefix`
pub fn detect_version(prefix: &Path) -> SetupResult<SdlVersion> {
    for (header, patch_macro) in VERSION_HEADERS {
        let path = prefix.join(header);
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        if let Some(version) = parse_version_header(&content, patch_macro) {
            debug!("Detected SDL {} from {}", version, path.display());
            return Ok(version);
        }
        debug!("No version macros in {}", path.display());
    }

    for pc in PKG_CONFIG_FILES {
        let path = prefix.join(pc);
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        if let Some(version) = parse_pkg_config(&content) {
            debug!("Detected SDL {} from {}", version, path.display());
            return Ok(version);
        }
    }

    Err(SetupError::VersionDetectionFailed(prefix.to_path_buf()))
}

fn parse_version_header(content: &str, patch_macro: &str) -> Option<SdlVersion> {
    let mut major = None;
    let mut minor = None;
    let mut patch = None;

    for line in content.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("#define") {
            continue;
        }
        let (Some(name), Some(value)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let slot = match name {
            "SDL_MAJOR_VERSION" => &mut major,
            "SDL_MINOR_VERSION" => &mut minor,
            n if n == patch_macro => &mut patch,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value.parse::<u64>().ok();
        }
    }

    Some(SdlVersion::new(major?, minor?, patch?))
}

fn parse_pkg_config(content: &str) -> Option<SdlVersion> {
    let value = content
        .lines()
        .find_map(|line| line.trim().strip_prefix("Version:"))?
        .trim();
    semver::Version::parse(value).ok().map(|v| SdlVersion::from(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SDL3_HEADER: &str = "\
#ifndef SDL_version_h_
#define SDL_version_h_

#define SDL_MAJOR_VERSION   3
#define SDL_MINOR_VERSION   2
#define SDL_MICRO_VERSION   10

#define SDL_VERSIONNUM(major, minor, patch) \\
    ((major) * 1000000 + (minor) * 1000 + (patch))
#endif
";

    const SDL2_HEADER: &str = "\
#define SDL_MAJOR_VERSION   2
#define SDL_MINOR_VERSION   30
#define SDL_PATCHLEVEL      5
";

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn detects_sdl3_header() {
        let dir = TempDir::new().unwrap();
        write(&dir, "include/SDL3/SDL_version.h", SDL3_HEADER);
        assert_eq!(detect_version(dir.path()).unwrap(), SdlVersion::new(3, 2, 10));
    }

    #[test]
    fn detects_sdl2_header() {
        let dir = TempDir::new().unwrap();
        write(&dir, "include/SDL2/SDL_version.h", SDL2_HEADER);
        assert_eq!(detect_version(dir.path()).unwrap(), SdlVersion::new(2, 30, 5));
    }

    #[test]
    fn falls_back_to_pkg_config() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "lib/pkgconfig/sdl2.pc",
            "prefix=/opt/sdl\nName: sdl2\nVersion: 2.28.4\nLibs: -lSDL2\n",
        );
        assert_eq!(detect_version(dir.path()).unwrap(), SdlVersion::new(2, 28, 4));
    }

    #[test]
    fn header_without_patch_macro_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "include/SDL3/SDL_version.h",
            "#define SDL_MAJOR_VERSION 3\n#define SDL_MINOR_VERSION 3\n",
        );
        assert!(matches!(
            detect_version(dir.path()),
            Err(SetupError::VersionDetectionFailed(_))
        ));
    }

    #[test]
    fn empty_prefix_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            detect_version(dir.path()),
            Err(SetupError::VersionDetectionFailed(_))
        ));
    }
}
