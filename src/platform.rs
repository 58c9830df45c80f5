//! Build platform detection and on-disk layout
//!
//! Everything produced for one build identity lives under
//! `<root>/<state-hash>/{source,build,package}`; only `package` is cached.

use crate::error::{SetupError, SetupResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Platform a build targets, part of the build identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildPlatform {
    Linux,
    Macos,
    Windows,
}

impl BuildPlatform {
    /// Detect the host platform
    pub fn detect() -> SetupResult<Self> {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> SetupResult<Self> {
        match os {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Macos),
            "windows" => Ok(Self::Windows),
            other => Err(SetupError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Tag used in state hashes and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Macos => "Macos",
            Self::Windows => "Windows",
        }
    }

    /// Separator for PATH-like variables
    pub fn path_delimiter(&self) -> char {
        match self {
            Self::Windows => ';',
            Self::Linux | Self::Macos => ':',
        }
    }
}

impl fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directories derived from the platform root and a state hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
    state_dir: PathBuf,
}

impl StateLayout {
    pub fn new(root: &Path, state_hash: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            state_dir: root.join(state_hash),
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.state_dir.join("source")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.state_dir.join("build")
    }

    /// Install prefix, the only cached directory
    pub fn package_dir(&self) -> PathBuf {
        self.state_dir.join("package")
    }

    /// Where the Ninja binary is unpacked, shared by all identities
    pub fn ninja_dir(&self) -> PathBuf {
        self.root.join("ninja")
    }
}

/// Pick the platform root: explicit input, then config, then the data dir
pub fn platform_root(input: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    input
        .or(configured)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("setup-sdl")
        })
}

/// An environment change requested from the output sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvExport {
    /// Set `name` to `value`
    Set { name: String, value: String },
    /// Prepend a directory to the job's PATH
    AddPath(PathBuf),
}

/// Environment changes that make the package usable by later job steps.
///
/// `current` looks up the present value of a variable so the result can
/// prepend to it; nothing is read from or written to the process here.
pub fn environment_exports(
    platform: BuildPlatform,
    package_dir: &Path,
    current: impl Fn(&str) -> Option<String>,
) -> Vec<EnvExport> {
    let lib_dir = package_dir.join("lib");
    let mut exports = Vec::new();

    match platform {
        BuildPlatform::Windows => exports.push(EnvExport::AddPath(package_dir.join("bin"))),
        BuildPlatform::Macos => exports.push(prepend(
            platform,
            "DYLD_LIBRARY_PATH",
            &lib_dir,
            &current,
        )),
        BuildPlatform::Linux => {
            exports.push(prepend(platform, "LD_LIBRARY_PATH", &lib_dir, &current))
        }
    }

    exports.push(prepend(
        platform,
        "PKG_CONFIG_PATH",
        &lib_dir.join("pkgconfig"),
        &current,
    ));
    exports
}

fn prepend(
    platform: BuildPlatform,
    name: &str,
    dir: &Path,
    current: &impl Fn(&str) -> Option<String>,
) -> EnvExport {
    let dir = dir.display().to_string();
    let value = match current(name).filter(|v| !v.is_empty()) {
        Some(existing) => format!("{}{}{}", dir, platform.path_delimiter(), existing),
        None => dir,
    };
    EnvExport::Set {
        name: name.to_string(),
        value,
    }
}
