//! Error types for setup-sdl
//!
//! All modules use `SetupResult<T>` as their return type. Every error is
//! terminal: nothing is retried internally, a failed run is re-run as a whole.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for setup-sdl operations
pub type SetupResult<T> = Result<T, SetupError>;

/// All errors that can occur while provisioning SDL
#[derive(Error, Debug)]
pub enum SetupError {
    // Version resolution errors
    #[error("Invalid version requirement '{requirement}': {reason}")]
    InvalidRequirement { requirement: String, reason: String },

    #[error("Unsupported major version for -head: {0}")]
    UnsupportedMajor(u64),

    #[error("Could not find a matching SDL release for {requirement}")]
    NoMatchingRelease {
        requirement: String,
        allow_prerelease: bool,
    },

    #[error("Git reference '{reference}' not found in {url}")]
    RefNotFound { reference: String, url: String },

    // Input errors
    #[error("Cannot find CMake toolchain file: {0}")]
    ToolchainFileNotFound(String),

    #[error("Cannot read CMake toolchain file {path}: {source}")]
    ToolchainFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid build-type '{0}'")]
    InvalidBuildType(String),

    #[error("Unsupported platform: {0}. setup-sdl supports Linux, macOS and Windows.")]
    UnsupportedPlatform(String),

    // Build errors
    #[error("{step} failed: {status}")]
    SubprocessFailed { step: String, status: String },

    #[error("Could not detect SDL version in {0}")]
    VersionDetectionFailed(PathBuf),

    // Cache errors
    #[error("Failed to restore cache {key}: {reason}")]
    CacheRestore { key: String, reason: String },

    #[error("Failed to save cache {key}: {reason}")]
    CacheSave { key: String, reason: String },

    // Tool download errors
    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SetupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a subprocess failure from its exit status
    pub fn subprocess(step: impl Into<String>, status: std::process::ExitStatus) -> Self {
        let status = match status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        Self::SubprocessFailed {
            step: step.into(),
            status,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRequirement { .. } => {
                Some("Use X.Y.Z, N, N-latest, N-head or a git branch, tag or commit")
            }
            Self::UnsupportedMajor(_) => Some("Only 2-head and 3-head are tracked"),
            Self::NoMatchingRelease {
                allow_prerelease: false,
                ..
            } => Some("Set pre-release: true to consider pre-releases"),
            Self::InvalidBuildType(_) => {
                Some("Use one of Release, Debug, MinSizeRel, RelWithDebInfo")
            }
            Self::ToolchainFileNotFound(_) => {
                Some("Paths are tried relative to the current directory, then GITHUB_WORKSPACE")
            }
            _ => None,
        }
    }
}
