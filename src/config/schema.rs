//! Configuration schema for setup-sdl
//!
//! Configuration is stored at `~/.config/setup-sdl/config.toml`. Every
//! section is optional; action inputs take precedence over these values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upstream SDL repository
pub const DEFAULT_GIT_URL: &str = "https://github.com/libsdl-org/SDL.git";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where SDL sources come from
    pub source: SourceConfig,

    /// Working directory layout
    pub paths: PathsConfig,

    /// Artifact cache settings
    pub cache: CacheConfig,

    /// Ninja download settings
    pub ninja: NinjaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Git URL of the SDL repository
    pub git_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            git_url: DEFAULT_GIT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for per-hash source, build and package directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Restore and save bundles
    pub enabled: bool,

    /// Bundle directory (default: platform cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NinjaConfig {
    /// Ninja release to download
    pub version: String,

    /// Release download base URL
    pub base_url: String,
}

impl Default for NinjaConfig {
    fn default() -> Self {
        Self {
            version: "1.11.1".to_string(),
            base_url: "https://github.com/ninja-build/ninja/releases/download".to_string(),
        }
    }
}
