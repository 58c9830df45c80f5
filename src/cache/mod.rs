//! Artifact cache
//!
//! Bundles are opaque: a set of directories stored under one key. Restoring
//! is all-or-nothing, either every path reappears or none is touched.
//!
//! # Keys
//!
//! | Bundle | Key |
//! |--------|-----|
//! | SDL package | `setup-sdl-<state-hash>` |
//! | Ninja | `ninja-<platform>-<version>` |

pub mod bundle;
pub mod local;

pub use local::{CacheEntryInfo, LocalCache};

use crate::config::schema::CacheConfig;
use crate::error::SetupResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Storage for directory bundles keyed by string
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Restore the bundle saved under `key` into `paths`.
    ///
    /// When `key` is absent, the newest bundle whose key starts with one of
    /// `fallback_prefixes` is used instead. Returns the key that matched. A
    /// bundle that cannot be unpacked counts as a miss.
    async fn restore(
        &self,
        paths: &[PathBuf],
        key: &str,
        fallback_prefixes: &[String],
    ) -> SetupResult<Option<String>>;

    /// Save `paths` under `key`. Saving a key that already exists is a no-op.
    async fn save(&self, paths: &[PathBuf], key: &str) -> SetupResult<()>;
}

/// Backend used when caching is turned off: always a miss, never stores
pub struct DisabledCache;

#[async_trait]
impl CacheBackend for DisabledCache {
    async fn restore(
        &self,
        _paths: &[PathBuf],
        key: &str,
        _fallback_prefixes: &[String],
    ) -> SetupResult<Option<String>> {
        debug!("Cache disabled, skipping restore of {}", key);
        Ok(None)
    }

    async fn save(&self, _paths: &[PathBuf], key: &str) -> SetupResult<()> {
        debug!("Cache disabled, skipping save of {}", key);
        Ok(())
    }
}

/// Default bundle directory
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("setup-sdl")
        .join("bundles")
}

/// Open the backend selected by configuration
pub fn open_cache(config: &CacheConfig) -> Box<dyn CacheBackend> {
    if !config.enabled {
        return Box::new(DisabledCache);
    }
    let dir = config.dir.clone().unwrap_or_else(default_cache_dir);
    debug!("Using cache directory {}", dir.display());
    Box::new(LocalCache::new(dir))
}
