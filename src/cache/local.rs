//! Directory-backed cache store
//!
//! Each key becomes `<dir>/<key>.tar.gz` with a `<key>.json` sidecar holding
//! when and what was saved.

use crate::cache::{bundle, CacheBackend};
use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BUNDLE_SUFFIX: &str = ".tar.gz";
const META_SUFFIX: &str = ".json";

/// Sidecar metadata for a stored bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// Paths the bundle was saved from
    pub paths: Vec<PathBuf>,
    /// Bundle size in bytes
    #[serde(default)]
    pub size_bytes: u64,
}

/// [`CacheBackend`] storing bundles in a local directory
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn bundle_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, BUNDLE_SUFFIX))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, META_SUFFIX))
    }

    /// All stored entries, newest first
    pub fn entries(&self) -> SetupResult<Vec<CacheEntryInfo>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SetupError::io(
                    format!("listing cache {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut entries = Vec::new();
        for entry in read_dir.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = name.strip_suffix(META_SUFFIX) else {
                continue;
            };
            if !self.bundle_path(key).is_file() {
                continue;
            }
            match fs::read_to_string(entry.path())
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<CacheEntryInfo>(&s).map_err(|e| e.to_string()))
            {
                Ok(info) => entries.push(info),
                Err(e) => warn!("Ignoring unreadable cache metadata {}: {}", name, e),
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Key to restore: the exact key, else the newest prefix match
    fn lookup(&self, key: &str, fallback_prefixes: &[String]) -> SetupResult<Option<String>> {
        if self.bundle_path(key).is_file() {
            return Ok(Some(key.to_string()));
        }
        if fallback_prefixes.is_empty() {
            return Ok(None);
        }

        let found = self
            .entries()?
            .into_iter()
            .find(|e| fallback_prefixes.iter().any(|p| e.key.starts_with(p.as_str())))
            .map(|e| e.key);
        Ok(found)
    }

    /// Drop an entry that can no longer be restored so the next save replaces it
    fn discard(&self, key: &str) {
        for path in [self.bundle_path(key), self.meta_path(key)] {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }

    fn write_meta(&self, key: &str, paths: &[PathBuf]) -> SetupResult<()> {
        let size_bytes = fs::metadata(self.bundle_path(key))
            .map(|m| m.len())
            .unwrap_or(0);
        let info = CacheEntryInfo {
            key: key.to_string(),
            created_at: Utc::now(),
            paths: paths.to_vec(),
            size_bytes,
        };
        let json = serde_json::to_string_pretty(&info)?;
        let meta = self.meta_path(key);
        fs::write(&meta, json).map_err(|e| SetupError::io(format!("writing {}", meta.display()), e))
    }
}

#[async_trait]
impl CacheBackend for LocalCache {
    async fn restore(
        &self,
        paths: &[PathBuf],
        key: &str,
        fallback_prefixes: &[String],
    ) -> SetupResult<Option<String>> {
        let Some(matched) = self.lookup(key, fallback_prefixes)? else {
            debug!("No cache entry for {}", key);
            return Ok(None);
        };

        let bundle_path = self.bundle_path(&matched);
        let targets = paths.to_vec();
        info!("Restoring {} from {}", matched, bundle_path.display());

        let unpacked = tokio::task::spawn_blocking(move || bundle::unpack(&bundle_path, &targets))
            .await
            .map_err(|e| SetupError::CacheRestore {
                key: matched.clone(),
                reason: e.to_string(),
            })?;

        if let Err(e) = unpacked {
            warn!("Failed to restore cache entry {}: {}", matched, e);
            self.discard(&matched);
            return Ok(None);
        }

        Ok(Some(matched))
    }

    async fn save(&self, paths: &[PathBuf], key: &str) -> SetupResult<()> {
        let dest = self.bundle_path(key);
        if dest.exists() {
            info!("Cache entry {} already exists, not saving", key);
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", self.dir.display()), e))?;

        let staging = tempfile::Builder::new()
            .prefix(".save-")
            .suffix(BUNDLE_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| SetupError::io("creating staging bundle", e))?;

        let sources = paths.to_vec();
        let staging = tokio::task::spawn_blocking(move || {
            bundle::pack(&sources, staging.path()).map(|()| staging)
        })
        .await
        .map_err(|e| SetupError::CacheSave {
            key: key.to_string(),
            reason: e.to_string(),
        })??;

        if let Err(e) = staging.persist_noclobber(&dest) {
            if dest.exists() {
                // Another writer finished first
                info!("Cache entry {} was saved concurrently", key);
                return Ok(());
            }
            return Err(SetupError::CacheSave {
                key: key.to_string(),
                reason: e.error.to_string(),
            });
        }

        self.write_meta(key, paths)?;
        info!("Saved cache entry {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package(dir: &TempDir, marker: &str) -> PathBuf {
        let pkg = dir.path().join("package");
        fs::create_dir_all(pkg.join("include")).unwrap();
        fs::write(pkg.join("include/marker.h"), marker).unwrap();
        pkg
    }

    #[tokio::test]
    async fn save_then_restore() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().join("bundles"));

        let work = TempDir::new().unwrap();
        let pkg = package(&work, "v1");
        cache.save(&[pkg.clone()], "setup-sdl-abc").await.unwrap();

        fs::remove_dir_all(&pkg).unwrap();
        let matched = cache.restore(&[pkg.clone()], "setup-sdl-abc", &[]).await.unwrap();
        assert_eq!(matched.as_deref(), Some("setup-sdl-abc"));
        assert_eq!(fs::read_to_string(pkg.join("include/marker.h")).unwrap(), "v1");
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        let work = TempDir::new().unwrap();
        let target = work.path().join("package");

        assert_eq!(cache.restore(&[target.clone()], "nope", &[]).await.unwrap(), None);
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn existing_key_is_not_overwritten() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());

        let first = TempDir::new().unwrap();
        cache.save(&[package(&first, "first")], "k").await.unwrap();
        let second = TempDir::new().unwrap();
        cache.save(&[package(&second, "second")], "k").await.unwrap();

        let out = TempDir::new().unwrap();
        let target = out.path().join("package");
        cache.restore(&[target.clone()], "k", &[]).await.unwrap();
        assert_eq!(fs::read_to_string(target.join("include/marker.h")).unwrap(), "first");
    }

    #[tokio::test]
    async fn corrupt_bundle_is_a_miss_and_gets_replaced() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        fs::write(cache.bundle_path("k"), b"truncated upload").unwrap();

        let work = TempDir::new().unwrap();
        let target = work.path().join("package");
        assert_eq!(cache.restore(&[target.clone()], "k", &[]).await.unwrap(), None);
        assert!(!target.exists());
        assert!(!cache.bundle_path("k").exists());

        cache.save(&[package(&work, "rebuilt")], "k").await.unwrap();
        fs::remove_dir_all(&target).unwrap();
        assert_eq!(
            cache.restore(&[target.clone()], "k", &[]).await.unwrap().as_deref(),
            Some("k")
        );
        assert_eq!(fs::read_to_string(target.join("include/marker.h")).unwrap(), "rebuilt");
    }

    #[tokio::test]
    async fn fallback_prefix_matches_newest_entry() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        let work = TempDir::new().unwrap();
        cache
            .save(&[package(&work, "old")], "setup-sdl-linux-old")
            .await
            .unwrap();

        let out = TempDir::new().unwrap();
        let target = out.path().join("package");
        let matched = cache
            .restore(
                &[target.clone()],
                "setup-sdl-linux-new",
                &["setup-sdl-linux-".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(matched.as_deref(), Some("setup-sdl-linux-old"));
        assert!(target.join("include/marker.h").exists());
    }

    #[tokio::test]
    async fn entries_lists_saved_bundles() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        assert!(cache.entries().unwrap().is_empty());

        let work = TempDir::new().unwrap();
        let pkg = package(&work, "x");
        cache.save(&[pkg.clone()], "setup-sdl-1").await.unwrap();

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "setup-sdl-1");
        assert_eq!(entries[0].paths, vec![pkg]);
        assert!(entries[0].size_bytes > 0);
    }
}
