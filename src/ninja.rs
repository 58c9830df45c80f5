//! Ninja build accelerator
//!
//! The binary is not part of the artifact, so it has its own cache key
//! derived from platform and tool version, independent of the state hash.

use crate::cache::CacheBackend;
use crate::config::schema::NinjaConfig;
use crate::error::{SetupError, SetupResult};
use crate::platform::BuildPlatform;
use crate::ui::{DownloadProgress, UiContext};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Downloads an archive and unpacks it into a directory
#[async_trait]
pub trait ToolFetcher: Send + Sync {
    async fn download_and_unpack(&self, url: &str, dest: &Path) -> SetupResult<()>;
}

/// Release asset name for `platform`
fn asset_name(platform: BuildPlatform) -> &'static str {
    match platform {
        BuildPlatform::Linux => "ninja-linux.zip",
        BuildPlatform::Macos => "ninja-mac.zip",
        BuildPlatform::Windows => "ninja-win.zip",
    }
}

pub fn download_url(base_url: &str, platform: BuildPlatform, version: &str) -> String {
    format!(
        "{}/v{}/{}",
        base_url.trim_end_matches('/'),
        version,
        asset_name(platform)
    )
}

pub fn cache_key(platform: BuildPlatform, version: &str) -> String {
    format!("ninja-{}-{}", platform, version)
}

/// Make Ninja available in `dir`, from cache when possible.
///
/// Returns the directory to put on PATH.
pub async fn ensure_ninja(
    cache: &dyn CacheBackend,
    fetcher: &dyn ToolFetcher,
    settings: &NinjaConfig,
    platform: BuildPlatform,
    dir: &Path,
) -> SetupResult<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SetupError::io(format!("creating {}", dir.display()), e))?;

    let key = cache_key(platform, &settings.version);
    let paths = vec![dir.to_path_buf()];

    if cache.restore(&paths, &key, &[]).await?.is_some() {
        info!("Ninja restored from cache ({})", key);
        return Ok(dir.to_path_buf());
    }

    info!("Could not find ninja in the cache.");
    let url = download_url(&settings.base_url, platform, &settings.version);
    info!("Downloading {}.", url);
    fetcher.download_and_unpack(&url, dir).await?;

    cache.save(&paths, &key).await?;
    Ok(dir.to_path_buf())
}

/// [`ToolFetcher`] using HTTPS downloads and zip extraction
pub struct HttpFetcher {
    agent: ureq::Agent,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            show_progress: false,
        }
    }

    /// Show a progress bar while downloading in interactive terminals
    pub fn with_ui(ctx: &UiContext) -> Self {
        Self {
            show_progress: ctx.use_fancy_output(),
            ..Self::new()
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolFetcher for HttpFetcher {
    async fn download_and_unpack(&self, url: &str, dest: &Path) -> SetupResult<()> {
        let agent = self.agent.clone();
        let show_progress = self.show_progress;
        let url = url.to_string();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let archive = download(&agent, &url, show_progress)?;
            info!("Extracting {}.", archive.path().display());
            unpack_zip(archive.path(), &dest)
        })
        .await
        .map_err(|e| SetupError::Internal(format!("download task failed: {}", e)))?
    }
}

fn download(
    agent: &ureq::Agent,
    url: &str,
    show_progress: bool,
) -> SetupResult<tempfile::NamedTempFile> {
    let download_err = |reason: String| SetupError::Download {
        url: url.to_string(),
        reason,
    };

    let mut response = match agent.get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::StatusCode(code)) => return Err(download_err(format!("HTTP {}", code))),
        Err(e) => return Err(download_err(e.to_string())),
    };

    let mut file = tempfile::Builder::new()
        .prefix("setup-sdl-download")
        .suffix(".zip")
        .tempfile()
        .map_err(|e| SetupError::io("creating download file", e))?;
    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let progress = DownloadProgress::new(show_progress, url, total);
    let copied = io::copy(
        &mut progress.wrap_read(response.body_mut().as_reader()),
        &mut file,
    );
    progress.finish();
    copied.map_err(|e| download_err(e.to_string()))?;
    check_length(total, progress.position()).map_err(download_err)?;
    debug!("Downloaded {} bytes from {}", progress.position(), url);
    Ok(file)
}

/// A body shorter or longer than its Content-Length is a broken download
fn check_length(expected: Option<u64>, received: u64) -> Result<(), String> {
    match expected {
        Some(expected) if expected != received => Err(format!(
            "received {} bytes, expected {}",
            received, expected
        )),
        _ => Ok(()),
    }
}

/// Extract every entry of a zip archive into `dest`
pub fn unpack_zip(archive_path: &Path, dest: &Path) -> SetupResult<()> {
    fs::create_dir_all(dest).map_err(|e| SetupError::io(format!("creating {}", dest.display()), e))?;

    let file = File::open(archive_path)
        .map_err(|e| SetupError::io(format!("opening {}", archive_path.display()), e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| SetupError::Archive(format!("Failed to open zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| SetupError::Archive(format!("Failed to read zip entry: {}", e)))?;
        let rel = entry
            .enclosed_name()
            .ok_or_else(|| SetupError::Archive("Invalid zip entry name".to_string()))?;
        let out_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| SetupError::io(format!("creating {}", out_path.display()), e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SetupError::io(format!("creating {}", parent.display()), e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| SetupError::io(format!("creating {}", out_path.display()), e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| SetupError::io(format!("writing {}", out_path.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                    .map_err(|e| SetupError::io(format!("chmod {}", out_path.display()), e))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCache;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct CountingFetcher {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ToolFetcher for CountingFetcher {
        async fn download_and_unpack(&self, url: &str, dest: &Path) -> SetupResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            fs::write(dest.join("ninja"), url).unwrap();
            Ok(())
        }
    }

    fn settings() -> NinjaConfig {
        NinjaConfig::default()
    }

    #[test]
    fn urls_and_keys() {
        assert_eq!(
            download_url(
                "https://github.com/ninja-build/ninja/releases/download/",
                BuildPlatform::Macos,
                "1.11.1"
            ),
            "https://github.com/ninja-build/ninja/releases/download/v1.11.1/ninja-mac.zip"
        );
        assert_eq!(cache_key(BuildPlatform::Windows, "1.11.1"), "ninja-Windows-1.11.1");
    }

    #[tokio::test]
    async fn second_setup_hits_cache() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        let fetcher = CountingFetcher::new();

        let first_root = TempDir::new().unwrap();
        let dir = first_root.path().join("ninja");
        ensure_ninja(&cache, &fetcher, &settings(), BuildPlatform::Linux, &dir)
            .await
            .unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let second_root = TempDir::new().unwrap();
        let dir = second_root.path().join("ninja");
        let got = ensure_ninja(&cache, &fetcher, &settings(), BuildPlatform::Linux, &dir)
            .await
            .unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(got.join("ninja").exists());
    }

    #[tokio::test]
    async fn other_version_is_downloaded_not_reused() {
        let store = TempDir::new().unwrap();
        let cache = LocalCache::new(store.path().to_path_buf());
        let fetcher = CountingFetcher::new();

        let old_root = TempDir::new().unwrap();
        ensure_ninja(
            &cache,
            &fetcher,
            &settings(),
            BuildPlatform::Linux,
            &old_root.path().join("ninja"),
        )
        .await
        .unwrap();

        let newer = NinjaConfig {
            version: "1.12.1".to_string(),
            ..settings()
        };
        let new_root = TempDir::new().unwrap();
        let dir = ensure_ninja(
            &cache,
            &fetcher,
            &newer,
            BuildPlatform::Linux,
            &new_root.path().join("ninja"),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        let urls = fetcher.urls.lock().unwrap();
        assert!(urls[1].ends_with("/v1.12.1/ninja-linux.zip"));
        assert_eq!(fs::read_to_string(dir.join("ninja")).unwrap(), urls[1]);
    }

    #[test]
    fn short_download_is_rejected() {
        assert!(check_length(Some(5), 5).is_ok());
        assert!(check_length(None, 3).is_ok());
        assert_eq!(
            check_length(Some(1024), 16).unwrap_err(),
            "received 16 bytes, expected 1024"
        );
    }

    #[test]
    fn unpack_zip_extracts_files() {
        let work = TempDir::new().unwrap();
        let zip_path = work.path().join("ninja-linux.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
            writer.start_file("ninja", options).unwrap();
            writer.write_all(b"binary").unwrap();
            writer.finish().unwrap();
        }

        let dest = work.path().join("out");
        unpack_zip(&zip_path, &dest).unwrap();
        assert_eq!(fs::read(dest.join("ninja")).unwrap(), b"binary");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dest.join("ninja")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
