//! Gzip'd tar bundles holding several directories
//!
//! Directory `i` of a bundle is stored under the top-level entry `i/`.
//! Symlinks are stored as links so shared library aliases survive.

use crate::error::{SetupError, SetupResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write `paths` into a bundle at `dest`
pub fn pack(paths: &[PathBuf], dest: &Path) -> SetupResult<()> {
    let file = File::create(dest)
        .map_err(|e| SetupError::io(format!("creating bundle {}", dest.display()), e))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for (index, path) in paths.iter().enumerate() {
        if !path.is_dir() {
            return Err(SetupError::Archive(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        builder
            .append_dir_all(index.to_string(), path)
            .map_err(|e| SetupError::Archive(format!("adding {}: {}", path.display(), e)))?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|e| SetupError::Archive(format!("finishing bundle: {}", e)))?;
    let mut writer = encoder
        .finish()
        .map_err(|e| SetupError::Archive(format!("compressing bundle: {}", e)))?;
    writer
        .flush()
        .map_err(|e| SetupError::io(format!("writing bundle {}", dest.display()), e))
}

/// Restore a bundle into `paths`.
///
/// The archive is unpacked into a staging directory beside the first path and
/// only renamed into place once every entry extracted successfully.
pub fn unpack(bundle: &Path, paths: &[PathBuf]) -> SetupResult<()> {
    let Some(first) = paths.first() else {
        return Ok(());
    };
    let parent = first.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|e| SetupError::io(format!("creating {}", parent.display()), e))?;

    let staging = tempfile::Builder::new()
        .prefix(".restore-")
        .tempdir_in(parent)
        .map_err(|e| SetupError::io("creating staging directory", e))?;

    let file = File::open(bundle)
        .map_err(|e| SetupError::io(format!("opening bundle {}", bundle.display()), e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive
        .unpack(staging.path())
        .map_err(|e| SetupError::Archive(format!("extracting {}: {}", bundle.display(), e)))?;

    for index in 0..paths.len() {
        let staged = staging.path().join(index.to_string());
        if !staged.is_dir() {
            return Err(SetupError::Archive(format!(
                "bundle {} has no entry for path {}",
                bundle.display(),
                index
            )));
        }
    }

    for (index, target) in paths.iter().enumerate() {
        if target.exists() {
            fs::remove_dir_all(target)
                .map_err(|e| SetupError::io(format!("replacing {}", target.display()), e))?;
        }
        if let Some(target_parent) = target.parent() {
            fs::create_dir_all(target_parent).map_err(|e| {
                SetupError::io(format!("creating {}", target_parent.display()), e)
            })?;
        }
        fs::rename(staging.path().join(index.to_string()), target)
            .map_err(|e| SetupError::io(format!("moving restore into {}", target.display()), e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pack_then_unpack_reproduces_tree() {
        let src = TempDir::new().unwrap();
        let pkg = src.path().join("package");
        fs::create_dir_all(pkg.join("include/SDL3")).unwrap();
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(pkg.join("include/SDL3/SDL.h"), "/* sdl */").unwrap();
        fs::write(pkg.join("lib/libSDL3.so.0"), b"\x7fELF").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("libSDL3.so.0", pkg.join("lib/libSDL3.so")).unwrap();

        let store = TempDir::new().unwrap();
        let bundle = store.path().join("b.tar.gz");
        pack(&[pkg.clone()], &bundle).unwrap();

        let dest = TempDir::new().unwrap();
        let restored = dest.path().join("deep/package");
        unpack(&bundle, &[restored.clone()]).unwrap();

        assert_eq!(
            fs::read_to_string(restored.join("include/SDL3/SDL.h")).unwrap(),
            "/* sdl */"
        );
        #[cfg(unix)]
        assert!(fs::symlink_metadata(restored.join("lib/libSDL3.so"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn unpack_replaces_existing_target() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("new.txt"), "new").unwrap();
        let store = TempDir::new().unwrap();
        let bundle = store.path().join("b.tar.gz");
        pack(&[src.path().to_path_buf()], &bundle).unwrap();

        let dest = TempDir::new().unwrap();
        let target = dest.path().join("pkg");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();

        unpack(&bundle, &[target.clone()]).unwrap();
        assert!(target.join("new.txt").exists());
        assert!(!target.join("stale.txt").exists());
    }

    #[test]
    fn corrupt_bundle_leaves_target_untouched() {
        let store = TempDir::new().unwrap();
        let bundle = store.path().join("bad.tar.gz");
        fs::write(&bundle, b"definitely not gzip").unwrap();

        let dest = TempDir::new().unwrap();
        let target = dest.path().join("pkg");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.txt"), "keep").unwrap();

        assert!(unpack(&bundle, &[target.clone()]).is_err());
        assert!(target.join("keep.txt").exists());
        // Staging directory cleaned up
        let leftovers: Vec<_> = fs::read_dir(dest.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn pack_rejects_missing_directory() {
        let store = TempDir::new().unwrap();
        let err = pack(
            &[store.path().join("missing")],
            &store.path().join("b.tar.gz"),
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::Archive(_)));
    }
}
