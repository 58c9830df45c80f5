//! CMake toolchain file lookup and digest
//!
//! The identity records what the toolchain file contains, not where it is,
//! so moving an identical file does not invalidate the cache.

use crate::error::{SetupError, SetupResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the `cmake-toolchain-file` input to an absolute path.
///
/// Empty input means no toolchain file. Otherwise the path is tried as given
/// (relative to the current directory), then relative to `workspace`.
pub fn resolve_toolchain_file(input: &str, workspace: Option<&Path>) -> SetupResult<Option<PathBuf>> {
    if input.is_empty() {
        return Ok(None);
    }

    let direct = Path::new(input);
    if direct.exists() {
        let absolute = std::path::absolute(direct)
            .map_err(|e| SetupError::io(format!("resolving {}", direct.display()), e))?;
        debug!("Toolchain file: {}", absolute.display());
        return Ok(Some(absolute));
    }

    if let Some(workspace) = workspace {
        let candidate = workspace.join(input);
        if candidate.exists() {
            debug!("Toolchain file (workspace): {}", candidate.display());
            return Ok(Some(candidate));
        }
    }

    Err(SetupError::ToolchainFileNotFound(input.to_string()))
}

/// SHA-256 of the raw file bytes, as lowercase hex
pub fn hash_toolchain_file(path: &Path) -> SetupResult<String> {
    let contents = fs::read(path).map_err(|e| SetupError::ToolchainFileUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}
