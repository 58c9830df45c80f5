//! Source control access
//!
//! The state hash is keyed by commit, never by symbolic name, so every
//! resolved reference goes through [`resolve_commit`] before hashing.

use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Name the upstream is registered under in a fresh checkout
const REMOTE_NAME: &str = "SDL";

/// One line of `git ls-remote` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub hash: String,
    pub name: String,
}

/// Source control operations the orchestrator depends on
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// List upstream refs matching `reference`
    async fn list_remote_refs(&self, url: &str, reference: &str) -> SetupResult<Vec<RemoteRef>>;

    /// Create `into`, fetch exactly `commit` at depth one and check it out
    async fn shallow_checkout(&self, url: &str, commit: &str, into: &Path) -> SetupResult<()>;
}

/// Convert a branch, tag or commit name to the commit it points at
pub async fn resolve_commit(
    source: &dyn SourceControl,
    url: &str,
    reference: &str,
) -> SetupResult<String> {
    let refs = source.list_remote_refs(url, reference).await?;
    let commit = select_commit(&refs, reference).ok_or_else(|| SetupError::RefNotFound {
        reference: reference.to_string(),
        url: url.to_string(),
    })?;
    info!("git hash of {} = {}", reference, commit);
    Ok(commit)
}

/// Parse `<hash>\t<ref>` lines
pub fn parse_ls_remote(output: &str) -> Vec<RemoteRef> {
    output
        .lines()
        .filter_map(|line| {
            let (hash, name) = line.split_once('\t')?;
            let hash = hash.trim();
            if hash.is_empty() {
                return None;
            }
            Some(RemoteRef {
                hash: hash.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Pick the commit for `reference` out of `refs`.
///
/// A peeled annotated tag wins over the tag object itself. A full hex commit
/// id that no ref matches is taken as-is.
pub fn select_commit(refs: &[RemoteRef], reference: &str) -> Option<String> {
    let candidates = [
        format!("refs/tags/{}^{{}}", reference),
        reference.to_string(),
        format!("refs/heads/{}", reference),
        format!("refs/tags/{}", reference),
    ];

    for candidate in &candidates {
        if let Some(found) = refs.iter().find(|r| &r.name == candidate) {
            return Some(found.hash.clone());
        }
    }

    if is_commit_id(reference) {
        return Some(reference.to_ascii_lowercase());
    }
    None
}

fn is_commit_id(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// [`SourceControl`] backed by the `git` executable
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    /// Run git with piped output, returning stdout
    async fn capture(&self, args: &[&str]) -> SetupResult<String> {
        debug!("Executing: git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SetupError::command_failed(format!("git {}", args.join(" ")), e))?;

        if !output.status.success() {
            debug!("git stderr: {}", String::from_utf8_lossy(&output.stderr));
            return Err(SetupError::subprocess(
                format!("git {}", args.first().unwrap_or(&"")),
                output.status,
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git in `dir` with inherited output so it shows in the job log
    async fn run_in(&self, dir: &Path, args: &[&str]) -> SetupResult<()> {
        info!("Executing \"git {}\"", args.join(" "));

        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| SetupError::command_failed(format!("git {}", args.join(" ")), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(SetupError::subprocess(
                format!("git {}", args.first().unwrap_or(&"")),
                status,
            ))
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn list_remote_refs(&self, url: &str, reference: &str) -> SetupResult<Vec<RemoteRef>> {
        info!("Executing \"git ls-remote {} {}\"", url, reference);
        let stdout = self.capture(&["ls-remote", url, reference]).await?;
        Ok(parse_ls_remote(&stdout))
    }

    async fn shallow_checkout(&self, url: &str, commit: &str, into: &Path) -> SetupResult<()> {
        tokio::fs::create_dir_all(into)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", into.display()), e))?;

        self.run_in(into, &["init"]).await?;
        self.run_in(into, &["remote", "add", REMOTE_NAME, url]).await?;
        self.run_in(into, &["fetch", "--depth", "1", REMOTE_NAME, commit])
            .await?;
        self.run_in(into, &["checkout", "FETCH_HEAD"]).await
    }
}
