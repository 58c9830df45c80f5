//! GitHub Actions output plumbing
//!
//! Step outputs, exported variables and PATH additions go through the
//! runner's file commands (`GITHUB_OUTPUT`, `GITHUB_ENV`, `GITHUB_PATH`).
//! Outside a runner the same information is printed to stdout.

use crate::error::{SetupError, SetupResult};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where job-level results are reported
pub trait OutputSink: Send + Sync {
    /// Open a collapsible log section
    fn start_group(&self, title: &str);

    fn end_group(&self);

    /// Set a step output
    fn set_output(&self, name: &str, value: &str) -> SetupResult<()>;

    /// Set an environment variable for later steps
    fn export_variable(&self, name: &str, value: &str) -> SetupResult<()>;

    /// Prepend a directory to PATH for later steps
    fn add_path(&self, dir: &Path) -> SetupResult<()>;
}

/// Whether the process runs inside a GitHub Actions job
pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Print a `::error::` annotation so the failure shows on the run summary
pub fn annotate_error(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// Escape a workflow command's message part
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// [`OutputSink`] for GitHub Actions runners
#[derive(Debug, Clone, Default)]
pub struct ActionsSink {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
    workflow_commands: bool,
}

impl ActionsSink {
    /// Configure from the runner's environment
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            output_file: file("GITHUB_OUTPUT"),
            env_file: file("GITHUB_ENV"),
            path_file: file("GITHUB_PATH"),
            workflow_commands: in_github_actions(),
        }
    }

    pub fn with_files(output_file: PathBuf, env_file: PathBuf, path_file: PathBuf) -> Self {
        Self {
            output_file: Some(output_file),
            env_file: Some(env_file),
            path_file: Some(path_file),
            workflow_commands: true,
        }
    }

    fn append(path: &Path, content: &str) -> SetupResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SetupError::io(format!("opening {}", path.display()), e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| SetupError::io(format!("writing {}", path.display()), e))
    }
}

/// Render `name=value` in the file-command format.
///
/// Multi-line values use the heredoc form with a delimiter that appears in
/// neither the name nor the value.
pub fn file_command(name: &str, value: &str) -> SetupResult<String> {
    if !value.contains('\n') && !value.contains('\r') {
        return Ok(format!("{}={}\n", name, value));
    }

    let digest = Sha256::digest(format!("{}\0{}", name, value).as_bytes());
    let delimiter = format!("ghadelimiter_{}", &hex::encode(digest)[..32]);
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(SetupError::Internal(format!(
            "value of {} contains the heredoc delimiter",
            name
        )));
    }
    Ok(format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter))
}

impl OutputSink for ActionsSink {
    fn start_group(&self, title: &str) {
        if self.workflow_commands {
            println!("::group::{}", escape_data(title));
        } else {
            println!("{}", console::style(title).bold());
        }
    }

    fn end_group(&self) {
        if self.workflow_commands {
            println!("::endgroup::");
        }
    }

    fn set_output(&self, name: &str, value: &str) -> SetupResult<()> {
        match self.output_file {
            Some(ref path) => Self::append(path, &file_command(name, value)?),
            None => {
                println!("{}={}", name, value);
                Ok(())
            }
        }
    }

    fn export_variable(&self, name: &str, value: &str) -> SetupResult<()> {
        match self.env_file {
            Some(ref path) => Self::append(path, &file_command(name, value)?),
            None => {
                println!("export {}=\"{}\"", name, value);
                Ok(())
            }
        }
    }

    fn add_path(&self, dir: &Path) -> SetupResult<()> {
        match self.path_file {
            Some(ref path) => Self::append(path, &format!("{}\n", dir.display())),
            None => {
                println!("add to PATH: {}", dir.display());
                Ok(())
            }
        }
    }
}

/// Sink that records every call, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
impl OutputSink for MemorySink {
    fn start_group(&self, title: &str) {
        self.push(format!("group:{}", title));
    }

    fn end_group(&self) {
        self.push("endgroup".to_string());
    }

    fn set_output(&self, name: &str, value: &str) -> SetupResult<()> {
        self.push(format!("output:{}={}", name, value));
        Ok(())
    }

    fn export_variable(&self, name: &str, value: &str) -> SetupResult<()> {
        self.push(format!("env:{}={}", name, value));
        Ok(())
    }

    fn add_path(&self, dir: &Path) -> SetupResult<()> {
        self.push(format!("path:{}", dir.display()));
        Ok(())
    }
}
