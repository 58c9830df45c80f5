//! CMake configure, build and install
//!
//! Each step is one blocking subprocess. A non-zero exit aborts the whole
//! sequence; nothing from a failed build is ever cached.

use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::info;

/// Shells that need no indirection; naming one is the same as naming none
const IGNORED_SHELLS: &[&str] = &["bash", "pwsh", "sh", "cmd", "powershell"];

/// Placeholder replaced by the command file path in a shell template
const TEMPLATE_PLACEHOLDER: &str = "{0}";

/// CMake build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Release,
    Debug,
    MinSizeRel,
    RelWithDebInfo,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
            Self::MinSizeRel => "MinSizeRel",
            Self::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl FromStr for BuildType {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Release" => Ok(Self::Release),
            "Debug" => Ok(Self::Debug),
            "MinSizeRel" => Ok(Self::MinSizeRel),
            "RelWithDebInfo" => Ok(Self::RelWithDebInfo),
            other => Err(SetupError::InvalidBuildType(other.to_string())),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How build commands reach the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// No shell requested
    Direct,
    /// A shell without a `{0}` placeholder; commands are still spawned directly
    Named(String),
    /// Write the command line to a file and run the template with `{0}`
    /// replaced by that file's path (e.g. `msys2 {0}`)
    Template(String),
}

impl ShellMode {
    /// Interpret the `shell` input
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || IGNORED_SHELLS.contains(&input) {
            Self::Direct
        } else if input.contains(TEMPLATE_PLACEHOLDER) {
            Self::Template(input.to_string())
        } else {
            Self::Named(input.to_string())
        }
    }

    /// Value recorded in the build identity
    pub fn identity_value(&self) -> &str {
        match self {
            Self::Direct => "",
            Self::Named(s) | Self::Template(s) => s,
        }
    }
}

/// One build-generator subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Step name used in logs and errors
    pub step: &'static str,
    pub program: String,
    pub args: Vec<String>,
    /// Directories prepended to PATH for this process
    pub path_prefix: Vec<PathBuf>,
}

impl Invocation {
    /// Render as a single command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Everything the three CMake steps need
#[derive(Debug, Clone)]
pub struct CmakeBuild {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub package_dir: PathBuf,
    pub build_type: BuildType,
    pub toolchain_file: Option<PathBuf>,
    pub ninja: bool,
}

impl CmakeBuild {
    /// Configure with conventional install subdirectories under the prefix
    pub fn configure(&self) -> Invocation {
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.display().to_string(),
            "-B".to_string(),
            self.build_dir.display().to_string(),
            format!("-DCMAKE_BUILD_TYPE={}", self.build_type),
            "-DCMAKE_INSTALL_BINDIR=bin".to_string(),
            "-DCMAKE_INSTALL_INCLUDEDIR=include".to_string(),
            "-DCMAKE_INSTALL_LIBDIR=lib".to_string(),
        ];
        if let Some(ref toolchain) = self.toolchain_file {
            args.push(format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display()));
        }
        if self.ninja {
            args.push("-GNinja".to_string());
        }
        cmake("cmake configure", args)
    }

    pub fn build(&self) -> Invocation {
        cmake(
            "cmake build",
            vec![
                "--build".to_string(),
                self.build_dir.display().to_string(),
                "--config".to_string(),
                self.build_type.to_string(),
            ],
        )
    }

    pub fn install(&self) -> Invocation {
        cmake(
            "cmake install",
            vec![
                "--install".to_string(),
                self.build_dir.display().to_string(),
                "--prefix".to_string(),
                self.package_dir.display().to_string(),
                "--config".to_string(),
                self.build_type.to_string(),
            ],
        )
    }
}

fn cmake(step: &'static str, args: Vec<String>) -> Invocation {
    Invocation {
        step,
        program: "cmake".to_string(),
        args,
        path_prefix: Vec::new(),
    }
}

/// Runs build-generator subprocesses
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Run to completion; a non-zero exit is an error
    async fn run(&self, invocation: &Invocation, shell: &ShellMode) -> SetupResult<()>;
}

/// [`BuildTool`] spawning real processes with output inherited
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn path_with_prefix(prefix: &[PathBuf]) -> SetupResult<Option<std::ffi::OsString>> {
        if prefix.is_empty() {
            return Ok(None);
        }
        let existing = std::env::var_os("PATH").unwrap_or_default();
        let dirs = prefix
            .iter()
            .cloned()
            .chain(std::env::split_paths(&existing));
        std::env::join_paths(dirs)
            .map(Some)
            .map_err(|e| SetupError::Internal(format!("invalid PATH entry: {}", e)))
    }

    fn write_command_file(command_line: &str) -> SetupResult<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("setup-sdl-cmd")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| SetupError::io("creating command file", e))?;
        file.write_all(command_line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| SetupError::io("writing command file", e))?;
        Ok(file)
    }

    fn shell_command(line: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", line]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", line]);
            cmd
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuildTool for ProcessRunner {
    async fn run(&self, invocation: &Invocation, shell: &ShellMode) -> SetupResult<()> {
        let command_line = invocation.command_line();
        info!("{}", command_line);

        // Held until the process exits so the template can read it
        let mut _command_file = None;
        let mut command = match shell {
            ShellMode::Direct | ShellMode::Named(_) => {
                let mut cmd = Command::new(&invocation.program);
                cmd.args(&invocation.args);
                cmd
            }
            ShellMode::Template(template) => {
                let file = Self::write_command_file(&command_line)?;
                let line = template.replace(TEMPLATE_PLACEHOLDER, &file.path().display().to_string());
                info!("-> {}", line);
                _command_file = Some(file);
                Self::shell_command(&line)
            }
        };

        if let Some(path) = Self::path_with_prefix(&invocation.path_prefix)? {
            command.env("PATH", path);
        }

        let status = command
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| SetupError::command_failed(command_line.clone(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(SetupError::subprocess(invocation.step, status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(toolchain: Option<&str>, ninja: bool) -> CmakeBuild {
        CmakeBuild {
            source_dir: PathBuf::from("/r/h/source"),
            build_dir: PathBuf::from("/r/h/build"),
            package_dir: PathBuf::from("/r/h/package"),
            build_type: BuildType::RelWithDebInfo,
            toolchain_file: toolchain.map(PathBuf::from),
            ninja,
        }
    }

    #[test]
    fn build_type_parsing() {
        assert_eq!("Debug".parse::<BuildType>().unwrap(), BuildType::Debug);
        assert!(matches!(
            "debug".parse::<BuildType>(),
            Err(SetupError::InvalidBuildType(_))
        ));
    }

    #[test]
    fn ignored_shells_mean_direct() {
        for s in ["", "bash", "pwsh", "sh", "cmd", "powershell"] {
            assert_eq!(ShellMode::from_input(s), ShellMode::Direct);
        }
        assert_eq!(
            ShellMode::from_input("msys2 {0}"),
            ShellMode::Template("msys2 {0}".to_string())
        );
        let named = ShellMode::from_input("zsh");
        assert_eq!(named, ShellMode::Named("zsh".to_string()));
        assert_eq!(named.identity_value(), "zsh");
    }

    #[test]
    fn shell_is_trimmed_before_hashing() {
        assert_eq!(ShellMode::from_input("  msys2 {0}\n").identity_value(), "msys2 {0}");
        assert_eq!(ShellMode::from_input(" bash "), ShellMode::Direct);
    }

    #[test]
    fn configure_args() {
        let inv = sample(None, false).configure();
        assert_eq!(inv.program, "cmake");
        assert_eq!(
            inv.args,
            vec![
                "-S",
                "/r/h/source",
                "-B",
                "/r/h/build",
                "-DCMAKE_BUILD_TYPE=RelWithDebInfo",
                "-DCMAKE_INSTALL_BINDIR=bin",
                "-DCMAKE_INSTALL_INCLUDEDIR=include",
                "-DCMAKE_INSTALL_LIBDIR=lib",
            ]
        );
    }

    #[test]
    fn configure_with_toolchain_and_ninja() {
        let inv = sample(Some("/ws/arm.cmake"), true).configure();
        assert!(inv.args.contains(&"-DCMAKE_TOOLCHAIN_FILE=/ws/arm.cmake".to_string()));
        assert_eq!(inv.args.last().unwrap(), "-GNinja");
    }

    #[test]
    fn install_targets_package_dir() {
        let inv = sample(None, false).install();
        assert_eq!(
            inv.command_line(),
            "cmake --install /r/h/build --prefix /r/h/package --config RelWithDebInfo"
        );
    }

    #[test]
    fn command_line_quotes_spaces() {
        let inv = cmake("x", vec!["-S".to_string(), "C:/Program Files/src".to_string()]);
        assert_eq!(inv.command_line(), "cmake -S \"C:/Program Files/src\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_reports_failure() {
        let inv = Invocation {
            step: "false",
            program: "false".to_string(),
            args: Vec::new(),
            path_prefix: Vec::new(),
        };
        let err = ProcessRunner::new().run(&inv, &ShellMode::Direct).await.unwrap_err();
        assert!(matches!(err, SetupError::SubprocessFailed { ref step, .. } if step == "false"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn template_runs_command_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let inv = Invocation {
            step: "touch",
            program: "touch".to_string(),
            args: vec![marker.display().to_string()],
            path_prefix: Vec::new(),
        };
        ProcessRunner::new()
            .run(&inv, &ShellMode::Template("sh {0}".to_string()))
            .await
            .unwrap();
        assert!(marker.exists());
    }
}
