//! CLI argument definitions using clap derive
//!
//! `install` and `hash` take the action's inputs. Every input falls back to
//! the `INPUT_*` variable the Actions runner sets for it, so the binary can
//! run as a step with no flags at all.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// setup-sdl - provision a pinned SDL build for CI jobs
///
/// Resolves a version requirement to a commit, restores the matching build
/// from cache or builds it with CMake, and exports its location.
#[derive(Parser, Debug)]
#[command(name = "setup-sdl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SETUP_SDL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, restore or build, and export SDL
    Install(InstallArgs),

    /// Resolve a version requirement to a git reference
    Resolve(ResolveArgs),

    /// List known SDL releases
    Releases(ReleasesArgs),

    /// Print the SDL version installed under a prefix
    Detect(DetectArgs),

    /// Print the state hash and cache key for the current inputs
    Hash(HashArgs),

    /// Show or initialise configuration
    Config(ConfigArgs),
}

/// A boolean action input.
///
/// Keeps the raw text because the raw input is what enters the state hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBool {
    raw: String,
    value: bool,
}

impl ActionBool {
    pub fn value(&self) -> bool {
        self.value
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ActionBool {
    type Err = String;

    /// Accepts the YAML 1.2 core schema booleans, like the runner does
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_string();
        let value = match raw.as_str() {
            "true" | "True" | "TRUE" => true,
            "false" | "False" | "FALSE" => false,
            _ => {
                return Err(format!(
                    "'{}' is not a boolean (use true/True/TRUE or false/False/FALSE)",
                    s
                ))
            }
        };
        Ok(Self { raw, value })
    }
}

/// Action inputs shared by `install` and `hash`
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Version requirement: X.Y.Z, N, N-latest, N-head, or a git reference
    #[arg(long = "sdl-version", env = "INPUT_VERSION")]
    pub version: String,

    /// Allow pre-releases when resolving
    #[arg(long, env = "INPUT_PRE-RELEASE", default_value = "false", value_parser = ActionBool::from_str)]
    pub pre_release: ActionBool,

    /// CMake build type
    #[arg(long, env = "INPUT_BUILD-TYPE", default_value = "Release")]
    pub build_type: String,

    /// CMake toolchain file, relative to the current or workspace directory
    #[arg(long, env = "INPUT_CMAKE-TOOLCHAIN-FILE", default_value = "")]
    pub cmake_toolchain_file: String,

    /// Free-form value mixed into the cache key
    #[arg(long, env = "INPUT_DISCRIMINATOR", default_value = "")]
    pub discriminator: String,

    /// Build with Ninja
    #[arg(long, env = "INPUT_NINJA", default_value = "true", value_parser = ActionBool::from_str)]
    pub ninja: ActionBool,

    /// Shell template for build commands (e.g. `msys2 {0}`)
    #[arg(long, env = "INPUT_SHELL", default_value = "")]
    pub shell: String,

    /// Add SDL to library and pkg-config search paths
    #[arg(long, env = "INPUT_ADD-TO-ENVIRONMENT", default_value = "false", value_parser = ActionBool::from_str)]
    pub add_to_environment: ActionBool,

    /// Root directory for sources, builds and packages
    #[arg(long, env = "INPUT_ROOT")]
    pub root: Option<PathBuf>,
}

impl InstallArgs {
    /// Raw value of an action input, as hashed into the build identity
    pub fn input(&self, key: &str) -> Option<String> {
        let value = match key {
            "build-type" => &self.build_type,
            "cmake-toolchain-file" => &self.cmake_toolchain_file,
            "discriminator" => &self.discriminator,
            "ninja" => self.ninja.raw(),
            _ => return None,
        };
        Some(value.trim().to_string())
    }
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Version requirement
    pub version: String,

    /// Allow pre-releases
    #[arg(long)]
    pub pre_release: bool,

    /// Also query the repository for the commit
    #[arg(long)]
    pub commit: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ReleasesArgs {
    /// Only releases of this major version
    #[arg(long)]
    pub major: Option<u64>,

    /// Include pre-releases
    #[arg(long)]
    pub pre_release: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Install prefix to inspect
    pub prefix: PathBuf,
}

#[derive(Parser, Debug)]
pub struct HashArgs {
    #[command(flatten)]
    pub inputs: InstallArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
