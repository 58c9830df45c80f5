//! From action inputs to a build identity
//!
//! Shared by `install` and `hash` so both report the same key for the same
//! inputs.

use crate::cli::args::InstallArgs;
use crate::cmake::{BuildType, ShellMode};
use crate::config::Config;
use crate::error::SetupResult;
use crate::git::{self, SourceControl};
use crate::platform::{platform_root, BuildPlatform, StateLayout};
use crate::state::{self, BuildIdentity};
use crate::version::{self, ReleaseCatalog, ResolvedRevision, VersionRequirement};
use std::path::PathBuf;
use tracing::info;

/// Everything known before the orchestrator starts
#[derive(Debug, Clone)]
pub struct Prepared {
    pub platform: BuildPlatform,
    pub requirement: VersionRequirement,
    pub revision: ResolvedRevision,
    pub commit: String,
    pub build_type: BuildType,
    pub shell: ShellMode,
    pub toolchain_file: Option<PathBuf>,
    pub state_hash: String,
    pub cache_key: String,
    pub layout: StateLayout,
}

/// Validate inputs, resolve the commit and compute the state hash.
///
/// `env` stands in for the process environment.
pub async fn prepare(
    args: &InstallArgs,
    config: &Config,
    source: &dyn SourceControl,
    env: impl Fn(&str) -> Option<String>,
) -> SetupResult<Prepared> {
    let platform = BuildPlatform::detect()?;
    info!("build platform={}", platform);

    let root = platform_root(args.root.as_deref(), config.paths.root.as_deref());
    info!("root={}", root.display());

    let shell = ShellMode::from_input(&args.shell);
    let requirement = VersionRequirement::parse(&args.version)?;
    let build_type: BuildType = args.build_type.trim().parse()?;

    let revision = version::resolve(
        &requirement,
        args.pre_release.value(),
        &ReleaseCatalog::builtin(),
    )?;
    let commit = git::resolve_commit(source, &config.source.git_url, &revision.reference).await?;
    info!("{} resolved to {} ({})", requirement, revision.reference, commit);

    let workspace = env("GITHUB_WORKSPACE").map(PathBuf::from);
    let toolchain_file =
        state::resolve_toolchain_file(&args.cmake_toolchain_file, workspace.as_deref())?;
    let toolchain_digest = toolchain_file
        .as_deref()
        .map(state::hash_toolchain_file)
        .transpose()?;

    let identity = BuildIdentity::new(&commit, platform, shell.identity_value())
        .with_environment(&env)
        .with_inputs(|key| args.input(key))
        .with_toolchain_digest(toolchain_digest);
    let state_hash = state::compute_state_hash(&identity);
    info!("setup-sdl state = {}", state_hash);

    Ok(Prepared {
        platform,
        requirement,
        revision,
        cache_key: state::cache_key(&state_hash),
        layout: StateLayout::new(&root, &state_hash),
        commit,
        build_type,
        shell,
        toolchain_file,
        state_hash,
    })
}

/// Look a variable up in the process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
