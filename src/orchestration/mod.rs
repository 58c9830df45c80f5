//! Cache-gated build orchestration
//!
//! A run starts with a cache lookup for the package directory. A hit ends
//! the run; a miss checks out the resolved commit, optionally sets up Ninja,
//! configures, builds and installs, then stores the package under the same
//! key. Any failure aborts the run without storing anything.

mod stage;

pub use stage::{Outcome, Stage};

use crate::actions::OutputSink;
use crate::cache::CacheBackend;
use crate::cmake::{BuildTool, BuildType, CmakeBuild, Invocation, ShellMode};
use crate::config::schema::NinjaConfig;
use crate::error::{SetupError, SetupResult};
use crate::git::SourceControl;
use crate::ninja::{self, ToolFetcher};
use crate::platform::{BuildPlatform, StateLayout};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// External collaborators a run is driven through
pub struct Collaborators<'a> {
    pub source: &'a dyn SourceControl,
    pub cache: &'a dyn CacheBackend,
    pub builder: &'a dyn BuildTool,
    pub fetcher: &'a dyn ToolFetcher,
    pub sink: &'a dyn OutputSink,
}

/// Ninja download settings for a run that uses it
#[derive(Debug, Clone)]
pub struct NinjaSetup {
    pub platform: BuildPlatform,
    pub settings: NinjaConfig,
}

/// Everything decided before the first stage runs
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub git_url: String,
    /// Resolved commit to check out
    pub commit: String,
    pub cache_key: String,
    pub layout: StateLayout,
    pub build_type: BuildType,
    pub toolchain_file: Option<PathBuf>,
    pub shell: ShellMode,
    pub ninja: Option<NinjaSetup>,
}

impl BuildPlan {
    fn cmake(&self) -> CmakeBuild {
        CmakeBuild {
            source_dir: self.layout.source_dir(),
            build_dir: self.layout.build_dir(),
            package_dir: self.layout.package_dir(),
            build_type: self.build_type,
            toolchain_file: self.toolchain_file.clone(),
            ninja: self.ninja.is_some(),
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub package_dir: PathBuf,
    pub cache_key: String,
    pub cache_hit: bool,
    /// Directory holding the Ninja binary, when it was set up
    pub ninja_dir: Option<PathBuf>,
    /// Stages visited, in order
    pub stages: Vec<Stage>,
}

pub struct Orchestrator<'a> {
    deps: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(deps: Collaborators<'a>) -> Self {
        Self { deps }
    }

    /// Drive `plan` from cache lookup to `Done`
    pub async fn run(&self, plan: &BuildPlan) -> SetupResult<BuildReport> {
        let mut stage = Stage::CacheLookup;
        let mut stages = Vec::new();
        let mut ninja_dir = None;

        loop {
            stages.push(stage);
            if let Stage::Done { cache_hit } = stage {
                info!(
                    "SDL ready in {} ({})",
                    plan.layout.package_dir().display(),
                    if cache_hit { "restored from cache" } else { "built" }
                );
                return Ok(BuildReport {
                    package_dir: plan.layout.package_dir(),
                    cache_key: plan.cache_key.clone(),
                    cache_hit,
                    ninja_dir,
                    stages,
                });
            }

            self.deps.sink.start_group(stage.title());
            let result = self.enter(stage, plan, &mut ninja_dir).await;
            self.deps.sink.end_group();

            let outcome = result.map_err(|e| {
                error!("Stage {} failed: {}", stage, e);
                e
            })?;
            let next = stage.next(outcome, plan.ninja.is_some());
            debug!("{} -> {}", stage, next);
            stage = next;
        }
    }

    async fn enter(
        &self,
        stage: Stage,
        plan: &BuildPlan,
        ninja_dir: &mut Option<PathBuf>,
    ) -> SetupResult<Outcome> {
        match stage {
            Stage::CacheLookup => self.cache_lookup(plan).await,
            Stage::Checkout => self.checkout(plan).await.map(|()| Outcome::Completed),
            Stage::ToolSetup => {
                *ninja_dir = self.tool_setup(plan).await?;
                Ok(Outcome::Completed)
            }
            Stage::Configure => self.cmake_step(plan.cmake().configure(), plan, ninja_dir).await,
            Stage::Build => self.cmake_step(plan.cmake().build(), plan, ninja_dir).await,
            Stage::Install => self.cmake_step(plan.cmake().install(), plan, ninja_dir).await,
            Stage::CacheStore => {
                self.deps
                    .cache
                    .save(&[plan.layout.package_dir()], &plan.cache_key)
                    .await?;
                Ok(Outcome::Completed)
            }
            Stage::Done { .. } => Err(SetupError::Internal(
                "no work is attached to the done stage".to_string(),
            )),
        }
    }

    async fn cache_lookup(&self, plan: &BuildPlan) -> SetupResult<Outcome> {
        let paths = [plan.layout.package_dir()];
        if let Some(key) = self.deps.cache.restore(&paths, &plan.cache_key, &[]).await? {
            info!("SDL found in the cache: key = {}", key);
            Ok(Outcome::Hit)
        } else {
            info!("No match found in cache. Building SDL from scratch.");
            Ok(Outcome::Miss)
        }
    }

    async fn checkout(&self, plan: &BuildPlan) -> SetupResult<()> {
        let source_dir = plan.layout.source_dir();
        // A previous aborted attempt may have left a partial repository or install
        for dir in [&source_dir, &plan.layout.package_dir()] {
            if dir.exists() {
                tokio::fs::remove_dir_all(dir)
                    .await
                    .map_err(|e| SetupError::io(format!("clearing {}", dir.display()), e))?;
            }
        }
        self.deps
            .source
            .shallow_checkout(&plan.git_url, &plan.commit, &source_dir)
            .await
    }

    async fn tool_setup(&self, plan: &BuildPlan) -> SetupResult<Option<PathBuf>> {
        let Some(ref setup) = plan.ninja else {
            return Ok(None);
        };
        let dir = ninja::ensure_ninja(
            self.deps.cache,
            self.deps.fetcher,
            &setup.settings,
            setup.platform,
            &plan.layout.ninja_dir(),
        )
        .await?;
        Ok(Some(dir))
    }

    async fn cmake_step(
        &self,
        mut invocation: Invocation,
        plan: &BuildPlan,
        ninja_dir: &Option<PathBuf>,
    ) -> SetupResult<Outcome> {
        invocation.path_prefix.extend(ninja_dir.iter().cloned());
        self.deps.builder.run(&invocation, &plan.shell).await?;
        Ok(Outcome::Completed)
    }
}
