//! Install command - provision SDL and export it to the job

use super::prepare::{prepare, process_env};
use crate::actions::{ActionsSink, OutputSink};
use crate::cache;
use crate::cli::args::InstallArgs;
use crate::cmake::ProcessRunner;
use crate::config::Config;
use crate::error::SetupResult;
use crate::git::GitCli;
use crate::ninja::HttpFetcher;
use crate::orchestration::{BuildPlan, BuildReport, Collaborators, NinjaSetup, Orchestrator};
use crate::platform::{environment_exports, BuildPlatform, EnvExport};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::version::{detect_version, SdlVersion};
use tracing::info;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> SetupResult<()> {
    let ctx = UiContext::detect();
    let sink = ActionsSink::from_env();
    let git = GitCli::new();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Resolving SDL {}...", args.version.trim()));
    let prepared = match prepare(&args, config, &git, process_env).await {
        Ok(p) => p,
        Err(e) => {
            spinner.stop_error("Could not resolve SDL");
            return Err(e);
        }
    };
    spinner.stop(&format!(
        "{} -> {} ({})",
        prepared.requirement,
        prepared.revision.reference,
        &prepared.commit[..prepared.commit.len().min(12)]
    ));

    let plan = BuildPlan {
        git_url: config.source.git_url.clone(),
        commit: prepared.commit.clone(),
        cache_key: prepared.cache_key.clone(),
        layout: prepared.layout.clone(),
        build_type: prepared.build_type,
        toolchain_file: prepared.toolchain_file.clone(),
        shell: prepared.shell.clone(),
        ninja: args.ninja.value().then(|| NinjaSetup {
            platform: prepared.platform,
            settings: config.ninja.clone(),
        }),
    };

    let cache = cache::open_cache(&config.cache);
    let runner = ProcessRunner::new();
    let fetcher = HttpFetcher::with_ui(&ctx);
    let orchestrator = Orchestrator::new(Collaborators {
        source: &git,
        cache: cache.as_ref(),
        builder: &runner,
        fetcher: &fetcher,
        sink: &sink,
    });
    let report = orchestrator.run(&plan).await?;

    let version = detect_version(&report.package_dir)?;
    info!("SDL version is {}", version);

    publish(
        &sink,
        prepared.platform,
        &report,
        version,
        args.add_to_environment.value(),
        process_env,
    )?;

    let how = if report.cache_hit {
        "restored from cache"
    } else {
        "built from source"
    };
    ui::key_value(&ctx, "cache key", &report.cache_key);
    ui::key_value(&ctx, "prefix", &report.package_dir.display().to_string());
    ui::outro_success(&ctx, &format!("SDL {} {}", version, how));
    Ok(())
}

/// Report the package to later job steps
fn publish(
    sink: &dyn OutputSink,
    platform: BuildPlatform,
    report: &BuildReport,
    version: SdlVersion,
    add_to_environment: bool,
    current: impl Fn(&str) -> Option<String>,
) -> SetupResult<()> {
    let prefix = report.package_dir.display().to_string();

    if let Some(ref ninja_dir) = report.ninja_dir {
        sink.add_path(ninja_dir)?;
    }

    if add_to_environment {
        for export in environment_exports(platform, &report.package_dir, current) {
            match export {
                EnvExport::Set { name, value } => sink.export_variable(&name, &value)?,
                EnvExport::AddPath(dir) => sink.add_path(&dir)?,
            }
        }
    }

    sink.export_variable(&format!("SDL{}_ROOT", version.major), &prefix)?;
    sink.set_output("prefix", &prefix)?;
    sink.set_output("version", &version.to_string())
}
