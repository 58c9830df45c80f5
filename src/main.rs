//! setup-sdl CLI entry point

use clap::Parser;
use console::style;
use setup_sdl::actions;
use setup_sdl::cli::{Cli, Commands, LogFormat};
use setup_sdl::config::ConfigManager;
use setup_sdl::error::SetupResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if actions::in_github_actions() {
                actions::annotate_error(&e.to_string());
            }
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SetupResult<()> {
    let cli = Cli::parse();

    // 0 = info, 1 = debug, 2+ = trace
    let filter = match cli.verbose {
        0 => EnvFilter::new("setup_sdl=info"),
        1 => EnvFilter::new("setup_sdl=debug"),
        _ => EnvFilter::new("setup_sdl=trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match cli.log_format {
        LogFormat::Text => subscriber.without_time().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load().await?;

    match cli.command {
        Commands::Install(args) => setup_sdl::cli::commands::install(args, &config).await,
        Commands::Resolve(args) => setup_sdl::cli::commands::resolve(args, &config).await,
        Commands::Releases(args) => setup_sdl::cli::commands::releases(args).await,
        Commands::Detect(args) => setup_sdl::cli::commands::detect(args).await,
        Commands::Hash(args) => setup_sdl::cli::commands::hash(args, &config).await,
        Commands::Config(args) => setup_sdl::cli::commands::config(args, &manager, &config).await,
    }
}
