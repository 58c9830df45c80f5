//! Releases command - list the built-in release catalog

use crate::cli::args::{OutputFormat, ReleasesArgs};
use crate::error::SetupResult;
use crate::ui::{self, UiContext};
use crate::version::{ReleaseCatalog, ReleaseCatalogEntry};
use console::style;

/// Execute the releases command
pub async fn execute(args: ReleasesArgs) -> SetupResult<()> {
    let catalog = ReleaseCatalog::builtin();
    let entries = select(&catalog, args.major, args.pre_release);

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}\t{}", entry.version, entry.tag);
            }
        }
    }

    Ok(())
}

/// Entries to show, newest first
fn select(
    catalog: &ReleaseCatalog,
    major: Option<u64>,
    include_prerelease: bool,
) -> Vec<&ReleaseCatalogEntry> {
    catalog
        .entries()
        .iter()
        .rev()
        .filter(|e| include_prerelease || !e.is_prerelease)
        .filter(|e| major.is_none_or(|m| e.version.major == m))
        .collect()
}

fn print_table(entries: &[&ReleaseCatalogEntry]) {
    let ctx = UiContext::detect();
    if entries.is_empty() {
        ui::step_info(&ctx, "No matching releases");
        return;
    }

    ui::intro(&ctx, "SDL releases");
    println!(
        "{:<12} {:<24} {}",
        style("VERSION").bold(),
        style("TAG").bold(),
        style("KIND").bold()
    );
    println!("{}", "-".repeat(48));

    for entry in entries {
        let kind = if entry.is_prerelease {
            style("pre-release").yellow()
        } else {
            style("release").green()
        };
        println!("{:<12} {:<24} {}", entry.version.to_string(), entry.tag, kind);
    }
}
