//! Resolve command - show which git reference a requirement selects

use crate::cli::args::ResolveArgs;
use crate::config::Config;
use crate::error::SetupResult;
use crate::git::{self, GitCli};
use crate::version::{self, ReleaseCatalog, ResolvedRevision, VersionRequirement};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    requirement: String,
    #[serde(flatten)]
    revision: &'a ResolvedRevision,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
}

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config) -> SetupResult<()> {
    let requirement = VersionRequirement::parse(&args.version)?;
    let revision = version::resolve(&requirement, args.pre_release, &ReleaseCatalog::builtin())?;

    let commit = if args.commit {
        Some(git::resolve_commit(&GitCli::new(), &config.source.git_url, &revision.reference).await?)
    } else {
        None
    };

    if args.json {
        let output = ResolveOutput {
            requirement: requirement.to_string(),
            revision: &revision,
            commit,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", revision.reference);
    if let Some(commit) = commit {
        println!("{}", commit);
    }
    Ok(())
}
