//! Hash command - print the build identity for the current inputs

use super::prepare::{prepare, process_env};
use crate::cli::args::HashArgs;
use crate::config::Config;
use crate::error::SetupResult;
use crate::git::GitCli;
use serde_json::json;

/// Execute the hash command
pub async fn execute(args: HashArgs, config: &Config) -> SetupResult<()> {
    let prepared = prepare(&args.inputs, config, &GitCli::new(), process_env).await?;

    if args.json {
        let output = json!({
            "reference": prepared.revision.reference,
            "commit": prepared.commit,
            "platform": prepared.platform,
            "state_hash": prepared.state_hash,
            "cache_key": prepared.cache_key,
            "package_dir": prepared.layout.package_dir(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", prepared.cache_key);
    }
    Ok(())
}
