//! Detect command - report the SDL version installed under a prefix

use crate::cli::args::DetectArgs;
use crate::error::SetupResult;
use crate::version::detect_version;

/// Execute the detect command
pub async fn execute(args: DetectArgs) -> SetupResult<()> {
    let version = detect_version(&args.prefix)?;
    println!("{}", version);
    Ok(())
}
