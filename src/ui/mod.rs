//! Terminal output for people watching a run
//!
//! Uses `cliclack` in interactive terminals and falls back to plain lines
//! in CI, where the Actions log is the audience.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, key_value, outro_success, step_info, step_ok_detail, step_warn_hint};
pub use progress::{DownloadProgress, TaskSpinner};
