//! CLI command implementations

pub mod config;
pub mod detect;
pub mod hash;
pub mod install;
mod prepare;
pub mod releases;
pub mod resolve;

pub use config::execute as config;
pub use detect::execute as detect;
pub use hash::execute as hash;
pub use install::execute as install;
pub use releases::execute as releases;
pub use resolve::execute as resolve;
