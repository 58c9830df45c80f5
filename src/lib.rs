//! setup-sdl - provision a pinned SDL build for CI jobs
//!
//! Resolves a version requirement to a commit, derives a state hash from
//! everything that affects the build, and either restores the package from
//! cache or builds it from source with CMake.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod cmake;
pub mod config;
pub mod error;
pub mod git;
pub mod ninja;
pub mod orchestration;
pub mod platform;
pub mod state;
pub mod ui;
pub mod version;

pub use error::{SetupError, SetupResult};
