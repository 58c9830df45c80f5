//! Build identity and state hashing
//!
//! The state hash is the SHA-256 of every input that can change the produced
//! artifact, serialized in a fixed order. Anything outside the allow-lists
//! below is ignored so unrelated environment churn keeps hitting the cache.
//!
//! # Serialization
//!
//! ```text
//! ENVIRONMENT##AR=..##CC=..##..##INPUTS##build-type=..##..##MISC##GIT_HASH=..##..
//! ```
//!
//! Absent and empty values both serialize as `KEY=`. Changing this format
//! changes every cache key.

pub mod toolchain;

pub use toolchain::{hash_toolchain_file, resolve_toolchain_file};

use crate::platform::BuildPlatform;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Environment variables that influence the compiled artifact, in hash order
pub const ENV_KEYS: &[&str] = &[
    "AR",
    "CC",
    "CXX",
    "ARFLAGS",
    "CFLAGS",
    "CXXFLAGS",
    "INCLUDES",
    "LDFLAGS",
    "LIB",
    "LIBPATH",
    "CMAKE_PREFIX_PATH",
    "PKG_CONFIG_PATH",
];

/// Action inputs that influence the artifact, in hash order
pub const INPUT_KEYS: &[&str] = &["build-type", "cmake-toolchain-file", "discriminator", "ninja"];

/// Prefix of every artifact cache key
pub const CACHE_KEY_PREFIX: &str = "setup-sdl";

const DELIMITER: &str = "##";

/// Everything folded into the state hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    environment: Vec<(&'static str, String)>,
    inputs: Vec<(&'static str, String)>,
    git_hash: String,
    platform: BuildPlatform,
    shell: String,
    toolchain_digest: Option<String>,
}

impl BuildIdentity {
    /// Start an identity with empty environment and inputs
    pub fn new(git_hash: impl Into<String>, platform: BuildPlatform, shell: impl Into<String>) -> Self {
        Self {
            environment: ENV_KEYS.iter().map(|k| (*k, String::new())).collect(),
            inputs: INPUT_KEYS.iter().map(|k| (*k, String::new())).collect(),
            git_hash: git_hash.into(),
            platform,
            shell: shell.into(),
            toolchain_digest: None,
        }
    }

    /// Capture the allow-listed environment through `lookup`
    pub fn with_environment(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (key, value) in &mut self.environment {
            *value = lookup(*key).unwrap_or_default();
        }
        self
    }

    /// Capture the allow-listed inputs through `lookup`
    pub fn with_inputs(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (key, value) in &mut self.inputs {
            *value = lookup(*key).unwrap_or_default();
        }
        self
    }

    /// Content digest of the configured toolchain file
    pub fn with_toolchain_digest(mut self, digest: Option<String>) -> Self {
        self.toolchain_digest = digest;
        self
    }

    pub fn git_hash(&self) -> &str {
        &self.git_hash
    }

    pub fn platform(&self) -> BuildPlatform {
        self.platform
    }

    /// Ordered token list, section markers included
    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.environment.len() + self.inputs.len() + 7);

        tokens.push("ENVIRONMENT".to_string());
        tokens.extend(self.environment.iter().map(|(k, v)| format!("{}={}", k, v)));

        tokens.push("INPUTS".to_string());
        tokens.extend(self.inputs.iter().map(|(k, v)| format!("{}={}", k, v)));

        tokens.push("MISC".to_string());
        tokens.push(format!("GIT_HASH={}", self.git_hash));
        tokens.push(format!("build_platform={}", self.platform));
        tokens.push(format!("shell={}", self.shell));
        if let Some(ref digest) = self.toolchain_digest {
            tokens.push(format!("cmake_toolchain_file_hash={}", digest));
        }

        tokens
    }

    /// The exact string that gets hashed
    pub fn state_string(&self) -> String {
        self.tokens().join(DELIMITER)
    }
}

/// SHA-256 of the identity's state string, as 64 lowercase hex characters
pub fn compute_state_hash(identity: &BuildIdentity) -> String {
    let state = identity.state_string();
    debug!("state_string={}", state);

    let mut hasher = Sha256::new();
    hasher.update(state.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for a state hash
pub fn cache_key(state_hash: &str) -> String {
    format!("{}-{}", CACHE_KEY_PREFIX, state_hash)
}
