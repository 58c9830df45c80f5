//! Version requirement parsing
//!
//! Grammar, tried in order:
//! - `X.Y.Z` exact release
//! - `N-head` development branch of major `N`
//! - `N` or `N-latest` newest release of major `N`
//! - anything else is a literal git reference (branch, tag or commit)

use crate::error::{SetupError, SetupResult};
use crate::version::SdlVersion;
use std::fmt;

const HEAD_SUFFIX: &str = "-head";
const LATEST_SUFFIX: &str = "-latest";

/// Parsed form of the `version` input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
    /// Fully specified `major.minor.patch`
    Exact(SdlVersion),
    /// Newest release with this major
    MajorLatest { major: u64 },
    /// Development branch tracking this major
    MajorHead { major: u64 },
    /// Opaque git reference, used verbatim
    Literal(String),
}

impl VersionRequirement {
    /// Parse a requirement string.
    ///
    /// Only fails for literals that cannot safely be handed to git.
    pub fn parse(input: &str) -> SetupResult<Self> {
        let input = input.trim();

        if let Ok(version) = semver::Version::parse(input) {
            if version.pre.is_empty() && version.build.is_empty() {
                return Ok(Self::Exact(SdlVersion::from(&version)));
            }
        }

        if let Some(major) = input.strip_suffix(HEAD_SUFFIX).and_then(parse_major) {
            return Ok(Self::MajorHead { major });
        }

        let latest = input.strip_suffix(LATEST_SUFFIX).unwrap_or(input);
        if let Some(major) = parse_major(latest) {
            return Ok(Self::MajorLatest { major });
        }

        validate_literal(input)?;
        Ok(Self::Literal(input.to_string()))
    }

    /// Major version this requirement targets, if any
    pub fn major(&self) -> Option<u64> {
        match self {
            Self::Exact(v) => Some(v.major),
            Self::MajorLatest { major } | Self::MajorHead { major } => Some(*major),
            Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{}", v),
            Self::MajorLatest { major } => write!(f, "{}{}", major, LATEST_SUFFIX),
            Self::MajorHead { major } => write!(f, "{}{}", major, HEAD_SUFFIX),
            Self::Literal(s) => write!(f, "{}", s),
        }
    }
}

fn parse_major(s: &str) -> Option<u64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn validate_literal(input: &str) -> SetupResult<()> {
    let reject = |reason: &str| {
        Err(SetupError::InvalidRequirement {
            requirement: input.to_string(),
            reason: reason.to_string(),
        })
    };

    if input.is_empty() {
        return reject("version must not be empty");
    }
    if input.starts_with('-') {
        return reject("git references cannot start with '-'");
    }
    if input.contains("..") {
        return reject("git references cannot contain '..'");
    }
    if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("git references cannot contain whitespace or control characters");
    }
    Ok(())
}
