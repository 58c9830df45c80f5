//! Orchestration states and their transitions

use std::fmt;

/// One step of a provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CacheLookup,
    Checkout,
    /// Fetch the build accelerator, only when requested
    ToolSetup,
    Configure,
    Build,
    Install,
    CacheStore,
    Done { cache_hit: bool },
}

/// Result of completing a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cache lookup restored the package
    Hit,
    /// Cache lookup found nothing
    Miss,
    Completed,
}

impl Stage {
    /// Successor of a stage that finished with `outcome`.
    ///
    /// Failures never reach this function, so `CacheStore` can only follow a
    /// completed `Install`.
    pub fn next(self, outcome: Outcome, use_ninja: bool) -> Stage {
        match (self, outcome) {
            (Self::CacheLookup, Outcome::Hit) => Self::Done { cache_hit: true },
            (Self::CacheLookup, _) => Self::Checkout,
            (Self::Checkout, _) if use_ninja => Self::ToolSetup,
            (Self::Checkout, _) | (Self::ToolSetup, _) => Self::Configure,
            (Self::Configure, _) => Self::Build,
            (Self::Build, _) => Self::Install,
            (Self::Install, _) => Self::CacheStore,
            (Self::CacheStore, _) => Self::Done { cache_hit: false },
            (done @ Self::Done { .. }, _) => done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Log group title
    pub fn title(&self) -> &'static str {
        match self {
            Self::CacheLookup => "Looking up SDL in the cache",
            Self::Checkout => "Checking out SDL sources",
            Self::ToolSetup => "Setting up Ninja",
            Self::Configure => "Configuring SDL",
            Self::Build => "Building SDL",
            Self::Install => "Installing SDL",
            Self::CacheStore => "Storing SDL in the cache",
            Self::Done { .. } => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CacheLookup => "cache-lookup",
            Self::Checkout => "checkout",
            Self::ToolSetup => "tool-setup",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
            Self::CacheStore => "cache-store",
            Self::Done { .. } => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Stage] = &[
        Stage::CacheLookup,
        Stage::Checkout,
        Stage::ToolSetup,
        Stage::Configure,
        Stage::Build,
        Stage::Install,
        Stage::CacheStore,
        Stage::Done { cache_hit: true },
        Stage::Done { cache_hit: false },
    ];

    fn walk(outcome_at_lookup: Outcome, use_ninja: bool) -> Vec<Stage> {
        let mut stage = Stage::CacheLookup;
        let mut seen = vec![stage];
        while !stage.is_done() {
            let outcome = if stage == Stage::CacheLookup {
                outcome_at_lookup
            } else {
                Outcome::Completed
            };
            stage = stage.next(outcome, use_ninja);
            seen.push(stage);
        }
        seen
    }

    #[test]
    fn hit_short_circuits() {
        assert_eq!(
            walk(Outcome::Hit, true),
            vec![Stage::CacheLookup, Stage::Done { cache_hit: true }]
        );
    }

    #[test]
    fn miss_runs_full_sequence() {
        assert_eq!(
            walk(Outcome::Miss, false),
            vec![
                Stage::CacheLookup,
                Stage::Checkout,
                Stage::Configure,
                Stage::Build,
                Stage::Install,
                Stage::CacheStore,
                Stage::Done { cache_hit: false },
            ]
        );
        assert!(walk(Outcome::Miss, true).contains(&Stage::ToolSetup));
    }

    #[test]
    fn cache_store_only_follows_install() {
        for &stage in ALL {
            for outcome in [Outcome::Hit, Outcome::Miss, Outcome::Completed] {
                for ninja in [false, true] {
                    if stage.next(outcome, ninja) == Stage::CacheStore {
                        assert_eq!(stage, Stage::Install);
                    }
                }
            }
        }
    }

    #[test]
    fn done_is_terminal() {
        let done = Stage::Done { cache_hit: false };
        assert_eq!(done.next(Outcome::Completed, true), done);
    }
}
