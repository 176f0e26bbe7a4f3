use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown level: {0}")]
pub struct ParseLevelError(pub String);

/// Difficulty level of a module or video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Accepts the English names plus the Portuguese labels used by older
    /// snapshots (`iniciante`, `intermediario`, `avancado`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "iniciante" => Ok(Level::Beginner),
            "intermediate" | "intermediario" => Ok(Level::Intermediate),
            "advanced" | "avancado" => Ok(Level::Advanced),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

/// Level selector of the module list: everything, or exactly one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(Level),
}

impl LevelFilter {
    /// Returns true if a module of the given level passes this filter.
    #[must_use]
    pub fn matches(self, level: Level) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => wanted == level,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LevelFilter::All => "all",
            LevelFilter::Only(level) => level.as_str(),
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        LevelFilter::Only(level)
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LevelFilter {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "todos" => Ok(LevelFilter::All),
            other => other.parse::<Level>().map(LevelFilter::Only),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips_through_str() {
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn accepts_legacy_labels() {
        assert_eq!("avancado".parse::<Level>().unwrap(), Level::Advanced);
        assert_eq!("todos".parse::<LevelFilter>().unwrap(), LevelFilter::All);
    }

    #[test]
    fn filter_all_matches_every_level() {
        assert!(Level::ALL.iter().all(|l| LevelFilter::All.matches(*l)));
        let only = LevelFilter::Only(Level::Beginner);
        assert!(only.matches(Level::Beginner));
        assert!(!only.matches(Level::Advanced));
    }

    #[test]
    fn rejects_unknown_level() {
        let err = "expert".parse::<LevelFilter>().unwrap_err();
        assert_eq!(err.to_string(), "unknown level: expert");
    }
}
