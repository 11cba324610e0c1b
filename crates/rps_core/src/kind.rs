//! Agent kinds and the dominance cycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// The three agent kinds.
///
/// Dominance is cyclic: Rock beats Scissors, Scissors beats Paper,
/// Paper beats Rock. Declaration order is also the deterministic
/// iteration order used for batches and per-kind maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

/// Result of comparing one kind against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The left-hand side dominates.
    Win,
    /// The right-hand side dominates.
    Lose,
    /// Same kind, nobody dominates.
    Tie,
}

impl Outcome {
    /// Signed form: `1` win, `-1` lose, `0` tie.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Win => 1,
            Self::Lose => -1,
            Self::Tie => 0,
        }
    }
}

impl Kind {
    /// All kinds in canonical order.
    pub const ALL: [Kind; 3] = [Kind::Rock, Kind::Paper, Kind::Scissors];

    /// The kind this one defeats.
    #[must_use]
    pub const fn prey(self) -> Kind {
        match self {
            Self::Rock => Self::Scissors,
            Self::Paper => Self::Rock,
            Self::Scissors => Self::Paper,
        }
    }

    /// Whether `self` defeats `other`. Never true for the same kind.
    #[must_use]
    pub fn beats(self, other: Kind) -> bool {
        self.prey() == other
    }

    /// Compare against `other` using the dominance cycle.
    #[must_use]
    pub fn compare(self, other: Kind) -> Outcome {
        if self == other {
            Outcome::Tie
        } else if self.beats(other) {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }

    /// Lowercase tag used in config files, events and logs.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }

    /// Capitalized name used by the spawn protocol and scoreboards.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Rock => "Rock",
            Self::Paper => "Paper",
            Self::Scissors => "Scissors",
        }
    }

    /// Dense index in `0..3`, matching [`Kind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Rock => 0,
            Self::Paper => 1,
            Self::Scissors => 2,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Kind {
    type Err = SimError;

    /// Parse a lowercase kind tag (`"rock"`, `"paper"`, `"scissors"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(Self::Rock),
            "paper" => Ok(Self::Paper),
            "scissors" => Ok(Self::Scissors),
            other => Err(SimError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle() {
        assert!(Kind::Rock.beats(Kind::Scissors));
        assert!(Kind::Scissors.beats(Kind::Paper));
        assert!(Kind::Paper.beats(Kind::Rock));
        assert!(!Kind::Rock.beats(Kind::Paper));
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        for a in Kind::ALL {
            assert_eq!(a.compare(a), Outcome::Tie);
            for b in Kind::ALL {
                if a != b {
                    assert_eq!(a.compare(b).as_i8(), -b.compare(a).as_i8());
                    assert_ne!(a.compare(b), Outcome::Tie);
                }
            }
        }
    }

    #[test]
    fn test_parse_tags() {
        for kind in Kind::ALL {
            assert_eq!(kind.tag().parse::<Kind>().unwrap(), kind);
        }
        // Tags are case-sensitive
        assert!(matches!(
            "Rock".parse::<Kind>(),
            Err(SimError::UnknownKind(tag)) if tag == "Rock"
        ));
        assert!("lizard".parse::<Kind>().is_err());
    }

    #[test]
    fn test_index_matches_all() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
