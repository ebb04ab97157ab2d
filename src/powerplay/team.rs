use std::fmt;

/// Alliance colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Index into per-team arrays (red 0, blue 1).
    pub fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    /// Value used for ownership in observations (blue 1, red 2).
    pub fn ownership_code(self) -> f64 {
        match self {
            Team::Red => 2.0,
            Team::Blue => 1.0,
        }
    }

    /// Agent-name prefix of this team.
    pub fn prefix(self) -> &'static str {
        match self {
            Team::Red => "red_",
            Team::Blue => "blue_",
        }
    }

    /// Lower-case letter used for owned junctions in renders.
    pub fn symbol(self) -> char {
        match self {
            Team::Red => 'r',
            Team::Blue => 'b',
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}
