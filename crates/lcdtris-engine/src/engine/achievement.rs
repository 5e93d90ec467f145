/// Milestones reported to the save collaborator for authenticated players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Achievement {
    /// Four lines cleared by a single lock.
    #[display("tetris")]
    Tetris,
    /// Level 5 reached.
    #[display("level 5")]
    Level5,
    /// Level 10 reached.
    #[display("level 10")]
    Level10,
    /// A hard drop that moved the piece at least one cell.
    #[display("speed demon")]
    SpeedDemon,
}

impl Achievement {
    pub const ALL: [Self; 4] = [
        Achievement::Tetris,
        Achievement::Level5,
        Achievement::Level10,
        Achievement::SpeedDemon,
    ];

    /// Code string understood by the store.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Achievement::Tetris => "TETRIS",
            Achievement::Level5 => "LVL5",
            Achievement::Level10 => "LVL10",
            Achievement::SpeedDemon => "SPEED_DEEMON",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|achievement| achievement.code() == code)
    }

    /// Achievement unlocked when the level becomes `level`, if any.
    #[must_use]
    pub const fn for_level(level: usize) -> Option<Self> {
        match level {
            5 => Some(Achievement::Level5),
            10 => Some(Achievement::Level10),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for achievement in Achievement::ALL {
            assert_eq!(Achievement::from_code(achievement.code()), Some(achievement));
        }
        assert_eq!(Achievement::from_code("LVL7"), None);
    }

    #[test]
    fn test_level_milestones() {
        assert_eq!(Achievement::for_level(4), None);
        assert_eq!(Achievement::for_level(5), Some(Achievement::Level5));
        assert_eq!(Achievement::for_level(10), Some(Achievement::Level10));
        assert_eq!(Achievement::for_level(11), None);
    }
}
