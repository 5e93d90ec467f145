use log::info;

use super::achievement::Achievement;

/// Base points for line clears, multiplied by the level at the time of the
/// clear.
///
/// Index corresponds to number of lines cleared simultaneously:
/// - 0 lines: 0 points
/// - 1 line: 40 points
/// - 2 lines: 100 points
/// - 3 lines: 300 points
/// - 4 lines: 1200 points
const LINE_SCORE_TABLE: [usize; 5] = [0, 40, 100, 300, 1200];

/// Lines needed per level.
pub const LINES_PER_LEVEL: usize = 10;

/// Points per cell for a hard drop.
const HARD_DROP_POINTS: usize = 2;

/// Points per cell for a player-initiated soft drop.
const SOFT_DROP_POINTS: usize = 1;

/// Score, line and level bookkeeping for one session.
///
/// # Scoring
///
/// - Line clears: `LINE_SCORE_TABLE[n] * level`, using the level before
///   any level-up caused by the same clear
/// - Hard drop: 2 points per cell travelled
/// - Soft drop by the player: 1 point per cell (gravity awards nothing)
///
/// # Level progression
///
/// After each clear the level goes up once for every multiple of
/// [`LINES_PER_LEVEL`] that the line total has passed, so a large clear
/// straddling a threshold never skips a level and never grants two levels
/// for one boundary.
///
/// # Example
///
/// ```
/// use lcdtris_engine::GameStats;
///
/// let mut stats = GameStats::new(1);
/// stats.complete_piece_drop(4);
///
/// assert_eq!(stats.score(), 1200);
/// assert_eq!(stats.lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStats {
    score: usize,
    lines: usize,
    level: usize,
    completed_pieces: usize,
    line_cleared_counter: [usize; 5],
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new(1)
    }
}

impl GameStats {
    /// Creates zeroed statistics starting at `level` (clamped to at least 1).
    #[must_use]
    pub const fn new(level: usize) -> Self {
        Self::restored(0, 0, level)
    }

    /// Statistics resumed from a saved game. The histogram starts empty.
    #[must_use]
    pub const fn restored(score: usize, lines: usize, level: usize) -> Self {
        Self {
            score,
            lines,
            level: if level == 0 { 1 } else { level },
            completed_pieces: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    /// Total lines cleared in this session.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Returns the total number of pieces that have been locked into place.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    /// Returns a histogram of line clears by count.
    ///
    /// Array indices represent:
    /// - `[0]`: Number of locks with 0 lines cleared
    /// - `[1]`: Number of singles (1 line)
    /// - `[2]`: Number of doubles (2 lines)
    /// - `[3]`: Number of triples (3 lines)
    /// - `[4]`: Number of tetrises (4 lines)
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Updates statistics after a piece locks and returns the achievements
    /// it unlocked.
    ///
    /// # Arguments
    ///
    /// * `cleared_lines` - Number of lines cleared (0-4)
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) -> Vec<Achievement> {
        let cleared_lines = cleared_lines.min(LINE_SCORE_TABLE.len() - 1);
        self.completed_pieces += 1;
        self.line_cleared_counter[cleared_lines] += 1;
        if cleared_lines == 0 {
            return vec![];
        }

        let mut achievements = vec![];
        self.score = self
            .score
            .saturating_add(LINE_SCORE_TABLE[cleared_lines].saturating_mul(self.level));
        self.lines = self.lines.saturating_add(cleared_lines);
        if cleared_lines == 4 {
            achievements.push(Achievement::Tetris);
        }

        while self
            .level
            .checked_mul(LINES_PER_LEVEL)
            .is_some_and(|threshold| self.lines >= threshold)
        {
            self.level += 1;
            info!("level up: {}", self.level);
            achievements.extend(Achievement::for_level(self.level));
        }
        achievements
    }

    /// Awards hard-drop points. A drop of at least one cell unlocks
    /// [`Achievement::SpeedDemon`].
    pub fn record_hard_drop(&mut self, cells: usize) -> Option<Achievement> {
        self.score = self.score.saturating_add(cells.saturating_mul(HARD_DROP_POINTS));
        (cells > 0).then_some(Achievement::SpeedDemon)
    }

    /// Awards points for cells the player soft-dropped.
    pub fn record_soft_drop(&mut self, cells: usize) {
        self.score = self.score.saturating_add(cells.saturating_mul(SOFT_DROP_POINTS));
    }
}
