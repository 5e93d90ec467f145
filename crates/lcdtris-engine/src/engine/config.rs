use std::time::Duration;

/// Gameplay tunables for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Level a fresh session starts at (at least 1).
    pub start_level: usize,
    /// How long a guest may play before the session is gate-blocked.
    pub free_play: Duration,
    /// Drop interval at level 1.
    pub base_interval: Duration,
    /// How much faster gravity gets per level.
    pub interval_step: Duration,
    /// Floor for the drop interval.
    pub min_interval: Duration,
    /// Period between autosaves for authenticated sessions.
    pub autosave_interval: Duration,
    /// Number of upcoming pieces exposed to the renderer.
    pub preview_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_level: 1,
            free_play: Duration::from_secs(5 * 60),
            base_interval: Duration::from_millis(900),
            interval_step: Duration::from_millis(50),
            min_interval: Duration::from_millis(90),
            autosave_interval: Duration::from_secs(15),
            preview_len: 5,
        }
    }
}

impl SessionConfig {
    /// Gravity interval at `level`:
    /// `max(min_interval, base_interval - (level - 1) * interval_step)`.
    #[must_use]
    pub fn drop_interval(&self, level: usize) -> Duration {
        let steps = u32::try_from(level.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_interval
            .saturating_sub(self.interval_step.saturating_mul(steps))
            .max(self.min_interval)
    }
}
