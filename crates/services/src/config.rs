use std::time::Duration;

/// Timing knobs shared by the persistence, playback and search services.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// Quiet period before the latest progress version is written.
    pub save_debounce: Duration,
    /// How often the playback position is sampled while playing.
    pub sample_interval: Duration,
    /// Delay before visible controls hide again during playback.
    pub controls_hide_delay: Duration,
    /// Fraction of a video's duration that counts it as watched.
    pub completion_threshold: f64,
    /// Seconds moved by one skip forward/back.
    pub skip_step: f64,
    /// Pause in typing before a search query is applied.
    pub search_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(2000),
            sample_interval: Duration::from_millis(1000),
            controls_hide_delay: Duration::from_millis(3000),
            completion_threshold: 0.8,
            skip_step: 10.0,
            search_debounce: Duration::from_millis(300),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_timings() {
        let config = SyncConfig::default();
        assert_eq!(config.save_debounce, Duration::from_secs(2));
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.controls_hide_delay, Duration::from_secs(3));
        assert!((config.completion_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn threshold_is_clamped() {
        let config = SyncConfig::default().with_completion_threshold(1.5);
        assert!((config.completion_threshold - 1.0).abs() < f64::EPSILON);
    }
}
