use async_trait::async_trait;

use crate::error::PlaybackControlError;

/// The player surface the tracker drives.
///
/// Positions and durations are in seconds.
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    async fn play(&self) -> Result<(), PlaybackControlError>;

    async fn pause(&self) -> Result<(), PlaybackControlError>;

    async fn seek_to(&self, seconds: f64) -> Result<(), PlaybackControlError>;

    async fn current_time(&self) -> Result<f64, PlaybackControlError>;

    /// `level` is already clamped to `[0, 1]`.
    async fn set_volume(&self, level: f32) -> Result<(), PlaybackControlError>;
}

/// A status event pushed by the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub duration_seconds: f64,
    pub position_seconds: f64,
    pub is_playing: bool,
    pub did_just_finish: bool,
}

impl PlaybackStatus {
    #[must_use]
    pub fn loaded(duration_seconds: f64) -> Self {
        Self {
            is_loaded: true,
            duration_seconds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn finished(duration_seconds: f64) -> Self {
        Self {
            is_loaded: true,
            duration_seconds,
            position_seconds: duration_seconds,
            is_playing: false,
            did_just_finish: true,
        }
    }
}
