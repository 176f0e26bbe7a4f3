//! Playback session tracking: turns player position into progress.

mod control;
mod tracker;

pub use control::{PlaybackControl, PlaybackStatus};
pub use tracker::{PlaybackState, PlaybackTracker, VideoCompleted, format_time};
