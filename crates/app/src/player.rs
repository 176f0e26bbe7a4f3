use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use services::{PlaybackControl, PlaybackControlError};
use tokio::time::Instant;

#[derive(Debug)]
struct Playhead {
    base: f64,
    since: Option<Instant>,
}

/// Stand-in player that advances its position with wall-clock time.
#[derive(Debug)]
pub struct SimulatedPlayer {
    duration: f64,
    rate: f64,
    head: Mutex<Playhead>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64, rate: f64) -> Self {
        Self {
            duration,
            rate: rate.max(0.0),
            head: Mutex::new(Playhead {
                base: 0.0,
                since: None,
            }),
        }
    }

    pub fn position(&self) -> f64 {
        let head = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        self.position_of(&head)
    }

    fn position_of(&self, head: &Playhead) -> f64 {
        let played = head
            .since
            .map_or(0.0, |since| since.elapsed().as_secs_f64() * self.rate);
        (head.base + played).min(self.duration)
    }
}

#[async_trait]
impl PlaybackControl for SimulatedPlayer {
    async fn play(&self) -> Result<(), PlaybackControlError> {
        let mut head = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        if head.since.is_none() {
            head.since = Some(Instant::now());
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackControlError> {
        let mut head = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        head.base = self.position_of(&head);
        head.since = None;
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> Result<(), PlaybackControlError> {
        let mut head = self.head.lock().unwrap_or_else(PoisonError::into_inner);
        head.base = seconds;
        if head.since.is_some() {
            head.since = Some(Instant::now());
        }
        Ok(())
    }

    async fn current_time(&self) -> Result<f64, PlaybackControlError> {
        Ok(self.position())
    }

    async fn set_volume(&self, level: f32) -> Result<(), PlaybackControlError> {
        tracing::debug!(level, "volume changed");
        Ok(())
    }
}
