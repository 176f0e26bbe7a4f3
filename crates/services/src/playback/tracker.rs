use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use course_core::model::{ModuleId, VideoId};

use super::control::{PlaybackControl, PlaybackStatus};
use crate::config::SyncConfig;
use crate::progress_store::ProgressStore;
use crate::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Finished,
}

/// Raised when the player reports the end of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCompleted {
    pub module_id: ModuleId,
    pub video_id: VideoId,
    /// Module percentage after the completion was recorded.
    pub progress: u8,
}

#[derive(Debug, Default)]
struct Session {
    state: PlaybackState,
    video: Option<(ModuleId, VideoId)>,
    duration: f64,
    position: f64,
    volume: f32,
    reported: bool,
    controls_visible: bool,
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks one video at a time and reports watched videos to the store.
///
/// While playing, the position is sampled on an interval; crossing the
/// completion threshold marks the video once per session. The end-of-media
/// event always marks a playing video. Failed player calls are logged and leave the state
/// as it was.
pub struct PlaybackTracker {
    control: Arc<dyn PlaybackControl>,
    store: Arc<ProgressStore>,
    config: SyncConfig,
    session: Arc<Mutex<Session>>,
    sampler: Timer,
    controls: Timer,
}

impl PlaybackTracker {
    #[must_use]
    pub fn new(control: Arc<dyn PlaybackControl>, store: Arc<ProgressStore>, config: SyncConfig) -> Self {
        Self {
            control,
            store,
            config,
            session: Arc::new(Mutex::new(Session {
                volume: 1.0,
                ..Session::default()
            })),
            sampler: Timer::new(),
            controls: Timer::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        lock(&self.session).state
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        lock(&self.session).position
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        lock(&self.session).duration
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        lock(&self.session).volume
    }

    #[must_use]
    pub fn controls_visible(&self) -> bool {
        lock(&self.session).controls_visible
    }

    /// Start a new session for `video_id` in `module_id`.
    pub fn load(&mut self, module_id: ModuleId, video_id: VideoId) {
        self.sampler.cancel();
        self.controls.cancel();
        let mut session = lock(&self.session);
        tracing::debug!(%module_id, %video_id, "loading video");
        *session = Session {
            state: PlaybackState::Loading,
            video: Some((module_id, video_id)),
            volume: session.volume,
            controls_visible: true,
            ..Session::default()
        };
    }

    /// Apply a status event from the player.
    ///
    /// Returns the completion notice when this event ends the video.
    pub fn on_status(&mut self, status: PlaybackStatus) -> Option<VideoCompleted> {
        let finished = {
            let mut session = lock(&self.session);
            if session.state == PlaybackState::Idle || !status.is_loaded {
                return None;
            }
            if status.duration_seconds > 0.0 {
                session.duration = status.duration_seconds;
            }
            session.position = status.position_seconds.clamp(0.0, session.duration.max(0.0));
            if session.state == PlaybackState::Loading {
                session.state = PlaybackState::Ready;
            }
            // Only a playing video can finish; a stray end event while
            // paused or ready is ignored.
            if status.did_just_finish && session.state == PlaybackState::Playing {
                session.state = PlaybackState::Finished;
                session.reported = true;
                session.video.clone()
            } else {
                None
            }
        };

        let (module_id, video_id) = finished?;
        self.sampler.cancel();
        self.controls.cancel();
        credit_watch(&self.store, &module_id, &video_id);
        let progress = self
            .store
            .module_progress(&module_id)
            .map_or(0, |r| r.progress_percentage());
        tracing::info!(%module_id, %video_id, progress, "video completed");
        Some(VideoCompleted {
            module_id,
            video_id,
            progress,
        })
    }

    /// Start playback from `Ready` or `Paused`. Returns whether it started.
    pub async fn play(&mut self) -> bool {
        let state = self.state();
        if !matches!(state, PlaybackState::Ready | PlaybackState::Paused) {
            tracing::debug!(?state, "play ignored");
            return false;
        }
        if let Err(err) = self.control.play().await {
            tracing::warn!(error = %err, "play failed");
            return false;
        }
        lock(&self.session).state = PlaybackState::Playing;
        self.start_sampler();
        self.show_controls();
        true
    }

    /// Pause a playing video. Returns whether it paused.
    pub async fn pause(&mut self) -> bool {
        if self.state() != PlaybackState::Playing {
            return false;
        }
        if let Err(err) = self.control.pause().await {
            tracing::warn!(error = %err, "pause failed");
            return false;
        }
        self.sampler.cancel();
        self.controls.cancel();
        let mut session = lock(&self.session);
        session.state = PlaybackState::Paused;
        session.controls_visible = true;
        true
    }

    /// The app moved to the background.
    pub async fn background(&mut self) -> bool {
        self.pause().await
    }

    /// Seek to `target`, clamped to `[0, duration]`.
    ///
    /// Returns the clamped position, or `None` if nothing is loaded or the
    /// player rejected the seek.
    pub async fn seek(&mut self, target: f64) -> Option<f64> {
        let (state, duration) = {
            let session = lock(&self.session);
            (session.state, session.duration)
        };
        if matches!(state, PlaybackState::Idle | PlaybackState::Loading) {
            return None;
        }
        let clamped = if target.is_nan() {
            0.0
        } else {
            target.clamp(0.0, duration.max(0.0))
        };
        if let Err(err) = self.control.seek_to(clamped).await {
            tracing::warn!(error = %err, target = clamped, "seek failed");
            return None;
        }
        lock(&self.session).position = clamped;
        self.show_controls();
        Some(clamped)
    }

    /// Move by `delta` seconds from the current position.
    pub async fn skip(&mut self, delta: f64) -> Option<f64> {
        let target = self.position() + delta;
        self.seek(target).await
    }

    pub async fn skip_forward(&mut self) -> Option<f64> {
        self.skip(self.config.skip_step).await
    }

    pub async fn skip_back(&mut self) -> Option<f64> {
        self.skip(-self.config.skip_step).await
    }

    /// Set the volume, clamped to `[0, 1]`. Returns the applied level.
    pub async fn set_volume(&mut self, level: f32) -> Option<f32> {
        let clamped = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        if let Err(err) = self.control.set_volume(clamped).await {
            tracing::warn!(error = %err, "volume change failed");
            return None;
        }
        lock(&self.session).volume = clamped;
        Some(clamped)
    }

    /// Show the controls; while playing they hide again after the delay.
    pub fn show_controls(&mut self) {
        let playing = {
            let mut session = lock(&self.session);
            session.controls_visible = true;
            session.state == PlaybackState::Playing
        };
        if playing {
            self.arm_hide();
        } else {
            self.controls.cancel();
        }
    }

    pub fn toggle_controls(&mut self) {
        if self.controls_visible() {
            self.controls.cancel();
            lock(&self.session).controls_visible = false;
        } else {
            self.show_controls();
        }
    }

    /// End the session: timers stop and the tracker goes back to `Idle`.
    pub fn teardown(&mut self) {
        self.sampler.cancel();
        self.controls.cancel();
        let mut session = lock(&self.session);
        session.state = PlaybackState::Idle;
        session.video = None;
    }

    fn arm_hide(&mut self) {
        let session = Arc::clone(&self.session);
        self.controls.arm(self.config.controls_hide_delay, async move {
            let mut session = lock(&session);
            if session.state == PlaybackState::Playing {
                session.controls_visible = false;
            }
        });
    }

    fn start_sampler(&mut self) {
        let control = Arc::clone(&self.control);
        let store = Arc::clone(&self.store);
        let session = Arc::clone(&self.session);
        let threshold = self.config.completion_threshold;
        self.sampler.arm_interval(self.config.sample_interval, move || {
            let control = Arc::clone(&control);
            let store = Arc::clone(&store);
            let session = Arc::clone(&session);
            async move { sample(control.as_ref(), &store, &session, threshold).await }
        });
    }
}

impl Drop for PlaybackTracker {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn sample(control: &dyn PlaybackControl, store: &ProgressStore, session: &Mutex<Session>, threshold: f64) {
    let position = match control.current_time().await {
        Ok(position) => position,
        Err(err) => {
            tracing::warn!(error = %err, "position sample failed");
            return;
        }
    };

    let due = {
        let mut session = lock(session);
        if session.state != PlaybackState::Playing {
            return;
        }
        session.position = position;
        let crossed = session.duration > 0.0 && position >= threshold * session.duration;
        if crossed && !session.reported {
            session.reported = true;
            session.video.clone()
        } else {
            None
        }
    };

    if let Some((module_id, video_id)) = due {
        tracing::debug!(%module_id, %video_id, position, "completion threshold reached");
        credit_watch(store, &module_id, &video_id);
    }
}

/// Mark a video watched, crediting its full catalog duration.
fn credit_watch(store: &ProgressStore, module_id: &ModuleId, video_id: &VideoId) {
    let secs = store
        .catalog()
        .video(module_id, video_id)
        .map_or(0, |v| u64::from(v.duration_secs()));
    store.mark_video_watched(module_id, video_id, secs);
}

/// `m:ss` display of a position in seconds.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(720.0), "12:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }
}
