//! Debounced write-through of progress versions to the key-value store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use course_core::model::RecordSet;
use course_core::{Clock, FilterState};
use storage::repository::KeyValueStore;
use storage::snapshot::{
    APP_STATE_KEY, AppStateSnapshot, PROGRESS_KEY, ProgressSnapshot, decode_app_state,
    decode_progress, encode_app_state, encode_progress,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::PersistenceError;
use crate::timer::Timer;

/// Writes the latest progress version once changes have been quiet for the
/// debounce window.
///
/// Only the newest scheduled version is ever written. Write failures are
/// logged and dropped; the next change schedules a fresh save.
pub struct PersistenceSynchronizer {
    kv: Arc<dyn KeyValueStore>,
    debounce: Duration,
    clock: Clock,
    pending: Mutex<Timer>,
}

impl PersistenceSynchronizer {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, debounce: Duration, clock: Clock) -> Self {
        Self {
            kv,
            debounce,
            clock,
            pending: Mutex::new(Timer::new()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Timer> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the persisted progress once.
    ///
    /// Missing, unreadable and malformed snapshots all come back as `None`.
    pub async fn load_snapshot(&self) -> Option<ProgressSnapshot> {
        let bytes = match self.kv.get(PROGRESS_KEY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("no progress snapshot stored");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "progress snapshot could not be read");
                return None;
            }
        };
        match decode_progress(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "progress snapshot is malformed, ignoring it");
                None
            }
        }
    }

    /// Restart the debounce window with `records` as the version to write.
    pub fn schedule_save(&self, records: Arc<RecordSet>) {
        let kv = Arc::clone(&self.kv);
        self.pending().arm(self.debounce, async move {
            // Detached so a later re-arm cannot abort a write that already started.
            tokio::spawn(async move { write_progress(kv.as_ref(), &records).await });
        });
    }

    /// Drop the pending save, if any.
    pub fn cancel_pending(&self) {
        self.pending().cancel();
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending().is_armed()
    }

    /// Write `records` now, skipping the debounce window.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Storage` if encoding or the write fails.
    pub async fn flush(&self, records: &RecordSet) -> Result<(), PersistenceError> {
        self.cancel_pending();
        let bytes = encode_progress(records)?;
        self.kv.set(PROGRESS_KEY, &bytes).await?;
        tracing::debug!(bytes = bytes.len(), "progress flushed");
        Ok(())
    }

    /// Cancel any pending save and remove the persisted progress.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Storage` if the key cannot be removed.
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.cancel_pending();
        self.kv.remove(PROGRESS_KEY).await?;
        Ok(())
    }

    /// Store the filter state in the background. Failures are only logged.
    pub fn save_app_state(&self, filter: &FilterState) {
        let bytes = match encode_app_state(filter, self.clock.now()) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "app state could not be encoded");
                return;
            }
        };
        let kv = Arc::clone(&self.kv);
        tokio::spawn(async move {
            if let Err(err) = kv.set(APP_STATE_KEY, &bytes).await {
                tracing::warn!(error = %err, "app state save failed");
            }
        });
    }

    pub async fn load_app_state(&self) -> Option<AppStateSnapshot> {
        match self.kv.get(APP_STATE_KEY).await {
            Ok(Some(bytes)) => decode_app_state(&bytes)
                .inspect_err(|err| tracing::warn!(error = %err, "app state is malformed"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "app state could not be read");
                None
            }
        }
    }

    /// Schedule a save for every version `versions` observes, except
    /// `skip`, which is already what the store holds.
    ///
    /// Runs until `token` is cancelled or the store goes away, then drops any
    /// pending save.
    pub async fn autosave(
        &self,
        mut versions: watch::Receiver<Arc<RecordSet>>,
        skip: Arc<RecordSet>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                changed = versions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let records = Arc::clone(&versions.borrow_and_update());
                    if Arc::ptr_eq(&records, &skip) {
                        continue;
                    }
                    self.schedule_save(records);
                }
            }
        }
        self.cancel_pending();
        tracing::debug!("autosave stopped");
    }
}

async fn write_progress(kv: &dyn KeyValueStore, records: &RecordSet) {
    let bytes = match encode_progress(records) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "progress could not be encoded");
            return;
        }
    };
    match kv.set(PROGRESS_KEY, &bytes).await {
        Ok(()) => tracing::debug!(bytes = bytes.len(), "progress saved"),
        Err(err) => tracing::warn!(error = %err, "progress save failed"),
    }
}
