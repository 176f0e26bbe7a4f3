use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use course_core::model::{LevelFilter, Module, ModuleId, VideoId};
use course_core::stats::{Achievement, ProfileStats, achievements};
use course_core::{Catalog, Clock, FilterState};
use storage::repository::Storage;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::catalog_service::CatalogService;
use crate::config::SyncConfig;
use crate::error::{LoadError, PersistenceError};
use crate::persistence::PersistenceSynchronizer;
use crate::playback::{PlaybackControl, PlaybackTracker};
use crate::progress_store::{ProgressStore, hydrate};
use crate::search::SearchDebouncer;

/// One user session: catalog, live progress, persistence and filter state.
///
/// Progress starts as the seed and is replaced by the persisted snapshot once
/// it has been read. Ending the session (explicitly or by dropping it) stops
/// the background load and any pending save.
pub struct AppServices {
    config: SyncConfig,
    load_error: Option<LoadError>,
    store: Arc<ProgressStore>,
    persistence: Arc<PersistenceSynchronizer>,
    filter: Arc<Mutex<FilterState>>,
    search: Mutex<SearchDebouncer>,
    loaded: watch::Receiver<bool>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl AppServices {
    /// Load the catalog and start hydrating progress in the background.
    ///
    /// A catalog that cannot be loaded leaves the session with an empty
    /// catalog; the failure is kept in `load_error` and the caller can start
    /// a new session later to retry.
    pub async fn start(storage: &Storage, catalogs: &CatalogService, config: SyncConfig, clock: Clock) -> Self {
        let (catalog, load_error) = match catalogs.load_catalog().await {
            Ok(catalog) => (catalog, None),
            Err(err) => {
                tracing::warn!(error = %err, "catalog unavailable, continuing without modules");
                (Arc::new(Catalog::default()), Some(err))
            }
        };

        let store = Arc::new(ProgressStore::new(catalog, clock));
        let persistence = Arc::new(PersistenceSynchronizer::new(
            Arc::clone(&storage.kv),
            config.save_debounce,
            clock,
        ));
        let token = CancellationToken::new();
        let (loaded_tx, loaded) = watch::channel(false);

        tokio::spawn(hydrate_then_autosave(
            Arc::clone(&store),
            Arc::clone(&persistence),
            token.clone(),
            loaded_tx,
        ));

        let filter = Arc::new(Mutex::new(FilterState::default()));
        let search = {
            let filter = Arc::clone(&filter);
            SearchDebouncer::new(config.search_debounce, move |query| {
                tracing::debug!(%query, "search query applied");
                lock(&filter).query = query;
            })
        };

        Self {
            config,
            load_error,
            store,
            persistence,
            filter,
            search: Mutex::new(search),
            loaded,
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        self.store.catalog()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    #[must_use]
    pub fn persistence(&self) -> &Arc<PersistenceSynchronizer> {
        &self.persistence
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    /// Wait until the persisted progress has been applied.
    ///
    /// Returns `false` if the session ended first.
    pub async fn wait_until_loaded(&self) -> bool {
        let mut loaded = self.loaded.clone();
        tokio::select! {
            () = self.token.cancelled() => false,
            result = loaded.wait_for(|done| *done) => result.is_ok(),
        }
    }

    #[must_use]
    pub fn filter(&self) -> FilterState {
        lock(&self.filter).clone()
    }

    /// Apply `query` right away, bypassing the search box delay.
    pub fn set_query(&self, query: impl Into<String>) {
        lock(&self.filter).query = query.into();
    }

    /// Feed one keystroke's worth of search text.
    ///
    /// The query is applied once typing has paused for the configured delay.
    pub fn search_input(&self, text: impl Into<String>) {
        lock(&self.search).input(text);
    }

    /// Empty the search box immediately.
    pub fn clear_search(&self) {
        lock(&self.search).clear();
    }

    #[must_use]
    pub fn is_search_pending(&self) -> bool {
        lock(&self.search).is_pending()
    }

    pub fn set_level(&self, level: LevelFilter) {
        lock(&self.filter).level = level;
    }

    /// Restore the filter saved by a previous session, if any.
    pub async fn restore_filter(&self) -> bool {
        match self.persistence.load_app_state().await {
            Some(state) => {
                *lock(&self.filter) = state.filter;
                true
            }
            None => false,
        }
    }

    /// Modules matching the current filter, in catalog order.
    #[must_use]
    pub fn visible_modules(&self) -> Vec<&Module> {
        self.filter().apply(self.store.catalog().modules())
    }

    /// A tracker for `video_id`, already in the loading state.
    #[must_use]
    pub fn open_video(&self, control: Arc<dyn PlaybackControl>, module_id: ModuleId, video_id: VideoId) -> PlaybackTracker {
        let mut tracker = PlaybackTracker::new(control, Arc::clone(&self.store), self.config);
        tracker.load(module_id, video_id);
        tracker
    }

    /// Save the filter state as the app goes to the background.
    pub fn on_background(&self) {
        self.persistence.save_app_state(&self.filter());
    }

    /// Wipe progress: drop the persisted copy, then publish the seed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the persisted copy could not be removed.
    /// The in-memory progress is reset either way.
    pub async fn reset_progress(&self) -> Result<(), PersistenceError> {
        let cleared = self.persistence.clear().await;
        self.store.reset();
        cleared
    }

    /// Write the current progress immediately.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        self.persistence.flush(&self.store.snapshot()).await
    }

    #[must_use]
    pub fn profile_stats(&self) -> ProfileStats {
        ProfileStats::from_records(&self.store.snapshot())
    }

    #[must_use]
    pub fn achievements(&self) -> Vec<(Achievement, bool)> {
        achievements(&self.store.snapshot())
    }

    /// End the session. Later results of the initial load are discarded.
    pub fn teardown(&self) {
        self.token.cancel();
        self.persistence.cancel_pending();
        lock(&self.search).cancel();
        tracing::debug!("session torn down");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn hydrate_then_autosave(
    store: Arc<ProgressStore>,
    persistence: Arc<PersistenceSynchronizer>,
    token: CancellationToken,
    loaded: watch::Sender<bool>,
) {
    let snapshot = tokio::select! {
        () = token.cancelled() => {
            tracing::debug!("session ended before progress was loaded");
            return;
        }
        snapshot = persistence.load_snapshot() => snapshot,
    };
    if token.is_cancelled() {
        return;
    }

    let records = hydrate(store.catalog().seed_records(), snapshot, store.catalog());
    // Subscribed first so a mark published right after hydration is still seen.
    let versions = store.subscribe();
    let hydrated = store.replace(records);
    loaded.send_replace(true);
    tracing::info!(progress = store.total_progress(), "progress loaded");

    persistence.autosave(versions, hydrated, token).await;
}
