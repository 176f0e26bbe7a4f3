//! The live progress store: one published `RecordSet` version at a time.

use std::sync::Arc;

use course_core::model::{ModuleId, ProgressRecord, RecordSet, VideoId};
use course_core::{Catalog, Clock};
use storage::snapshot::ProgressSnapshot;
use tokio::sync::watch;

/// Rebuild a record set from a persisted snapshot.
///
/// Records follow the order of `seed`. Modules missing from the snapshot keep
/// their seed record and snapshot entries for modules the catalog no longer
/// knows are dropped. Percentages are recomputed against the catalog. With no
/// snapshot the seed is returned as is.
#[must_use]
pub fn hydrate(seed: RecordSet, snapshot: Option<ProgressSnapshot>, catalog: &Catalog) -> RecordSet {
    let Some(snapshot) = snapshot else {
        tracing::warn!("no usable progress snapshot, starting from seed");
        return seed;
    };

    let mut persisted = snapshot.records;
    let records = seed
        .iter()
        .map(|seeded| {
            let id = seeded.module_id();
            match persisted.iter().position(|p| &p.module_id == id) {
                Some(index) => {
                    let video_count = catalog.video_count(id).unwrap_or(0);
                    persisted.swap_remove(index).into_record(video_count)
                }
                None => seeded.clone(),
            }
        })
        .collect();

    for orphan in &persisted {
        tracing::debug!(module_id = %orphan.module_id, "dropping progress for unknown module");
    }
    RecordSet::new(records)
}

/// Owns the canonical record set and publishes each new version.
///
/// Versions are immutable `Arc<RecordSet>`s. Mutations swap in a new version
/// synchronously, so they apply in the order they are called.
pub struct ProgressStore {
    catalog: Arc<Catalog>,
    clock: Clock,
    records: watch::Sender<Arc<RecordSet>>,
}

impl ProgressStore {
    /// A store holding the seed record set for `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, clock: Clock) -> Self {
        let (records, _) = watch::channel(Arc::new(catalog.seed_records()));
        Self {
            catalog,
            clock,
            records,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The current version.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RecordSet> {
        Arc::clone(&self.records.borrow())
    }

    /// A receiver that sees every version published after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<RecordSet>> {
        self.records.subscribe()
    }

    /// Publish `records` as the new version and return it.
    pub fn replace(&self, records: RecordSet) -> Arc<RecordSet> {
        let version = Arc::new(records);
        self.records.send_replace(Arc::clone(&version));
        version
    }

    /// Count `video_id` as watched and add `watched_secs` to the module's time.
    ///
    /// Returns `false` without publishing when the module or video is not in
    /// the catalog.
    pub fn mark_video_watched(&self, module_id: &ModuleId, video_id: &VideoId, watched_secs: u64) -> bool {
        let Some(module) = self.catalog.module(module_id) else {
            tracing::debug!(%module_id, %video_id, "mark ignored: unknown module");
            return false;
        };
        if module.video(video_id).is_none() {
            tracing::debug!(%module_id, %video_id, "mark ignored: video not in module");
            return false;
        }

        let video_count = module.video_count();
        let now = self.clock.now();
        let applied = self.records.send_if_modified(|current| {
            match current.with_video_watched(module_id, video_id, video_count, watched_secs, now) {
                Some(next) => {
                    *current = Arc::new(next);
                    true
                }
                None => false,
            }
        });
        if applied {
            tracing::debug!(%module_id, %video_id, watched_secs, "video marked watched");
        } else {
            tracing::debug!(%module_id, "mark ignored: no record for module");
        }
        applied
    }

    /// Publish the seed state for every module.
    pub fn reset(&self) {
        self.records.send_modify(|current| *current = Arc::new(current.reset()));
        tracing::info!("progress reset");
    }

    #[must_use]
    pub fn total_progress(&self) -> u8 {
        self.records.borrow().total_progress()
    }

    #[must_use]
    pub fn module_progress(&self, module_id: &ModuleId) -> Option<ProgressRecord> {
        self.records.borrow().get(module_id).cloned()
    }
}
