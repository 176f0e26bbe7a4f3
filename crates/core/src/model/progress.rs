use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::model::ids::{ModuleId, VideoId};

/// Completion percentage for `completed` of `total` videos.
///
/// Rounds half up in integer arithmetic, so 3 of 8 is 38 and 1 of 8 is 13.
/// An empty module reports 0 and the result never exceeds 100.
#[must_use]
pub fn completion_percentage(completed: usize, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::try_from(completed).unwrap_or(u64::MAX);
    let total = u64::from(total);
    let pct = (completed.saturating_mul(200) + total) / (2 * total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Per-module progress of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    module_id: ModuleId,
    completed: BTreeSet<VideoId>,
    percentage: u8,
    last_accessed: Option<DateTime<Utc>>,
    total_time_watched: u64,
}

impl ProgressRecord {
    /// A record with nothing watched yet.
    #[must_use]
    pub fn empty(module_id: ModuleId) -> Self {
        Self {
            module_id,
            completed: BTreeSet::new(),
            percentage: 0,
            last_accessed: None,
            total_time_watched: 0,
        }
    }

    /// Rebuild a record from persisted fields.
    ///
    /// The stored percentage is ignored and derived again from `video_count`.
    #[must_use]
    pub fn from_persisted(
        module_id: ModuleId,
        completed: BTreeSet<VideoId>,
        video_count: u32,
        last_accessed: Option<DateTime<Utc>>,
        total_time_watched: u64,
    ) -> Self {
        let percentage = completion_percentage(completed.len(), video_count);
        Self {
            module_id,
            completed,
            percentage,
            last_accessed,
            total_time_watched,
        }
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn completed_videos(&self) -> &BTreeSet<VideoId> {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, video: &VideoId) -> bool {
        self.completed.contains(video)
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    /// Cumulative watch time in seconds. Never decreases.
    #[must_use]
    pub fn total_time_watched(&self) -> u64 {
        self.total_time_watched
    }

    fn record_watch(
        &mut self,
        video: &VideoId,
        video_count: u32,
        watched_secs: u64,
        now: DateTime<Utc>,
    ) {
        if !self.completed.contains(video) {
            self.completed.insert(video.clone());
        }
        self.percentage = completion_percentage(self.completed.len(), video_count);
        self.last_accessed = Some(now);
        self.total_time_watched = self.total_time_watched.saturating_add(watched_secs);
    }
}

/// One version of the user's progress: a record per known module, in catalog order.
///
/// Versions are never mutated in place. Every operation returns a new set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    records: Vec<ProgressRecord>,
}

impl RecordSet {
    #[must_use]
    pub fn new(records: Vec<ProgressRecord>) -> Self {
        Self { records }
    }

    /// The seed state: one empty record per module id.
    #[must_use]
    pub fn seed<'a>(module_ids: impl IntoIterator<Item = &'a ModuleId>) -> Self {
        Self {
            records: module_ids
                .into_iter()
                .cloned()
                .map(ProgressRecord::empty)
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, module_id: &ModuleId) -> Option<&ProgressRecord> {
        self.records.iter().find(|r| r.module_id() == module_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a new version with `video` counted as watched in `module_id`.
    ///
    /// The completed set only grows once per video, while `watched_secs` is
    /// added on every call. `video_count` is the module's current size and is
    /// used to recompute the percentage. Returns `None` when no record exists
    /// for `module_id`.
    #[must_use]
    pub fn with_video_watched(
        &self,
        module_id: &ModuleId,
        video: &VideoId,
        video_count: u32,
        watched_secs: u64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let index = self.records.iter().position(|r| r.module_id() == module_id)?;
        let mut next = self.clone();
        next.records[index].record_watch(video, video_count, watched_secs, now);
        Some(next)
    }

    /// Same module ids, every record back to empty.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self::seed(self.records.iter().map(ProgressRecord::module_id))
    }

    /// Mean of the per-module percentages, rounded half up; 0 when empty.
    #[must_use]
    pub fn total_progress(&self) -> u8 {
        if self.records.is_empty() {
            return 0;
        }
        let sum: u64 = self
            .records
            .iter()
            .map(|r| u64::from(r.progress_percentage()))
            .sum();
        let count = self.records.len() as u64;
        u8::try_from((2 * sum + count) / (2 * count)).unwrap_or(100)
    }

    /// Number of completed videos across all modules.
    #[must_use]
    pub fn videos_watched(&self) -> usize {
        self.records.iter().map(|r| r.completed_videos().len()).sum()
    }

    /// Cumulative watch time across all modules, in seconds.
    #[must_use]
    pub fn time_watched(&self) -> u64 {
        self.records
            .iter()
            .map(ProgressRecord::total_time_watched)
            .fold(0, u64::saturating_add)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ProgressRecord;
    type IntoIter = std::slice::Iter<'a, ProgressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
