//! Profile summary and achievements derived from a progress version.

use crate::model::RecordSet;

/// Watch time split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTime {
    pub hours: u64,
    pub minutes: u64,
}

impl WatchTime {
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self {
            hours: secs / 3600,
            minutes: (secs % 3600) / 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileStats {
    pub overall_progress: u8,
    pub videos_watched: usize,
    pub time_watched: WatchTime,
}

impl ProfileStats {
    #[must_use]
    pub fn from_records(records: &RecordSet) -> Self {
        Self {
            overall_progress: records.total_progress(),
            videos_watched: records.videos_watched(),
            time_watched: WatchTime::from_secs(records.time_watched()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    FirstVideo,
    FiveVideos,
    FirstModule,
    HalfwayThere,
    AllModules,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstVideo,
        Achievement::FiveVideos,
        Achievement::FirstModule,
        Achievement::HalfwayThere,
        Achievement::AllModules,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstVideo => "First Step",
            Achievement::FiveVideos => "On the Move",
            Achievement::FirstModule => "Module Complete",
            Achievement::HalfwayThere => "Halfway There",
            Achievement::AllModules => "Complete Dancer",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstVideo => "Watched your first video",
            Achievement::FiveVideos => "Watched 5 videos",
            Achievement::FirstModule => "Completed an entire module",
            Achievement::HalfwayThere => "Reached 50% overall progress",
            Achievement::AllModules => "Completed every module",
        }
    }

    /// Whether the achievement is unlocked for this progress version.
    #[must_use]
    pub fn is_unlocked(self, records: &RecordSet) -> bool {
        match self {
            Achievement::FirstVideo => records.videos_watched() >= 1,
            Achievement::FiveVideos => records.videos_watched() >= 5,
            Achievement::FirstModule => records.iter().any(|r| r.progress_percentage() == 100),
            Achievement::HalfwayThere => records.total_progress() >= 50,
            Achievement::AllModules => !records.is_empty() && records.total_progress() == 100,
        }
    }
}

/// Every achievement paired with its unlocked flag, in display order.
#[must_use]
pub fn achievements(records: &RecordSet) -> Vec<(Achievement, bool)> {
    Achievement::ALL
        .into_iter()
        .map(|a| (a, a.is_unlocked(records)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleId, VideoId};
    use crate::time::fixed_now;

    fn watch(records: &RecordSet, module: &str, video: &str, count: u32) -> RecordSet {
        records
            .with_video_watched(
                &ModuleId::new(module),
                &VideoId::new(video),
                count,
                600,
                fixed_now(),
            )
            .unwrap()
    }

    #[test]
    fn stats_sum_across_modules() {
        let ids = [ModuleId::new("m1"), ModuleId::new("m2")];
        let mut records = RecordSet::seed(ids.iter());
        records = watch(&records, "m1", "v1", 2);
        records = watch(&records, "m2", "v9", 4);
        records = watch(&records, "m2", "v9", 4);

        let stats = ProfileStats::from_records(&records);
        assert_eq!(stats.videos_watched, 2);
        // 1800 seconds of watch time
        assert_eq!(stats.time_watched, WatchTime { hours: 0, minutes: 30 });
        // (50 + 25) / 2 = 37.5 -> 38
        assert_eq!(stats.overall_progress, 38);
    }

    #[test]
    fn achievements_unlock_at_thresholds() {
        let ids = [ModuleId::new("m1"), ModuleId::new("m2")];
        let seed = RecordSet::seed(ids.iter());
        assert!(achievements(&seed).iter().all(|(_, unlocked)| !unlocked));

        let one_module = watch(&watch(&seed, "m1", "v1", 2), "m1", "v2", 2);
        assert!(Achievement::FirstVideo.is_unlocked(&one_module));
        assert!(Achievement::FirstModule.is_unlocked(&one_module));
        assert!(Achievement::HalfwayThere.is_unlocked(&one_module));
        assert!(!Achievement::FiveVideos.is_unlocked(&one_module));
        assert!(!Achievement::AllModules.is_unlocked(&one_module));

        let all = watch(&one_module, "m2", "v3", 1);
        assert!(Achievement::AllModules.is_unlocked(&all));
    }

    #[test]
    fn watch_time_splits_hours_and_minutes() {
        assert_eq!(WatchTime::from_secs(3_900), WatchTime { hours: 1, minutes: 5 });
        assert_eq!(WatchTime::from_secs(59), WatchTime { hours: 0, minutes: 0 });
    }
}
