//! Persisted shapes for the key-value store.
//!
//! Progress is stored as a JSON array of camelCase records. Reads go field
//! by field: a field with a missing or unexpected value falls back to its
//! empty default, and a row without a module id is skipped. Only bytes that
//! are not a JSON array are rejected as a whole.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use course_core::FilterState;
use course_core::model::{LevelFilter, ModuleId, ProgressRecord, RecordSet, VideoId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::StorageError;

/// Key holding the serialized progress records.
pub const PROGRESS_KEY: &str = "@dance_app_user_progress";

/// Key holding the last filter state, written when the app goes to background.
pub const APP_STATE_KEY: &str = "@dance_app_state";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRow {
    module_id: String,
    completed_videos: Vec<String>,
    progress_percentage: u8,
    last_accessed: Option<DateTime<Utc>>,
    total_time_watched: u64,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Whole seconds of a stored watch time; fractions are dropped and anything
/// negative or non-finite counts as zero.
fn whole_seconds(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    }
}

/// Persisted shape of one progress record.
///
/// Mirrors `ProgressRecord` without the derived percentage, which is
/// recomputed against the catalog when the record is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProgress {
    pub module_id: ModuleId,
    pub completed: BTreeSet<VideoId>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub total_time_watched: u64,
}

impl PersistedProgress {
    #[must_use]
    pub fn from_record(record: &ProgressRecord) -> Self {
        Self {
            module_id: record.module_id().clone(),
            completed: record.completed_videos().clone(),
            last_accessed: record.last_accessed(),
            total_time_watched: record.total_time_watched(),
        }
    }

    /// Rebuild the domain record for a module of `video_count` videos.
    #[must_use]
    pub fn into_record(self, video_count: u32) -> ProgressRecord {
        ProgressRecord::from_persisted(
            self.module_id,
            self.completed,
            video_count,
            self.last_accessed,
            self.total_time_watched,
        )
    }
}

/// A decoded progress snapshot, in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub records: Vec<PersistedProgress>,
}

/// Serialize a progress version.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if JSON encoding fails.
pub fn encode_progress(records: &RecordSet) -> Result<Vec<u8>, StorageError> {
    let rows: Vec<ProgressRow> = records
        .iter()
        .map(|r| ProgressRow {
            module_id: r.module_id().to_string(),
            completed_videos: r.completed_videos().iter().map(ToString::to_string).collect(),
            progress_percentage: r.progress_percentage(),
            last_accessed: r.last_accessed(),
            total_time_watched: r.total_time_watched(),
        })
        .collect();
    serde_json::to_vec(&rows).map_err(ser)
}

/// Parse stored progress bytes.
///
/// Duplicate video ids collapse into one. The stored percentage is not read
/// since it is derived again on hydrate. `totalTimeWatched` may be fractional
/// and is truncated to whole seconds.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the bytes are not a JSON array.
pub fn decode_progress(bytes: &[u8]) -> Result<ProgressSnapshot, StorageError> {
    let rows: Vec<Value> = serde_json::from_slice(bytes).map_err(ser)?;
    let records = rows.iter().filter_map(progress_from_row).collect();
    Ok(ProgressSnapshot { records })
}

fn progress_from_row(row: &Value) -> Option<PersistedProgress> {
    let module_id = row.get("moduleId")?.as_str()?;
    if module_id.trim().is_empty() {
        return None;
    }
    let completed = row
        .get("completedVideos")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .filter(|v| !v.trim().is_empty())
                .map(VideoId::new)
                .collect()
        })
        .unwrap_or_default();
    Some(PersistedProgress {
        module_id: ModuleId::new(module_id),
        completed,
        last_accessed: row
            .get("lastAccessed")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        total_time_watched: row
            .get("totalTimeWatched")
            .and_then(Value::as_f64)
            .map_or(0, whole_seconds),
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppStateRow {
    #[serde(default)]
    search_query: String,
    #[serde(default)]
    selected_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    last_accessed: Option<DateTime<Utc>>,
}

/// The "last app state" side channel: filter plus when it was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStateSnapshot {
    pub filter: FilterState,
    pub saved_at: Option<DateTime<Utc>>,
}

/// # Errors
///
/// Returns `StorageError::Serialization` if JSON encoding fails.
pub fn encode_app_state(filter: &FilterState, now: DateTime<Utc>) -> Result<Vec<u8>, StorageError> {
    let row = AppStateRow {
        search_query: filter.query.clone(),
        selected_level: Some(filter.level.to_string()),
        last_accessed: Some(now),
    };
    serde_json::to_vec(&row).map_err(ser)
}

/// Unknown level labels fall back to `all`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the bytes are not a JSON object.
pub fn decode_app_state(bytes: &[u8]) -> Result<AppStateSnapshot, StorageError> {
    let row: AppStateRow = serde_json::from_slice(bytes).map_err(ser)?;
    let level = row
        .selected_level
        .and_then(|raw| raw.parse::<LevelFilter>().ok())
        .unwrap_or_default();
    Ok(AppStateSnapshot {
        filter: FilterState::new(row.search_query, level),
        saved_at: row.last_accessed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::Level;
    use course_core::time::fixed_now;

    fn sample() -> RecordSet {
        let ids = [ModuleId::new("m1"), ModuleId::new("m2")];
        RecordSet::seed(ids.iter())
            .with_video_watched(&ModuleId::new("m1"), &VideoId::new("v4"), 8, 720, fixed_now())
            .unwrap()
    }

    #[test]
    fn encodes_stable_field_names() {
        let bytes = encode_progress(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let first = &value[0];
        assert_eq!(first["moduleId"], "m1");
        assert_eq!(first["completedVideos"], serde_json::json!(["v4"]));
        assert_eq!(first["progressPercentage"], 13);
        assert_eq!(first["lastAccessed"], "2024-03-01T12:00:00Z");
        assert_eq!(first["totalTimeWatched"], 720);
        assert_eq!(value[1]["lastAccessed"], serde_json::Value::Null);
    }

    #[test]
    fn decoded_records_rebuild_the_same_version() {
        let original = sample();
        let snapshot = decode_progress(&encode_progress(&original).unwrap()).unwrap();
        let rebuilt = RecordSet::new(
            snapshot
                .records
                .into_iter()
                .map(|p| p.into_record(8))
                .collect(),
        );
        assert_eq!(rebuilt.get(&ModuleId::new("m1")), original.get(&ModuleId::new("m1")));
    }

    #[test]
    fn decode_tolerates_missing_unknown_and_duplicate_fields() {
        let raw = br#"[
            {"moduleId": "m1", "completedVideos": ["v1", "v1", "v2"], "legacy": true},
            {"moduleId": "m2", "lastAccessed": "not a date"},
            {"completedVideos": ["v9"]}
        ]"#;
        let snapshot = decode_progress(raw).unwrap();
        assert_eq!(snapshot.records.len(), 2);

        let m1 = &snapshot.records[0];
        assert_eq!(m1.completed.len(), 2);
        assert_eq!(m1.total_time_watched, 0);
        assert_eq!(m1.last_accessed, None);

        let m2 = &snapshot.records[1];
        assert!(m2.completed.is_empty());
        assert_eq!(m2.last_accessed, None);
    }

    #[test]
    fn decode_keeps_rows_with_odd_field_values() {
        let raw = br#"[
            {"moduleId": "m1", "completedVideos": ["v1", "v2", "v3"],
             "progressPercentage": 38, "lastAccessed": "2024-03-01T12:00:00Z",
             "totalTimeWatched": 1440.52},
            {"moduleId": "m2", "completedVideos": ["v1", 7, null],
             "progressPercentage": -1, "totalTimeWatched": "lots"},
            {"moduleId": "m3", "progressPercentage": 300, "totalTimeWatched": -5},
            {"moduleId": 4, "completedVideos": ["v1"]},
            "m5"
        ]"#;
        let snapshot = decode_progress(raw).unwrap();
        assert_eq!(snapshot.records.len(), 3);

        let m1 = &snapshot.records[0];
        assert_eq!(m1.completed.len(), 3);
        assert_eq!(m1.total_time_watched, 1440);
        assert_eq!(m1.last_accessed, Some(fixed_now()));

        let m2 = &snapshot.records[1];
        assert_eq!(m2.completed.iter().map(VideoId::as_str).collect::<Vec<_>>(), ["v1"]);
        assert_eq!(m2.total_time_watched, 0);

        let m3 = &snapshot.records[2];
        assert_eq!(m3.total_time_watched, 0);
        assert_eq!(m3.clone().into_record(8).progress_percentage(), 0);
    }

    #[test]
    fn decode_rejects_non_arrays() {
        assert!(decode_progress(b"not json").is_err());
        assert!(decode_progress(br#"{"moduleId": "m1"}"#).is_err());
        assert!(decode_progress(b"[]").unwrap().records.is_empty());
    }

    #[test]
    fn app_state_round_trips_and_defaults_level() {
        let filter = FilterState::new("salsa", LevelFilter::Only(Level::Beginner));
        let bytes = encode_app_state(&filter, fixed_now()).unwrap();
        let decoded = decode_app_state(&bytes).unwrap();
        assert_eq!(decoded.filter, filter);
        assert_eq!(decoded.saved_at, Some(fixed_now()));

        let legacy = decode_app_state(br#"{"searchQuery": "", "selectedLevel": "???"}"#).unwrap();
        assert_eq!(legacy.filter.level, LevelFilter::All);
    }
}
