use course_core::model::{Level, MediaUri, ModuleDraft, ModuleId, Video, VideoId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range: {v}")))
}

pub(crate) fn parse_level(s: &str) -> Result<Level, StorageError> {
    s.parse::<Level>().map_err(ser)
}

/// Maps a `modules` row to a draft without videos; the caller attaches them.
pub(crate) fn map_module_row(row: &sqlx::sqlite::SqliteRow) -> Result<ModuleDraft, StorageError> {
    let thumbnail = row
        .try_get::<Option<String>, _>("thumbnail")
        .map_err(ser)?
        .map(|raw| MediaUri::parse(&raw))
        .transpose()
        .map_err(ser)?;

    Ok(ModuleDraft {
        id: ModuleId::new(row.try_get::<String, _>("id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        level: parse_level(&row.try_get::<String, _>("level").map_err(ser)?)?,
        style: row.try_get("style").map_err(ser)?,
        instructor: row.try_get("instructor").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        thumbnail,
        video_count: i64_to_u32("video_count", row.try_get("video_count").map_err(ser)?)?,
        duration_secs: i64_to_u32("duration_secs", row.try_get("duration_secs").map_err(ser)?)?,
        videos: Vec::new(),
    })
}

pub(crate) fn map_video_row(row: &sqlx::sqlite::SqliteRow) -> Result<Video, StorageError> {
    let media = MediaUri::parse(&row.try_get::<String, _>("media_uri").map_err(ser)?).map_err(ser)?;
    let video = Video::new(
        VideoId::new(row.try_get::<String, _>("id").map_err(ser)?),
        ModuleId::new(row.try_get::<String, _>("module_id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        media,
        i64_to_u32("duration_secs", row.try_get("duration_secs").map_err(ser)?)?,
        i64_to_u32("sort_order", row.try_get("sort_order").map_err(ser)?)?,
        parse_level(&row.try_get::<String, _>("level").map_err(ser)?)?,
    )
    .map_err(ser)?;
    Ok(video.with_description(row.try_get::<String, _>("description").map_err(ser)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_rejected() {
        assert!(matches!(
            i64_to_u32("video_count", -1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(i64_to_u32("video_count", 8).unwrap(), 8);
    }

    #[test]
    fn level_labels_parse() {
        assert_eq!(parse_level("advanced").unwrap(), Level::Advanced);
        assert!(parse_level("expert").is_err());
    }
}
