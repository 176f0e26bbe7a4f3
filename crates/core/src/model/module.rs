use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{ModuleId, VideoId};
use crate::model::level::Level;
use crate::model::media::{MediaUri, MediaValidationError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("video title cannot be empty ({0})")]
    EmptyVideoTitle(VideoId),

    #[error("module {module} declares {declared} videos but has {actual}")]
    VideoCountMismatch {
        module: ModuleId,
        declared: u32,
        actual: usize,
    },

    #[error("video {video} belongs to module {owner}, not {module}")]
    ForeignVideo {
        video: VideoId,
        owner: ModuleId,
        module: ModuleId,
    },

    #[error("video {0} appears twice")]
    DuplicateVideo(VideoId),

    #[error("video order in module {module} must be 1..={len} without gaps (found {found})")]
    NonContiguousOrder {
        module: ModuleId,
        len: usize,
        found: u32,
    },

    #[error(transparent)]
    Media(#[from] MediaValidationError),
}

//
// ─── VIDEO ─────────────────────────────────────────────────────────────────────
//

/// A single lesson video. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    id: VideoId,
    module_id: ModuleId,
    title: String,
    media: MediaUri,
    duration_secs: u32,
    order: u32,
    level: Level,
    description: String,
}

impl Video {
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyVideoTitle` if the title is blank.
    pub fn new(
        id: VideoId,
        module_id: ModuleId,
        title: impl Into<String>,
        media: MediaUri,
        duration_secs: u32,
        order: u32,
        level: Level,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyVideoTitle(id));
        }
        Ok(Self {
            id,
            module_id,
            title,
            media,
            duration_secs,
            order,
            level,
            description: String::new(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &VideoId {
        &self.id
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn media(&self) -> &MediaUri {
        &self.media
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// 1-based position inside the owning module.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// A course unit with its ordered videos attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    id: ModuleId,
    title: String,
    level: Level,
    style: String,
    instructor: String,
    description: String,
    thumbnail: Option<MediaUri>,
    duration_secs: u32,
    videos: Vec<Video>,
}

impl Module {
    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    #[must_use]
    pub fn instructor(&self) -> &str {
        &self.instructor
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&MediaUri> {
        self.thumbnail.as_ref()
    }

    /// Declared total running time in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Number of videos; always equal to `videos().len()`.
    #[must_use]
    pub fn video_count(&self) -> u32 {
        u32::try_from(self.videos.len()).unwrap_or(u32::MAX)
    }

    /// Videos sorted by their order index.
    #[must_use]
    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    #[must_use]
    pub fn video(&self, id: &VideoId) -> Option<&Video> {
        self.videos.iter().find(|v| v.id() == id)
    }
}

//
// ─── DRAFT (unvalidated input) ─────────────────────────────────────────────────
//

/// Raw module data as it comes out of a catalog source.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDraft {
    pub id: ModuleId,
    pub title: String,
    pub level: Level,
    pub style: String,
    pub instructor: String,
    pub description: String,
    pub thumbnail: Option<MediaUri>,
    pub video_count: u32,
    pub duration_secs: u32,
    pub videos: Vec<Video>,
}

impl ModuleDraft {
    /// Check the draft and produce an immutable `Module`.
    ///
    /// Videos are sorted by order index; the indexes must then read `1..=n`.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError` when the title is blank, the declared count does
    /// not match the attached videos, a video points at another module, an id
    /// repeats, or the order indexes have gaps.
    pub fn validate(self) -> Result<Module, ModuleError> {
        if self.title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        if usize::try_from(self.video_count).ok() != Some(self.videos.len()) {
            return Err(ModuleError::VideoCountMismatch {
                module: self.id,
                declared: self.video_count,
                actual: self.videos.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.videos.len());
        for video in &self.videos {
            if video.module_id() != &self.id {
                return Err(ModuleError::ForeignVideo {
                    video: video.id().clone(),
                    owner: video.module_id().clone(),
                    module: self.id,
                });
            }
            if !seen.insert(video.id().clone()) {
                return Err(ModuleError::DuplicateVideo(video.id().clone()));
            }
        }

        let mut videos = self.videos;
        videos.sort_by_key(Video::order);
        let len = videos.len();
        for (expected, video) in (1..).zip(&videos) {
            if video.order() != expected {
                return Err(ModuleError::NonContiguousOrder {
                    module: self.id,
                    len,
                    found: video.order(),
                });
            }
        }

        Ok(Module {
            id: self.id,
            title: self.title,
            level: self.level,
            style: self.style,
            instructor: self.instructor,
            description: self.description,
            thumbnail: self.thumbnail,
            duration_secs: self.duration_secs,
            videos,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, module: &str, order: u32) -> Video {
        Video::new(
            VideoId::new(id),
            ModuleId::new(module),
            format!("Lesson {id}"),
            MediaUri::parse(&format!("https://example.com/{id}.mp4")).unwrap(),
            300,
            order,
            Level::Beginner,
        )
        .unwrap()
    }

    fn draft(videos: Vec<Video>) -> ModuleDraft {
        ModuleDraft {
            id: ModuleId::new("m1"),
            title: "Ballet Basics".into(),
            level: Level::Beginner,
            style: "Ballet".into(),
            instructor: "Ana Silva".into(),
            description: String::new(),
            thumbnail: None,
            video_count: u32::try_from(videos.len()).unwrap(),
            duration_secs: 900,
            videos,
        }
    }

    #[test]
    fn validate_sorts_videos_by_order() {
        let module = draft(vec![video("v2", "m1", 2), video("v1", "m1", 1), video("v3", "m1", 3)])
            .validate()
            .unwrap();
        let ids: Vec<&str> = module.videos().iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids, ["v1", "v2", "v3"]);
        assert_eq!(module.video_count(), 3);
        assert!(module.video(&VideoId::new("v2")).is_some());
    }

    #[test]
    fn rejects_count_mismatch() {
        let mut d = draft(vec![video("v1", "m1", 1)]);
        d.video_count = 8;
        assert!(matches!(
            d.validate(),
            Err(ModuleError::VideoCountMismatch { declared: 8, actual: 1, .. })
        ));
    }

    #[test]
    fn rejects_gaps_in_order() {
        let err = draft(vec![video("v1", "m1", 1), video("v3", "m1", 3)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ModuleError::NonContiguousOrder { found: 3, .. }));
    }

    #[test]
    fn rejects_foreign_and_duplicate_videos() {
        let err = draft(vec![video("v1", "m2", 1)]).validate().unwrap_err();
        assert!(matches!(err, ModuleError::ForeignVideo { .. }));

        let err = draft(vec![video("v1", "m1", 1), video("v1", "m1", 2)])
            .validate()
            .unwrap_err();
        assert_eq!(err, ModuleError::DuplicateVideo(VideoId::new("v1")));
    }

    #[test]
    fn rejects_blank_titles() {
        let mut d = draft(vec![]);
        d.title = "  ".into();
        assert_eq!(d.validate().unwrap_err(), ModuleError::EmptyTitle);
    }
}
