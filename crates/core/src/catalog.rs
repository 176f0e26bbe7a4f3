//! The loaded content catalog.
//!
//! A `Catalog` is built once from a catalog source and never changes
//! afterwards. Everything that needs module sizes (progress percentages,
//! filtering, playback) reads from the same shared instance.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Module, ModuleDraft, ModuleId, RecordSet, Video, VideoId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("module {0} appears twice in the catalog")]
    DuplicateModule(ModuleId),

    #[error("video {0} is listed under more than one module")]
    DuplicateVideo(VideoId),
}

/// Immutable, fully materialized list of modules with their videos.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns `CatalogError` if a module id or a video id repeats.
    pub fn new(modules: Vec<Module>) -> Result<Self, CatalogError> {
        let mut module_ids = HashSet::with_capacity(modules.len());
        let mut video_ids = HashSet::new();
        for module in &modules {
            if !module_ids.insert(module.id().clone()) {
                return Err(CatalogError::DuplicateModule(module.id().clone()));
            }
            for video in module.videos() {
                if !video_ids.insert(video.id().clone()) {
                    return Err(CatalogError::DuplicateVideo(video.id().clone()));
                }
            }
        }
        Ok(Self { modules })
    }

    /// Validate every draft, then build the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first module validation or catalog consistency failure.
    pub fn from_drafts(drafts: Vec<ModuleDraft>) -> Result<Self, crate::Error> {
        let modules = drafts
            .into_iter()
            .map(ModuleDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(modules)?)
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    #[must_use]
    pub fn video(&self, module_id: &ModuleId, video_id: &VideoId) -> Option<&Video> {
        self.module(module_id)?.video(video_id)
    }

    /// Current size of a module, if it is known.
    #[must_use]
    pub fn video_count(&self, id: &ModuleId) -> Option<u32> {
        self.module(id).map(Module::video_count)
    }

    /// Empty progress: one record per module, in catalog order.
    #[must_use]
    pub fn seed_records(&self) -> RecordSet {
        RecordSet::seed(self.modules.iter().map(Module::id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, MediaUri};

    fn draft(id: &str, video_ids: &[&str]) -> ModuleDraft {
        let videos = video_ids
            .iter()
            .zip(1..)
            .map(|(vid, order)| {
                Video::new(
                    VideoId::new(*vid),
                    ModuleId::new(id),
                    format!("Lesson {vid}"),
                    MediaUri::parse("https://example.com/v.mp4").unwrap(),
                    60,
                    order,
                    Level::Beginner,
                )
                .unwrap()
            })
            .collect::<Vec<_>>();
        ModuleDraft {
            id: ModuleId::new(id),
            title: format!("Module {id}"),
            level: Level::Beginner,
            style: "Salsa".into(),
            instructor: "Maria Rodriguez".into(),
            description: String::new(),
            thumbnail: None,
            video_count: u32::try_from(videos.len()).unwrap(),
            duration_secs: 60 * u32::try_from(videos.len()).unwrap(),
            videos,
        }
    }

    #[test]
    fn builds_lookups_from_drafts() {
        let catalog =
            Catalog::from_drafts(vec![draft("m1", &["v1", "v2"]), draft("m2", &["v3"])]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.video_count(&ModuleId::new("m1")), Some(2));
        assert!(catalog
            .video(&ModuleId::new("m2"), &VideoId::new("v3"))
            .is_some());
        assert!(catalog
            .video(&ModuleId::new("m1"), &VideoId::new("v3"))
            .is_none());
        assert_eq!(catalog.video_count(&ModuleId::new("m9")), None);
    }

    #[test]
    fn seed_follows_catalog_order() {
        let catalog =
            Catalog::from_drafts(vec![draft("m2", &["v1"]), draft("m1", &["v2"])]).unwrap();
        let records = catalog.seed_records();
        let ids: Vec<&str> = records
            .iter()
            .map(|r| r.module_id().as_str())
            .collect();
        assert_eq!(ids, ["m2", "m1"]);
    }

    #[test]
    fn rejects_duplicates() {
        let err = Catalog::from_drafts(vec![draft("m1", &["v1"]), draft("m1", &["v2"])])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Catalog(CatalogError::DuplicateModule(_))
        ));

        let err = Catalog::from_drafts(vec![draft("m1", &["v1"]), draft("m2", &["v1"])])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Catalog(CatalogError::DuplicateVideo(_))
        ));
    }
}
