#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod error;
pub mod persistence;
pub mod playback;
pub mod progress_store;
pub mod search;
pub mod timer;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use config::SyncConfig;
pub use error::{LoadError, PersistenceError, PlaybackControlError};
pub use persistence::PersistenceSynchronizer;
pub use playback::{
    PlaybackControl, PlaybackState, PlaybackStatus, PlaybackTracker, VideoCompleted, format_time,
};
pub use progress_store::{ProgressStore, hydrate};
pub use search::SearchDebouncer;
pub use timer::Timer;
