mod ids;
mod level;
pub mod media;
mod module;
pub mod progress;

pub use ids::{ModuleId, ParseIdError, VideoId};
pub use level::{Level, LevelFilter, ParseLevelError};
pub use media::{MediaUri, MediaValidationError};
pub use module::{Module, ModuleDraft, ModuleError, Video};
pub use progress::{ProgressRecord, RecordSet, completion_percentage};
