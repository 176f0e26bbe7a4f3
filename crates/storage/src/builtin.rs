//! Bundled sample catalog: four dance modules, thirty videos.

use async_trait::async_trait;
use course_core::model::{Level, MediaUri, Module, ModuleDraft, ModuleId, Video, VideoId};

use crate::repository::{CatalogSource, StorageError};

struct ModuleRow {
    id: &'static str,
    title: &'static str,
    level: Level,
    style: &'static str,
    instructor: &'static str,
    description: &'static str,
    thumbnail: &'static str,
    duration_secs: u32,
}

// (id, module, title, duration, order, level, description)
type VideoRow = (&'static str, &'static str, &'static str, u32, u32, Level, &'static str);

const MODULES: &[ModuleRow] = &[
    ModuleRow {
        id: "m1",
        title: "Classical Ballet Fundamentals",
        level: Level::Beginner,
        style: "Ballet",
        instructor: "Ana Silva",
        description: "A complete classical ballet course for beginners, built on traditional technique and progressive exercises.",
        thumbnail: "https://picsum.photos/400/250?random=101",
        duration_secs: 5100,
    },
    ModuleRow {
        id: "m2",
        title: "Hip Hop Street Dance",
        level: Level::Intermediate,
        style: "Hip Hop",
        instructor: "Carlos Santos",
        description: "Authentic hip hop movement from old school to new school.",
        thumbnail: "https://picsum.photos/400/250?random=102",
        duration_secs: 4860,
    },
    ModuleRow {
        id: "m3",
        title: "Essential Cuban Salsa",
        level: Level::Beginner,
        style: "Salsa",
        instructor: "Maria Rodriguez",
        description: "Traditional and modern Cuban salsa steps to build rhythm and Latin style.",
        thumbnail: "https://picsum.photos/400/250?random=103",
        duration_secs: 3540,
    },
    ModuleRow {
        id: "m4",
        title: "Contemporary Expression",
        level: Level::Advanced,
        style: "Contemporary",
        instructor: "Gabriel Oliveira",
        description: "Body expression through contemporary dance: advanced movement and interpretation.",
        thumbnail: "https://picsum.photos/400/250?random=104",
        duration_secs: 5100,
    },
];

const VIDEOS: &[VideoRow] = &[
    ("v1", "m1", "Basic Foot Positions", 480, 1, Level::Beginner, "The five fundamental foot positions"),
    ("v2", "m1", "Basic Port de Bras", 540, 2, Level::Beginner, "Basic arm movements"),
    ("v3", "m1", "Plié and Relevé", 600, 3, Level::Beginner, "Bending and rising exercises"),
    ("v4", "m1", "Tendu and Dégagé", 720, 4, Level::Intermediate, "Extensions and sliding foot movements"),
    ("v5", "m1", "Rond de Jambe", 660, 5, Level::Intermediate, "Leg circles"),
    ("v6", "m1", "Basic Adagio", 900, 6, Level::Intermediate, "Slow, controlled sequences"),
    ("v7", "m1", "Beginner Pirouettes", 780, 7, Level::Advanced, "First turns"),
    ("v8", "m1", "Grands Battements", 540, 8, Level::Advanced, "Large leg kicks"),
    ("v9", "m2", "Bounce and Groove", 420, 1, Level::Beginner, "Hip hop movement fundamentals"),
    ("v10", "m2", "Body Isolations", 480, 2, Level::Beginner, "Moving body parts independently"),
    ("v11", "m2", "Basic Top Rock", 540, 3, Level::Beginner, "Standing breaking steps"),
    ("v12", "m2", "Waves and Rolls", 600, 4, Level::Intermediate, "Body waves"),
    ("v13", "m2", "Basic Popping", 660, 5, Level::Intermediate, "Rhythmic muscle contractions"),
    ("v14", "m2", "Locking Fundamentals", 720, 6, Level::Intermediate, "Locks and sudden stops"),
    ("v15", "m2", "Breaking Power Moves", 900, 7, Level::Advanced, "Strength moves in breaking"),
    ("v16", "m2", "Hip Hop Choreography", 840, 8, Level::Advanced, "A complete choreographed sequence"),
    ("v17", "m3", "Basic Salsa Steps", 360, 1, Level::Beginner, "The basic Cuban salsa step"),
    ("v18", "m3", "Rhythm and Timing", 420, 2, Level::Beginner, "Understanding salsa rhythm"),
    ("v19", "m3", "Basic Turns", 480, 3, Level::Beginner, "First salsa turns"),
    ("v20", "m3", "Cross Body Lead", 540, 4, Level::Intermediate, "The classic salsa move"),
    ("v21", "m3", "Right and Left Turns", 600, 5, Level::Intermediate, "Turning both ways"),
    ("v22", "m3", "Solo Shines", 660, 6, Level::Intermediate, "Individual footwork"),
    ("v23", "m3", "Advanced Steps", 780, 7, Level::Advanced, "Advanced combinations"),
    ("v24", "m4", "Basic Floor Work", 540, 1, Level::Beginner, "Movement on the floor"),
    ("v25", "m4", "Contractions and Releases", 480, 2, Level::Beginner, "Basic Graham technique"),
    ("v26", "m4", "Spirals and Curves", 600, 3, Level::Beginner, "Curved body movement"),
    ("v27", "m4", "Traveling Across the Floor", 720, 4, Level::Intermediate, "Moving through space"),
    ("v28", "m4", "Contact Improvisation", 840, 5, Level::Intermediate, "Improvising with contact"),
    ("v29", "m4", "Emotional Expression", 900, 6, Level::Advanced, "Emotion in contemporary dance"),
    ("v30", "m4", "Choreographic Composition", 1020, 7, Level::Advanced, "Creating choreography"),
];

/// Catalog source that serves the bundled sample data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl BuiltinCatalog {
    /// Build and validate the bundled modules.
    ///
    /// # Errors
    ///
    /// Returns `course_core::Error` if the bundled rows are inconsistent.
    pub fn modules() -> Result<Vec<Module>, course_core::Error> {
        MODULES.iter().map(build_module).collect()
    }
}

fn build_module(row: &ModuleRow) -> Result<Module, course_core::Error> {
    let videos = VIDEOS
        .iter()
        .filter(|(_, module, ..)| *module == row.id)
        .map(|&(id, module, title, duration, order, level, description)| -> Result<Video, course_core::Error> {
            let media = MediaUri::from_url(format!("https://example.com/video{}.mp4", &id[1..]))?;
            Ok(Video::new(
                VideoId::new(id),
                ModuleId::new(module),
                title,
                media,
                duration,
                order,
                level,
            )?
            .with_description(description))
        })
        .collect::<Result<Vec<_>, course_core::Error>>()?;

    let draft = ModuleDraft {
        id: ModuleId::new(row.id),
        title: row.title.to_owned(),
        level: row.level,
        style: row.style.to_owned(),
        instructor: row.instructor.to_owned(),
        description: row.description.to_owned(),
        thumbnail: Some(MediaUri::from_url(row.thumbnail)?),
        video_count: u32::try_from(videos.len()).unwrap_or(u32::MAX),
        duration_secs: row.duration_secs,
        videos,
    };
    Ok(draft.validate()?)
}

#[async_trait]
impl CatalogSource for BuiltinCatalog {
    async fn fetch_modules(&self) -> Result<Vec<Module>, StorageError> {
        Self::modules().map_err(|err| StorageError::Serialization(err.to_string()))
    }
}
